use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::{orders, SqliteDatabaseError},
    db_types::{NewReview, Order, OrderId, Review},
};

/// Flips the review gate from `open` to `consumed` and stores the review. Not atomic on its own; run it inside a
/// transaction.
///
/// The gate update is the first statement so that the write lock is taken up front.
pub async fn submit_review(review: &NewReview, conn: &mut SqliteConnection) -> Result<Option<Review>, SqliteDatabaseError> {
    let order = sqlx::query_as::<_, Order>(
        r#"
            UPDATE orders SET review_gate = 'consumed'
            WHERE order_id = $1 AND status = 'completed' AND review_gate = 'open'
            RETURNING *;
        "#,
    )
    .bind(&review.order_id)
    .fetch_optional(&mut *conn)
    .await?;
    let Some(order) = order else {
        debug!("🗃️ Review gate for order {} is not open. Review rejected.", review.order_id);
        return Ok(None);
    };
    let saved = sqlx::query_as::<_, Review>(
        r#"
            INSERT INTO reviews (order_id, customer_id, vendor_id, rating, text, is_complaint)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(&order.order_id)
    .bind(&order.customer_id)
    .bind(&order.vendor_id)
    .bind(review.rating)
    .bind(&review.text)
    .bind(review.is_complaint)
    .fetch_one(&mut *conn)
    .await?;
    orders::set_review_id(&order.order_id, saved.id, conn).await?;
    debug!("🗃️ Review #{} stored for order {}", saved.id, order.order_id);
    Ok(Some(saved))
}

pub async fn fetch_review_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Review>, SqliteDatabaseError> {
    let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(review)
}

pub async fn fetch_reviews_for_vendor(
    vendor_id: &str,
    complaints_only: bool,
    conn: &mut SqliteConnection,
) -> Result<Vec<Review>, SqliteDatabaseError> {
    let sql = if complaints_only {
        "SELECT * FROM reviews WHERE vendor_id = $1 AND is_complaint = TRUE ORDER BY id DESC"
    } else {
        "SELECT * FROM reviews WHERE vendor_id = $1 ORDER BY id DESC"
    };
    let reviews = sqlx::query_as::<_, Review>(sql).bind(vendor_id).fetch_all(conn).await?;
    Ok(reviews)
}
