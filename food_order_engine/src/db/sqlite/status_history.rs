use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Actor, OrderId, OrderStatusType, StatusChange},
};

pub async fn insert_status_change(
    order_id: &OrderId,
    old_status: OrderStatusType,
    new_status: OrderStatusType,
    actor: &Actor,
    conn: &mut SqliteConnection,
) -> Result<StatusChange, SqliteDatabaseError> {
    let change = sqlx::query_as::<_, StatusChange>(
        r#"
            INSERT INTO order_status_history (order_id, old_status, new_status, actor_id, actor_role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(old_status)
    .bind(new_status)
    .bind(&actor.user_id)
    .bind(actor.role)
    .fetch_one(conn)
    .await?;
    Ok(change)
}

pub async fn fetch_status_history(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<StatusChange>, SqliteDatabaseError> {
    let history =
        sqlx::query_as::<_, StatusChange>("SELECT * FROM order_status_history WHERE order_id = $1 ORDER BY id ASC")
            .bind(order_id)
            .fetch_all(conn)
            .await?;
    Ok(history)
}
