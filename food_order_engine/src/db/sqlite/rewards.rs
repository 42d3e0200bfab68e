use fos_common::Cents;
use log::{debug, info};
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::{orders, SqliteDatabaseError},
    db_types::{OrderId, RewardCategory, RewardPolicy, RewardTransaction},
};

/// Writes the delivery credit (and milestone bonus, if earned) for a completed order. This is not atomic; run it
/// inside a transaction.
///
/// Returns an empty vector if the order has already been credited.
pub async fn credit_for_completed_order(
    user_id: &str,
    order_id: &OrderId,
    policy: &RewardPolicy,
    conn: &mut SqliteConnection,
) -> Result<Vec<RewardTransaction>, SqliteDatabaseError> {
    if credit_exists(order_id, RewardCategory::DeliveryCredit, &mut *conn).await? {
        debug!("🗃️ Order {order_id} has already been credited. Nothing to do.");
        return Ok(vec![]);
    }
    let mut written = Vec::with_capacity(2);
    let credit = insert_transaction(
        user_id,
        policy.per_delivery_credit,
        RewardCategory::DeliveryCredit,
        &format!("Delivery credit for order {order_id}"),
        order_id,
        &mut *conn,
    )
    .await?;
    written.push(credit);
    let completed = orders::count_completed_for_customer(user_id, &mut *conn).await?;
    if policy.is_milestone(completed) && !credit_exists(order_id, RewardCategory::MilestoneBonus, &mut *conn).await? {
        let bonus = insert_transaction(
            user_id,
            policy.milestone_bonus,
            RewardCategory::MilestoneBonus,
            &format!("Milestone bonus for {completed} completed orders"),
            order_id,
            &mut *conn,
        )
        .await?;
        info!("🗃️ {user_id} reached {completed} completed orders and earned a bonus of {}", policy.milestone_bonus);
        written.push(bonus);
    }
    Ok(written)
}

async fn credit_exists(
    order_id: &OrderId,
    category: RewardCategory,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM reward_transactions WHERE order_id = $1 AND category = $2",
    )
    .bind(order_id)
    .bind(category)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

async fn insert_transaction(
    user_id: &str,
    amount: Cents,
    category: RewardCategory,
    description: &str,
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<RewardTransaction, SqliteDatabaseError> {
    let tx = sqlx::query_as::<_, RewardTransaction>(
        r#"
            INSERT INTO reward_transactions (user_id, amount, category, description, order_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(category)
    .bind(description)
    .bind(order_id)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Ledger entry #{} written: {} {} to {user_id}", tx.id, tx.category, tx.amount);
    Ok(tx)
}

pub async fn fetch_balance(user_id: &str, conn: &mut SqliteConnection) -> Result<Cents, SqliteDatabaseError> {
    let balance =
        sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(amount), 0) FROM reward_transactions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(conn)
            .await?;
    Ok(Cents::from(balance))
}

pub async fn fetch_recent_transactions(
    user_id: &str,
    limit: u32,
    conn: &mut SqliteConnection,
) -> Result<Vec<RewardTransaction>, SqliteDatabaseError> {
    let txs = sqlx::query_as::<_, RewardTransaction>(
        "SELECT * FROM reward_transactions WHERE user_id = $1 ORDER BY id DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(i64::from(limit))
    .fetch_all(conn)
    .await?;
    Ok(txs)
}
