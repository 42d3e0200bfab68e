use std::fmt::Debug;

use fos_common::Cents;
use log::*;
use sqlx::{migrate, SqlitePool};

use super::{db_url, new_pool, orders, reviews, rewards, status_history, SqliteDatabaseError};
use crate::{
    db::{
        sqlite::orders::OrderQueryFilter,
        traits::{
            InsertOrderResult,
            OrderFlowDatabase,
            OrderManagement,
            OrderStoreError,
            OrderUpdate,
            ReviewManagement,
            RewardManagement,
            TransitionCommit,
        },
    },
    db_types::{
        Actor,
        NewOrder,
        NewReview,
        Order,
        OrderId,
        OrderPartition,
        OrderStatusType,
        ReviewGateState,
        Review,
        RewardPolicy,
        RewardTransaction,
        StatusChange,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the `FOS_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        trace!("🗃️ Created new database pool for {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete for {}", self.url);
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::idempotent_insert(order, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_party(
        &self,
        actor: &Actor,
        partition: OrderPartition,
    ) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let query = OrderQueryFilter::default().for_party(actor).in_partition(partition);
        let orders = orders::fetch_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn compare_status_and_set(
        &self,
        order_id: &OrderId,
        expected: OrderStatusType,
        update: OrderUpdate,
    ) -> Result<Option<Order>, OrderStoreError> {
        if update.is_empty() {
            return Err(OrderStoreError::EmptyUpdate(order_id.clone()));
        }
        let mut conn = self.pool.acquire().await?;
        let order = orders::compare_status_and_set(order_id, expected, update, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_status_history(&self, order_id: &OrderId) -> Result<Vec<StatusChange>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let history = status_history::fetch_status_history(order_id, &mut conn).await?;
        Ok(history)
    }
}

impl RewardManagement for SqliteDatabase {
    async fn credit_for_completed_order(
        &self,
        user_id: &str,
        order_id: &OrderId,
        policy: &RewardPolicy,
    ) -> Result<Vec<RewardTransaction>, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let written = rewards::credit_for_completed_order(user_id, order_id, policy, &mut tx).await?;
        tx.commit().await?;
        Ok(written)
    }

    async fn fetch_balance(&self, user_id: &str) -> Result<Cents, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let balance = rewards::fetch_balance(user_id, &mut conn).await?;
        Ok(balance)
    }

    async fn fetch_recent_transactions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<RewardTransaction>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let txs = rewards::fetch_recent_transactions(user_id, limit, &mut conn).await?;
        Ok(txs)
    }
}

impl ReviewManagement for SqliteDatabase {
    async fn submit_review(&self, review: &NewReview) -> Result<Option<Review>, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let saved = reviews::submit_review(review, &mut tx).await?;
        if saved.is_some() {
            tx.commit().await?;
        }
        Ok(saved)
    }

    async fn fetch_review_for_order(&self, order_id: &OrderId) -> Result<Option<Review>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let review = reviews::fetch_review_for_order(order_id, &mut conn).await?;
        Ok(review)
    }

    async fn fetch_reviews_for_vendor(
        &self,
        vendor_id: &str,
        complaints_only: bool,
    ) -> Result<Vec<Review>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let reviews = reviews::fetch_reviews_for_vendor(vendor_id, complaints_only, &mut conn).await?;
        Ok(reviews)
    }
}

impl OrderFlowDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// In a single atomic transaction,
    /// * conditionally moves the order from `expected` to `new_status`. If the order is no longer in `expected`, the
    ///   transaction is rolled back and `None` is returned.
    /// * appends the change to the status history
    /// * for completions, opens the review gate and credits the customer's reward ledger.
    async fn commit_transition(
        &self,
        order_id: &OrderId,
        expected: OrderStatusType,
        new_status: OrderStatusType,
        actor: &Actor,
        policy: &RewardPolicy,
    ) -> Result<Option<TransitionCommit>, OrderStoreError> {
        let completing = new_status == OrderStatusType::Completed;
        let mut update = OrderUpdate::default().with_status(new_status);
        if completing {
            update = update.with_review_gate(ReviewGateState::Open);
        }
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::compare_status_and_set(order_id, expected, update, &mut tx).await? else {
            // Dropping the transaction rolls it back
            return Ok(None);
        };
        status_history::insert_status_change(order_id, expected, new_status, actor, &mut tx).await?;
        let rewards = if completing {
            rewards::credit_for_completed_order(&order.customer_id, order_id, policy, &mut tx).await?
        } else {
            vec![]
        };
        tx.commit().await?;
        debug!("🗃️ Order {order_id} moved from {expected} to {new_status} by {actor}");
        Ok(Some(TransitionCommit { old_status: expected, order, rewards }))
    }

    async fn close(&mut self) -> Result<(), OrderStoreError> {
        self.pool.close().await;
        Ok(())
    }
}
