use fos_common::Cents;

use crate::{
    db::traits::OrderStoreError,
    db_types::{OrderId, RewardPolicy, RewardTransaction},
};

/// The append-only reward ledger.
#[allow(async_fn_in_trait)]
pub trait RewardManagement {
    /// Writes the per-delivery credit for `order_id` to `user_id`'s ledger, plus a milestone bonus if the user's
    /// lifetime completed-order count has just reached a multiple of `policy.milestone_every`.
    ///
    /// Idempotent per order: if a delivery credit already references `order_id`, nothing is written.
    ///
    /// Returns the transactions that were written by this call.
    async fn credit_for_completed_order(
        &self,
        user_id: &str,
        order_id: &OrderId,
        policy: &RewardPolicy,
    ) -> Result<Vec<RewardTransaction>, OrderStoreError>;

    /// The sum of all the user's transactions.
    async fn fetch_balance(&self, user_id: &str) -> Result<Cents, OrderStoreError>;

    /// The user's most recent transactions, newest first.
    async fn fetch_recent_transactions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<RewardTransaction>, OrderStoreError>;
}
