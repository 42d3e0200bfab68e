use std::fmt::Debug;

use fos_common::Cents;
use log::debug;

use crate::{
    db::traits::{OrderManagement, RewardManagement},
    db_types::{OrderId, OrderStatusType, RewardPolicy, RewardTransaction},
    foe_api::{errors::OrderFlowError, order_objects::WalletSummary},
};

/// Access to the reward ledger.
///
/// Transitions into `completed` already credit the ledger as part of their commit. [`RewardsApi::credit_for_completed_order`]
/// exists for replaying a completion; it is idempotent, so replays never double-credit.
pub struct RewardsApi<B> {
    db: B,
    policy: RewardPolicy,
}

impl<B: Debug> Debug for RewardsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RewardsApi ({:?})", self.db)
    }
}

impl<B> RewardsApi<B>
where B: RewardManagement + OrderManagement
{
    pub fn new(db: B, policy: RewardPolicy) -> Self {
        Self { db, policy }
    }

    pub async fn credit_for_completed_order(
        &self,
        user_id: &str,
        order_id: &OrderId,
    ) -> Result<Vec<RewardTransaction>, OrderFlowError> {
        let order =
            self.db.fetch_order_by_order_id(order_id).await?.ok_or_else(|| OrderFlowError::NotFound(order_id.clone()))?;
        if order.status != OrderStatusType::Completed {
            return Err(OrderFlowError::NotCompleted(order_id.clone()));
        }
        if order.customer_id != user_id {
            return Err(OrderFlowError::Unauthorized(format!("Order {order_id} does not belong to {user_id}")));
        }
        let written = self.db.credit_for_completed_order(user_id, order_id, &self.policy).await?;
        debug!("💰️ {} ledger entries written for order {order_id}", written.len());
        Ok(written)
    }

    pub async fn balance(&self, user_id: &str) -> Result<Cents, OrderFlowError> {
        Ok(self.db.fetch_balance(user_id).await?)
    }

    pub async fn recent_transactions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<RewardTransaction>, OrderFlowError> {
        Ok(self.db.fetch_recent_transactions(user_id, limit).await?)
    }

    pub async fn wallet_summary(&self, user_id: &str, limit: u32) -> Result<WalletSummary, OrderFlowError> {
        let balance = self.balance(user_id).await?;
        let recent = self.recent_transactions(user_id, limit).await?;
        Ok(WalletSummary::new(user_id.to_string(), balance, recent))
    }
}
