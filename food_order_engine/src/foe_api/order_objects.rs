use chrono::{DateTime, Utc};
use fos_common::Cents;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, OrderPartition, OrderStatusType, RewardTransaction};

/// Body of a transition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub order_id: OrderId,
    pub status: OrderStatusType,
}

impl TransitionRequest {
    pub fn new<O: Into<OrderId>>(order_id: O, status: OrderStatusType) -> Self {
        Self { order_id: order_id.into(), status }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourierAssignment {
    pub courier_id: String,
}

/// One partition of a caller's orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersResult {
    pub partition: OrderPartition,
    pub orders: Vec<Order>,
}

/// The reward ledger summary shown in a user's wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSummary {
    pub user_id: String,
    pub balance: Cents,
    pub recent_transactions: Vec<RewardTransaction>,
    pub as_of: DateTime<Utc>,
}

impl WalletSummary {
    pub fn new(user_id: String, balance: Cents, recent_transactions: Vec<RewardTransaction>) -> Self {
        Self { user_id, balance, recent_transactions, as_of: Utc::now() }
    }
}
