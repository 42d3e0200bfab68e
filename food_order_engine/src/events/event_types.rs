use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Actor, Order, OrderStatusType, RewardTransaction};

/// Emitted once a new order has been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlacedEvent {
    pub order: Order,
}

impl OrderPlacedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted after a status transition has been committed. `order` is the state of the order after the commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub old_status: OrderStatusType,
    pub actor: Actor,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order, old_status: OrderStatusType, actor: Actor) -> Self {
        Self { order, old_status, actor }
    }

    pub fn new_status(&self) -> OrderStatusType {
        self.order.status
    }

    pub fn changed_at(&self) -> DateTime<Utc> {
        self.order.updated_at
    }
}

/// Emitted when the reward ledger has written new transactions for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardCreditedEvent {
    pub user_id: String,
    pub transactions: Vec<RewardTransaction>,
}

impl RewardCreditedEvent {
    pub fn new(user_id: String, transactions: Vec<RewardTransaction>) -> Self {
        Self { user_id, transactions }
    }
}
