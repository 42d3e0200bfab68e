use thiserror::Error;

use crate::db_types::{Order, OrderId, OrderStatusType, RewardTransaction, ReviewGateState};

pub enum InsertOrderResult {
    Inserted(Order),
    AlreadyExists(Order),
}

/// The fields a conditional write may change. `None` leaves the column alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderUpdate {
    pub status: Option<OrderStatusType>,
    pub courier_id: Option<String>,
    pub review_gate: Option<ReviewGateState>,
}

impl OrderUpdate {
    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_courier<S: Into<String>>(mut self, courier_id: S) -> Self {
        self.courier_id = Some(courier_id.into());
        self
    }

    pub fn with_review_gate(mut self, gate: ReviewGateState) -> Self {
        self.review_gate = Some(gate);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.courier_id.is_none() && self.review_gate.is_none()
    }
}

/// The result of a committed transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionCommit {
    pub old_status: OrderStatusType,
    /// The order after the commit
    pub order: Order,
    /// Reward ledger entries written as part of the commit. Only ever non-empty for transitions into `Completed`.
    pub rewards: Vec<RewardTransaction>,
}

/// Errors that any backend may return. Backends convert their own driver errors into this type.
#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Cannot apply an empty update to order {0}")]
    EmptyUpdate(OrderId),
}
