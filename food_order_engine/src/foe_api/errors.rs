use thiserror::Error;

use crate::{
    db::traits::OrderStoreError,
    db_types::{OrderId, OrderStatusType},
    state_machine::TransitionError,
};

/// The client-visible failures of the order engine.
///
/// Apart from `DatabaseError`, every variant means the request was invalid given the current state of the order.
/// Retrying the same request will not help.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Not allowed: {0}")]
    Unauthorized(String),
    #[error("Order {0} does not exist")]
    NotFound(OrderId),
    #[error("Order {0} has not been completed yet")]
    NotCompleted(OrderId),
    #[error("Order {0} has already been reviewed")]
    AlreadyReviewed(OrderId),
    #[error("Invalid review: {0}")]
    InvalidReview(String),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
    #[error("Order {order_id} is already {status}")]
    OrderIsTerminal { order_id: OrderId, status: OrderStatusType },
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl OrderFlowError {
    pub fn from_transition_error(order_id: &OrderId, e: TransitionError) -> Self {
        match e {
            TransitionError::InvalidTransition { from, to } => {
                Self::InvalidTransition { order_id: order_id.clone(), from, to }
            },
            e @ TransitionError::Unauthorized { .. } => Self::Unauthorized(e.to_string()),
        }
    }

    /// Backend failures are the only errors that are worth retrying.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::DatabaseError(_))
    }
}

impl From<OrderStoreError> for OrderFlowError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::OrderAlreadyExists(id) => Self::OrderAlreadyExists(id),
            OrderStoreError::OrderNotFound(id) => Self::NotFound(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}
