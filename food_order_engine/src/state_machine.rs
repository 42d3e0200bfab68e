//! # Order state machine
//!
//! A pure transition function. It knows nothing about storage; [`crate::OrderFlowApi`] feeds it the order's currently
//! observed status and commits the result through the store's conditional write.
//!
//! ```text
//!   pending ──► accepted ──► preparing ──► out_for_delivery ──► completed
//!      │            │            │                │
//!      └────────────┴────────────┴────────────────┴──────────► cancelled
//! ```
//!
//! | Target             | Who may request it   |
//! |--------------------|----------------------|
//! | `accepted`         | vendor               |
//! | `preparing`        | vendor               |
//! | `out_for_delivery` | vendor               |
//! | `completed`        | vendor, courier      |
//! | `cancelled`        | customer, vendor     |
//!
//! Authorisation is checked against the requested target before the edge itself, so a customer asking for
//! `accepted` is told they are not allowed to, whatever the current status happens to be. Skipping a state is never
//! allowed: there is no implicit fast path from `pending` to `preparing` and the like.
use thiserror::Error;

use crate::db_types::{
    OrderStatusType::{self, *},
    Role,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot move an order from {from} to {to}")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("A {role} may not move an order to {to}")]
    Unauthorized { role: Role, to: OrderStatusType },
}

pub struct OrderStateMachine;

impl OrderStateMachine {
    /// Whether `from -> to` is an edge of the fulfilment graph. Terminal states have no outgoing edges.
    pub fn is_valid_transition(from: OrderStatusType, to: OrderStatusType) -> bool {
        matches!(
            (from, to),
            (Pending, Accepted) |
                (Accepted, Preparing) |
                (Preparing, OutForDelivery) |
                (OutForDelivery, Completed) |
                (Pending | Accepted | Preparing | OutForDelivery, Cancelled)
        )
    }

    /// The roles permitted to move an order *into* `to`.
    pub fn roles_for_target(to: OrderStatusType) -> &'static [Role] {
        match to {
            Pending => &[],
            Accepted | Preparing | OutForDelivery => &[Role::Vendor],
            Completed => &[Role::Vendor, Role::Courier],
            Cancelled => &[Role::Customer, Role::Vendor],
        }
    }

    /// Validates that `role` may move an order currently in `from` to `to`.
    pub fn validate(from: OrderStatusType, to: OrderStatusType, role: Role) -> Result<(), TransitionError> {
        let roles = Self::roles_for_target(to);
        if roles.is_empty() {
            // Nothing ever transitions back into the initial state
            return Err(TransitionError::InvalidTransition { from, to });
        }
        if !roles.contains(&role) {
            return Err(TransitionError::Unauthorized { role, to });
        }
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from, to })
        }
    }

    /// All statuses reachable in one step from `from`.
    pub fn next_states(from: OrderStatusType) -> Vec<OrderStatusType> {
        OrderStatusType::all().into_iter().filter(|to| Self::is_valid_transition(from, *to)).collect()
    }

    /// The statuses `role` could move an order in `from` to right now. Handy for deciding which buttons to show.
    pub fn next_states_for(from: OrderStatusType, role: Role) -> Vec<OrderStatusType> {
        Self::next_states(from).into_iter().filter(|to| Self::roles_for_target(*to).contains(&role)).collect()
    }
}
