//! # Database management and control.
//!
//! This module defines the interface contracts of the order engine database *backends*.
//!
//! * [`OrderFlowDatabase`] defines the highest level of behaviour for backends supporting the order engine: atomic
//!   transition commits.
//! * [`OrderManagement`] defines storage and queries for orders, including the conditional-update primitive.
//! * [`RewardManagement`] defines the append-only reward ledger.
//! * [`ReviewManagement`] defines the review gate and review queries.
mod data_objects;
mod order_flow_database;
mod order_management;
mod review_management;
mod reward_management;

pub use data_objects::{InsertOrderResult, OrderStoreError, OrderUpdate, TransitionCommit};
pub use order_flow_database::OrderFlowDatabase;
pub use order_management::OrderManagement;
pub use review_management::ReviewManagement;
pub use reward_management::RewardManagement;
