//! Food Order Engine
//!
//! The core of the food ordering service: the order lifecycle, the reward ledger, the review gate and the
//! notification fan-out. It is transport-agnostic; the HTTP surface lives in `food_order_server`.
//!
//! The library is divided into these main sections:
//! 1. The pure order [`state_machine`]. It decides which status changes are allowed, and for whom.
//! 2. Database management and control ([`mod@db`]). Backends implement the traits in [`traits`] and commit every
//!    transition, together with its side effects, atomically. SQLite is the supported backend.
//! 3. The public API ([`mod@foe_api`]), which combines the two, and is what callers should use.
//! 4. [`notifications`], which turns committed changes into per-subscriber push messages.
//!
//! The engine also provides a set of events that can be subscribed to ([`events`]). These are emitted after a change
//! has been committed. Hook handlers run on their own tasks, so a slow handler never holds up a commit.
mod db;

pub mod db_types;
pub mod events;
mod foe_api;
pub mod notifications;
pub mod state_machine;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits;
pub use foe_api::{
    accounts_api::AccountApi,
    errors::OrderFlowError,
    order_flow_api::OrderFlowApi,
    order_objects,
    reviews_api::ReviewApi,
    rewards_api::RewardsApi,
};
pub use traits::{
    InsertOrderResult,
    OrderFlowDatabase,
    OrderManagement,
    OrderStoreError,
    OrderUpdate,
    ReviewManagement,
    RewardManagement,
    TransitionCommit,
};
