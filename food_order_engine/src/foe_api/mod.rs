//! # Food order engine public API
//!
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`order_flow_api`] is the primary API. It places orders and moves them through their lifecycle.
//! * [`accounts_api`] provides read-only, caller-scoped views of orders and their audit trails.
//! * [`rewards_api`] exposes the reward ledger.
//! * [`reviews_api`] is the review gate.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits required by the API.
//!
//! ```rust,ignore
//! use food_order_engine::{AccountApi, SqliteDatabase, db_types::{Actor, OrderPartition}};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = AccountApi::new(db);
//! let active = api.orders_for_actor(&Actor::customer("alice"), OrderPartition::Active).await?;
//! ```

pub mod accounts_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod reviews_api;
pub mod rewards_api;
