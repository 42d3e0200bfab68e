//! # Food sync client
//!
//! Keeps a client session's local picture of its orders up to date.
//!
//! A [`SyncChannelManager`] first tries to open the server's push channel. If that does not happen within a short,
//! fixed timeout, or if the channel drops later on, it switches to polling the active-orders endpoint at a fixed
//! interval for the rest of the session. Both channels feed the same [`LocalOrderView`], which applies every status at
//! most once, never lets a finished order come back to life and moves finished orders into the historical list.
//!
//! The wire side is abstracted behind [`OrderSyncTransport`]. [`HttpTransport`] talks to `food_order_server`.
pub mod config;
pub mod errors;
pub mod manager;
pub mod transport;
pub mod view;

pub use config::SyncConfig;
pub use errors::TransportError;
pub use manager::{SyncChannelManager, SyncMode};
pub use transport::{http::HttpTransport, OrderSyncTransport, PushConnection};
pub use view::{LocalOrderView, Reconciled, ViewChange};
