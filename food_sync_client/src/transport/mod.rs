//! The wire side of the sync client.
//!
//! [`OrderSyncTransport`] is what [`crate::SyncChannelManager`] needs from a server: a push channel and the three
//! polling reads. Failures are always [`TransportError`]s; they never change the order view.
use food_order_engine::{
    db_types::{Order, OrderId},
    notifications::SyncEvent,
    order_objects::WalletSummary,
};
use tokio::sync::mpsc;

use crate::errors::TransportError;

pub mod http;
mod sse;

pub use sse::SseParser;

/// An open push channel. The sender side is dropped, or sends an error, when the channel fails.
pub type PushConnection = mpsc::Receiver<Result<SyncEvent, TransportError>>;

#[allow(async_fn_in_trait)]
pub trait OrderSyncTransport {
    /// Opens the push channel. The call resolves once the server has accepted the subscription.
    async fn open_push(&self) -> Result<PushConnection, TransportError>;

    /// The caller's non-terminal orders.
    async fn fetch_active_orders(&self) -> Result<Vec<Order>, TransportError>;

    /// A single order, whatever its status.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, TransportError>;

    /// The caller's reward balance with up to `limit` recent ledger entries.
    async fn fetch_wallet(&self, limit: u32) -> Result<WalletSummary, TransportError>;
}
