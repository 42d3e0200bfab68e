use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, OrderStatusType};

/// The messages carried by the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// The subscriber's active orders at the time the channel opened.
    Snapshot { orders: Vec<Order> },
    /// A new order the subscriber is a party to.
    OrderPlaced { order: Order },
    StatusChanged { order_id: OrderId, status: OrderStatusType, updated_at: DateTime<Utc> },
    /// Keeps idle connections from being reaped by proxies.
    Heartbeat,
}

impl SyncEvent {
    pub fn status_changed(order: &Order) -> Self {
        Self::StatusChanged { order_id: order.order_id.clone(), status: order.status, updated_at: order.updated_at }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Snapshot { .. } => "snapshot",
            Self::OrderPlaced { .. } => "order_placed",
            Self::StatusChanged { .. } => "status_changed",
            Self::Heartbeat => "heartbeat",
        }
    }
}

/// A [`SyncEvent`] addressed to one subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub subscriber_id: String,
    pub event: SyncEvent,
}

impl PushMessage {
    pub fn new<S: Into<String>>(subscriber_id: S, event: SyncEvent) -> Self {
        Self { subscriber_id: subscriber_id.into(), event }
    }
}
