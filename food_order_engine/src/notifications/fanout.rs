use std::sync::Arc;

use log::*;

use crate::{
    db_types::Order,
    events::{EventHooks, OrderPlacedEvent, OrderStatusChangedEvent},
    notifications::{PushMessage, PushTransport, SyncEvent},
};

/// Turns committed order events into one push message per interested subscriber.
///
/// The interested parties of an order are its customer and its vendor. Nobody else is ever notified.
pub struct NotificationFanout<T> {
    transport: Arc<T>,
}

impl<T> Clone for NotificationFanout<T> {
    fn clone(&self) -> Self {
        Self { transport: Arc::clone(&self.transport) }
    }
}

impl<T> NotificationFanout<T>
where T: PushTransport + 'static
{
    pub fn new(transport: T) -> Self {
        Self { transport: Arc::new(transport) }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn subscribers_for(order: &Order) -> Vec<String> {
        let mut subscribers = vec![order.customer_id.clone()];
        if order.vendor_id != order.customer_id {
            subscribers.push(order.vendor_id.clone());
        }
        subscribers
    }

    /// Publishes the new status to the order's parties. Returns the number of messages the transport accepted.
    pub fn publish_status_change(&self, event: &OrderStatusChangedEvent) -> usize {
        let order = &event.order;
        debug!("📬️ Fanning out {}: {} -> {}", order.order_id, event.old_status, order.status);
        self.publish_to_parties(order, SyncEvent::status_changed(order))
    }

    pub fn publish_order_placed(&self, event: &OrderPlacedEvent) -> usize {
        debug!("📬️ Fanning out new order {}", event.order.order_id);
        self.publish_to_parties(&event.order, SyncEvent::OrderPlaced { order: event.order.clone() })
    }

    fn publish_to_parties(&self, order: &Order, event: SyncEvent) -> usize {
        Self::subscribers_for(order)
            .into_iter()
            .filter(|subscriber| {
                let message = PushMessage::new(subscriber.as_str(), event.clone());
                match self.transport.publish(message) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("📬️ Could not push {} for order {} to {subscriber}: {e}", event.kind(), order.order_id);
                        false
                    },
                }
            })
            .count()
    }

    /// Registers the fan-out as the status-changed and order-placed hooks.
    pub fn register_hooks(&self, hooks: &mut EventHooks) {
        let fanout = self.clone();
        hooks.on_status_changed(move |ev| {
            let fanout = fanout.clone();
            Box::pin(async move {
                fanout.publish_status_change(&ev);
            })
        });
        let fanout = self.clone();
        hooks.on_order_placed(move |ev| {
            let fanout = fanout.clone();
            Box::pin(async move {
                fanout.publish_order_placed(&ev);
            })
        });
    }
}
