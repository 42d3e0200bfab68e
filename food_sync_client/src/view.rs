//! The client's local copy of its orders, and the reconciliation rule every incoming status goes through.
//!
//! For each order id a status is only applied if it moves the order forward from what was last seen:
//! * the same status again is a no-op, so duplicate deliveries are harmless;
//! * a finished order never changes again, whatever arrives later;
//! * a status from earlier in the fulfilment sequence is stale and is dropped.
//!
//! Finished orders are moved out of the active list into the historical one.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use food_order_engine::db_types::{Order, OrderId, OrderStatusType};
use log::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewChange {
    /// An order the view did not know about.
    Added { order_id: OrderId, status: OrderStatusType },
    /// A live order moved forward.
    Updated { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    /// An order reached `completed` or `cancelled` and was moved to the historical list.
    Finished { order_id: OrderId, from: Option<OrderStatusType>, to: OrderStatusType },
}

impl ViewChange {
    pub fn order_id(&self) -> &OrderId {
        match self {
            Self::Added { order_id, .. } | Self::Updated { order_id, .. } | Self::Finished { order_id, .. } => order_id,
        }
    }

    pub fn new_status(&self) -> OrderStatusType {
        match self {
            Self::Added { status, .. } => *status,
            Self::Updated { to, .. } | Self::Finished { to, .. } => *to,
        }
    }
}

/// The outcome of offering a status to the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    Changed(ViewChange),
    /// Duplicate, stale, or about an order that has already finished.
    Ignored,
    /// The view has never seen this order. The caller has to fetch it in full.
    Unknown,
}

#[derive(Debug, Clone, Default)]
pub struct LocalOrderView {
    active: BTreeMap<OrderId, Order>,
    historical: BTreeMap<OrderId, Order>,
}

/// Position in the fulfilment sequence. Both terminal states rank last.
fn rank(status: OrderStatusType) -> u8 {
    match status {
        OrderStatusType::Pending => 0,
        OrderStatusType::Accepted => 1,
        OrderStatusType::Preparing => 2,
        OrderStatusType::OutForDelivery => 3,
        OrderStatusType::Completed | OrderStatusType::Cancelled => 4,
    }
}

impl LocalOrderView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live orders, in order id order.
    pub fn active(&self) -> impl Iterator<Item = &Order> {
        self.active.values()
    }

    pub fn historical(&self) -> impl Iterator<Item = &Order> {
        self.historical.values()
    }

    pub fn active_ids(&self) -> Vec<OrderId> {
        self.active.keys().cloned().collect()
    }

    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        self.active.get(order_id).or_else(|| self.historical.get(order_id))
    }

    pub fn status_of(&self, order_id: &OrderId) -> Option<OrderStatusType> {
        self.get(order_id).map(|o| o.status)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.historical.is_empty()
    }

    /// Offers a full order record, as received in a snapshot, a poll or a direct fetch.
    pub fn upsert_order(&mut self, order: Order) -> Reconciled {
        let order_id = order.order_id.clone();
        match self.status_of(&order_id) {
            None => {
                let status = order.status;
                let change = if status.is_terminal() {
                    ViewChange::Finished { order_id: order_id.clone(), from: None, to: status }
                } else {
                    ViewChange::Added { order_id: order_id.clone(), status }
                };
                self.store(order);
                trace!("🔄️ {order_id} added to the local view as {status}");
                Reconciled::Changed(change)
            },
            Some(_) => {
                let status = order.status;
                let updated_at = order.updated_at;
                let result = self.apply_status(&order_id, status, updated_at);
                if let Reconciled::Changed(_) = result {
                    // Take the rest of the record (courier, review gate) along with the new status
                    self.store(order);
                }
                result
            },
        }
    }

    /// Offers a bare status change, as received over the push channel.
    pub fn apply_status(
        &mut self,
        order_id: &OrderId,
        status: OrderStatusType,
        updated_at: DateTime<Utc>,
    ) -> Reconciled {
        if self.historical.contains_key(order_id) {
            trace!("🔄️ {order_id} has already finished. Ignoring {status}.");
            return Reconciled::Ignored;
        }
        let Some(order) = self.active.get_mut(order_id) else {
            return Reconciled::Unknown;
        };
        let from = order.status;
        if status == from {
            return Reconciled::Ignored;
        }
        if rank(status) < rank(from) {
            debug!("🔄️ Stale status {status} for {order_id}, which is already {from}. Ignoring.");
            return Reconciled::Ignored;
        }
        order.status = status;
        order.updated_at = order.updated_at.max(updated_at);
        if status.is_terminal() {
            if let Some(order) = self.active.remove(order_id) {
                self.historical.insert(order_id.clone(), order);
            }
            debug!("🔄️ {order_id} finished as {status}");
            Reconciled::Changed(ViewChange::Finished { order_id: order_id.clone(), from: Some(from), to: status })
        } else {
            trace!("🔄️ {order_id}: {from} -> {status}");
            Reconciled::Changed(ViewChange::Updated { order_id: order_id.clone(), from, to: status })
        }
    }

    fn store(&mut self, order: Order) {
        let order_id = order.order_id.clone();
        if order.status.is_terminal() {
            self.active.remove(&order_id);
            self.historical.insert(order_id, order);
        } else {
            self.active.insert(order_id, order);
        }
    }
}
