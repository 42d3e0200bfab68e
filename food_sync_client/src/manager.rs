//! # Sync channel manager
//!
//! One manager runs per client session. Its life looks like this:
//!
//! ```text
//!   Connecting ──(push opened within the timeout)──► PushActive
//!       │                                               │
//!       └──(timeout or refusal)──► PollActive ◄──(channel dropped)
//! ```
//!
//! The connect timeout is armed exactly once. Once the session is polling it stays polling, and the poll period
//! is fixed. Everything that arrives, from either channel, goes through [`LocalOrderView`], so replays and overlaps
//! between push and poll change the view at most once.
//!
//! When one of the subscriber's own orders is seen completing, the wallet is re-read once for that order so the
//! delivery credit shows up.
use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    future::Future,
};

use food_order_engine::{
    db_types::{Actor, Order, OrderId, OrderStatusType, Role},
    notifications::SyncEvent,
    order_objects::WalletSummary,
};
use log::*;
use tokio::time::{self, Interval, MissedTickBehavior};

use crate::{
    config::SyncConfig,
    errors::TransportError,
    transport::{OrderSyncTransport, PushConnection},
    view::{LocalOrderView, Reconciled, ViewChange},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// The push channel has not been tried yet.
    Connecting,
    PushActive,
    /// Terminal for the session.
    PollActive,
}

impl Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::PushActive => write!(f, "push"),
            Self::PollActive => write!(f, "poll"),
        }
    }
}

pub struct SyncChannelManager<T> {
    transport: T,
    config: SyncConfig,
    subscriber: Actor,
    view: LocalOrderView,
    mode: SyncMode,
    wallet: Option<WalletSummary>,
    /// Completed orders the wallet has already been refreshed for.
    rewarded: HashSet<OrderId>,
    push: Option<PushConnection>,
    poll: Option<Interval>,
}

impl<T: OrderSyncTransport> SyncChannelManager<T> {
    pub fn new(transport: T, subscriber: Actor, config: SyncConfig) -> Self {
        Self {
            transport,
            config,
            subscriber,
            view: LocalOrderView::new(),
            mode: SyncMode::Connecting,
            wallet: None,
            rewarded: HashSet::new(),
            push: None,
            poll: None,
        }
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn view(&self) -> &LocalOrderView {
        &self.view
    }

    /// The last wallet summary fetched, if any.
    pub fn wallet(&self) -> Option<&WalletSummary> {
        self.wallet.as_ref()
    }

    pub fn subscriber(&self) -> &Actor {
        &self.subscriber
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Tries the push channel, giving it `push_connect_timeout` to open. On a timeout or a refusal the session falls
    /// back to polling. Calling this again after the first attempt does nothing.
    pub async fn connect(&mut self) -> SyncMode {
        if self.mode != SyncMode::Connecting {
            return self.mode;
        }
        let timeout = self.config.push_connect_timeout;
        match time::timeout(timeout, self.transport.open_push()).await {
            Ok(Ok(connection)) => {
                info!("🔄️ Push channel open for {}", self.subscriber);
                self.push = Some(connection);
                self.mode = SyncMode::PushActive;
            },
            Ok(Err(e)) => {
                warn!("🔄️ Could not open the push channel for {}. {e}. Falling back to polling.", self.subscriber);
                self.start_polling();
            },
            Err(_) => {
                warn!(
                    "🔄️ Push channel for {} did not open within {}ms. Falling back to polling.",
                    self.subscriber,
                    timeout.as_millis()
                );
                self.start_polling();
            },
        }
        self.mode
    }

    /// Re-reads the wallet summary.
    pub async fn refresh_wallet(&mut self) -> Result<&WalletSummary, TransportError> {
        let summary = self.transport.fetch_wallet(self.config.recent_transactions_limit).await?;
        debug!("💰️ Wallet for {} refreshed. Balance: {}", self.subscriber, summary.balance);
        Ok(&*self.wallet.insert(summary))
    }

    /// Waits for the next push message or poll tick and folds it into the view.
    ///
    /// Returns the changes it made, which is often nothing (heartbeats, duplicates, quiet polls). Connects first if
    /// that has not happened yet.
    pub async fn next_update(&mut self) -> Vec<ViewChange> {
        if self.mode == SyncMode::Connecting {
            self.connect().await;
        }
        let changes = match self.mode {
            SyncMode::PushActive => self.next_push_update().await,
            _ => self.next_poll_update().await,
        };
        self.refresh_wallet_for_deliveries(&changes).await;
        changes
    }

    /// Runs until `shutdown` resolves, calling `on_change` after every update that changed the view.
    pub async fn run<F, S>(&mut self, shutdown: S, mut on_change: F)
    where
        F: FnMut(&[ViewChange], &LocalOrderView),
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let changes = tokio::select! {
                _ = &mut shutdown => {
                    info!("🔄️ Sync session for {} shutting down", self.subscriber);
                    break;
                },
                changes = self.next_update() => changes,
            };
            if !changes.is_empty() {
                on_change(&changes, &self.view);
            }
        }
    }

    async fn next_push_update(&mut self) -> Vec<ViewChange> {
        let received = match self.push.as_mut() {
            Some(push) => push.recv().await,
            None => None,
        };
        match received {
            Some(Ok(event)) => self.apply_event(event).await,
            Some(Err(e)) => {
                warn!("🔄️ Push channel for {} failed. {e}. Switching to polling.", self.subscriber);
                self.start_polling();
                Vec::new()
            },
            None => {
                warn!("🔄️ Push channel for {} closed. Switching to polling.", self.subscriber);
                self.start_polling();
                Vec::new()
            },
        }
    }

    async fn next_poll_update(&mut self) -> Vec<ViewChange> {
        if self.poll.is_none() {
            self.start_polling();
        }
        if let Some(poll) = self.poll.as_mut() {
            poll.tick().await;
        }
        match self.transport.fetch_active_orders().await {
            Ok(orders) => {
                trace!("🔄️ Poll for {} returned {} active orders", self.subscriber, orders.len());
                self.reconcile_active(orders).await
            },
            Err(e) => {
                warn!("🔄️ Poll for {} failed. {e}. Will retry on the next tick.", self.subscriber);
                Vec::new()
            },
        }
    }

    fn start_polling(&mut self) {
        self.push = None;
        self.mode = SyncMode::PollActive;
        if self.poll.is_none() {
            // The first tick completes immediately, so the view catches up straight away
            let mut interval = time::interval(self.config.poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.poll = Some(interval);
        }
    }

    async fn apply_event(&mut self, event: SyncEvent) -> Vec<ViewChange> {
        match event {
            SyncEvent::Heartbeat => Vec::new(),
            SyncEvent::Snapshot { orders } => {
                debug!("🔄️ Snapshot of {} active orders for {}", orders.len(), self.subscriber);
                self.reconcile_active(orders).await
            },
            SyncEvent::OrderPlaced { order } => changed(self.view.upsert_order(order)).into_iter().collect(),
            SyncEvent::StatusChanged { order_id, status, updated_at } => {
                match self.view.apply_status(&order_id, status, updated_at) {
                    Reconciled::Unknown => {
                        debug!("🔄️ Status {status} for unseen order {order_id}. Fetching it.");
                        self.fetch_and_upsert(&order_id).await.into_iter().collect()
                    },
                    result => changed(result).into_iter().collect(),
                }
            },
        }
    }

    /// Applies a full list of the subscriber's active orders. Orders the view still thinks are active but which the
    /// server no longer lists have finished in the meantime; they are fetched one by one to learn how.
    async fn reconcile_active(&mut self, orders: Vec<Order>) -> Vec<ViewChange> {
        let listed = orders.iter().map(|o| o.order_id.clone()).collect::<HashSet<_>>();
        let mut changes = orders.into_iter().filter_map(|o| changed(self.view.upsert_order(o))).collect::<Vec<_>>();
        let missing = self.view.active_ids().into_iter().filter(|id| !listed.contains(id)).collect::<Vec<_>>();
        for order_id in missing {
            changes.extend(self.fetch_and_upsert(&order_id).await);
        }
        changes
    }

    async fn fetch_and_upsert(&mut self, order_id: &OrderId) -> Option<ViewChange> {
        match self.transport.fetch_order(order_id).await {
            Ok(order) => changed(self.view.upsert_order(order)),
            Err(e) => {
                warn!("🔄️ Could not fetch {order_id} for {}. {e}", self.subscriber);
                None
            },
        }
    }

    async fn refresh_wallet_for_deliveries(&mut self, changes: &[ViewChange]) {
        if self.subscriber.role != Role::Customer {
            return;
        }
        let customers = changes
            .iter()
            .filter(|c| c.new_status() == OrderStatusType::Completed)
            .filter_map(|c| self.view.get(c.order_id()).map(|o| (c.order_id().clone(), o.customer_id.clone())))
            .collect::<HashMap<_, _>>();
        let mut refresh = false;
        for (order_id, customer_id) in customers {
            if customer_id == self.subscriber.user_id && self.rewarded.insert(order_id.clone()) {
                debug!("💰️ {order_id} was delivered. Refreshing the wallet for {}.", self.subscriber);
                refresh = true;
            }
        }
        if refresh {
            if let Err(e) = self.refresh_wallet().await {
                warn!("💰️ Could not refresh the wallet for {}. {e}", self.subscriber);
            }
        }
    }
}

fn changed(result: Reconciled) -> Option<ViewChange> {
    match result {
        Reconciled::Changed(change) => Some(change),
        _ => None,
    }
}
