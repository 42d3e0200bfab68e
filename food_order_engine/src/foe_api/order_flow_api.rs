use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::{InsertOrderResult, OrderFlowDatabase, OrderUpdate, TransitionCommit},
    db_types::{Actor, NewOrder, Order, OrderId, OrderStatusType, RewardPolicy, Role},
    events::{EventProducers, OrderPlacedEvent, OrderStatusChangedEvent, RewardCreditedEvent},
    foe_api::errors::OrderFlowError,
    state_machine::OrderStateMachine,
};

/// `OrderFlowApi` is the primary API for moving orders through their lifecycle.
///
/// Every status change goes through [`OrderFlowApi::transition`]. Side effects of a commit (audit trail, reward credit,
/// review gate) are written by the backend in the same transaction. Event hooks are notified only after the commit,
/// and never block it.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    reward_policy: RewardPolicy,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, reward_policy: RewardPolicy::default() }
    }

    pub fn with_reward_policy(mut self, policy: RewardPolicy) -> Self {
        self.reward_policy = policy;
        self
    }

    pub fn reward_policy(&self) -> &RewardPolicy {
        &self.reward_policy
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderFlowDatabase
{
    /// Stores a brand-new order in the `pending` state.
    ///
    /// If an order with the same id already exists, `OrderAlreadyExists` is returned and nothing changes.
    pub async fn place_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        validate_new_order(&order)?;
        let order_id = order.order_id.clone();
        match self.db.insert_order(order).await? {
            InsertOrderResult::Inserted(order) => {
                debug!("🔄️📦️ Order {order_id} placed by {} with {}", order.customer_id, order.vendor_id);
                self.call_order_placed_hook(&order);
                Ok(order)
            },
            InsertOrderResult::AlreadyExists(_) => {
                warn!("🔄️📦️ Order {order_id} already exists. The new order was ignored.");
                Err(OrderFlowError::OrderAlreadyExists(order_id))
            },
        }
    }

    /// Moves the order to `requested` on behalf of `actor`.
    ///
    /// The checks happen in this order:
    /// 1. The order must exist (`NotFound`).
    /// 2. The actor must be a party to the order (`Unauthorized`).
    /// 3. The actor's role must be allowed to request `requested` (`Unauthorized`).
    /// 4. `requested` must be a direct successor of the current status (`InvalidTransition`).
    ///
    /// The commit is conditioned on the status observed in step 1. If another request got there first, this one fails
    /// with `InvalidTransition` from whatever the status is now.
    pub async fn transition(
        &self,
        order_id: &OrderId,
        requested: OrderStatusType,
        actor: &Actor,
    ) -> Result<Order, OrderFlowError> {
        let order = self.fetch_order(order_id).await?;
        if !actor.is_party_to(&order) {
            debug!("🔄️ {actor} tried to move order {order_id}, which is not theirs");
            return Err(OrderFlowError::Unauthorized(format!("{actor} is not a party to order {order_id}")));
        }
        let current = order.status;
        OrderStateMachine::validate(current, requested, actor.role)
            .map_err(|e| OrderFlowError::from_transition_error(order_id, e))?;
        let commit = self.db.commit_transition(order_id, current, requested, actor, &self.reward_policy).await?;
        let Some(commit) = commit else {
            let now = self.fetch_order(order_id).await.map(|o| o.status).unwrap_or(current);
            info!("🔄️ Order {order_id} changed from {current} to {now} while {actor} was moving it to {requested}");
            return Err(OrderFlowError::InvalidTransition { order_id: order_id.clone(), from: now, to: requested });
        };
        info!("🔄️ Order {order_id}: {current} -> {requested} ({actor})");
        self.notify_commit(&commit, actor);
        Ok(commit.order)
    }

    /// Assigns a delivery partner to the order. Only the order's vendor may do this, and only while the order is live.
    pub async fn assign_courier(
        &self,
        order_id: &OrderId,
        courier_id: &str,
        actor: &Actor,
    ) -> Result<Order, OrderFlowError> {
        if actor.role != Role::Vendor {
            return Err(OrderFlowError::Unauthorized(format!("{actor} cannot assign couriers")));
        }
        if courier_id.trim().is_empty() {
            return Err(OrderFlowError::InvalidOrder("Courier id cannot be empty".into()));
        }
        let mut order = self.fetch_order(order_id).await?;
        if !actor.is_party_to(&order) {
            return Err(OrderFlowError::Unauthorized(format!("{actor} is not a party to order {order_id}")));
        }
        // A lost race means the status moved forward. The graph is finite, so this terminates.
        loop {
            if order.status.is_terminal() {
                return Err(OrderFlowError::OrderIsTerminal { order_id: order_id.clone(), status: order.status });
            }
            let update = OrderUpdate::default().with_courier(courier_id);
            if let Some(updated) = self.db.compare_status_and_set(order_id, order.status, update).await? {
                info!("🔄️🛵️ Courier {courier_id} assigned to order {order_id}");
                return Ok(updated);
            }
            order = self.fetch_order(order_id).await?;
        }
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        self.db.fetch_order_by_order_id(order_id).await?.ok_or_else(|| OrderFlowError::NotFound(order_id.clone()))
    }

    fn notify_commit(&self, commit: &TransitionCommit, actor: &Actor) {
        for emitter in &self.producers.status_changed_producer {
            trace!("🔄️ Notifying status changed hook subscribers");
            let event = OrderStatusChangedEvent::new(commit.order.clone(), commit.old_status, actor.clone());
            emitter.publish_event(event);
        }
        if commit.rewards.is_empty() {
            return;
        }
        for emitter in &self.producers.reward_credited_producer {
            trace!("🔄️💰️ Notifying reward credited hook subscribers");
            let event = RewardCreditedEvent::new(commit.order.customer_id.clone(), commit.rewards.clone());
            emitter.publish_event(event);
        }
    }

    fn call_order_placed_hook(&self, order: &Order) {
        for emitter in &self.producers.order_placed_producer {
            trace!("🔄️📦️ Notifying order placed hook subscribers");
            emitter.publish_event(OrderPlacedEvent::new(order.clone()));
        }
    }
}

fn validate_new_order(order: &NewOrder) -> Result<(), OrderFlowError> {
    if order.order_id.as_str().trim().is_empty() {
        return Err(OrderFlowError::InvalidOrder("Order id cannot be empty".into()));
    }
    if order.customer_id.trim().is_empty() || order.vendor_id.trim().is_empty() {
        return Err(OrderFlowError::InvalidOrder("Both a customer and a vendor are required".into()));
    }
    if order.items.is_empty() {
        return Err(OrderFlowError::InvalidOrder("An order needs at least one item".into()));
    }
    if order.items.iter().any(|i| i.quantity == 0) {
        return Err(OrderFlowError::InvalidOrder("Item quantities must be positive".into()));
    }
    if order.total_price.is_negative() {
        return Err(OrderFlowError::InvalidOrder(format!("Negative order total: {}", order.total_price)));
    }
    Ok(())
}
