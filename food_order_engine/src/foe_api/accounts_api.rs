//! Read-only views of orders, scoped to the caller.

use std::fmt::Debug;

use log::trace;

use crate::{
    db::traits::OrderManagement,
    db_types::{Actor, Order, OrderId, OrderPartition, StatusChange},
    foe_api::{errors::OrderFlowError, order_objects::OrdersResult},
};

pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The caller's orders in one partition: a customer's own orders, a vendor's incoming orders, or a courier's
    /// assigned deliveries.
    pub async fn orders_for_actor(
        &self,
        actor: &Actor,
        partition: OrderPartition,
    ) -> Result<OrdersResult, OrderFlowError> {
        let orders = self.db.fetch_orders_for_party(actor, partition).await?;
        trace!("{} {partition} orders fetched for {actor}", orders.len());
        Ok(OrdersResult { partition, orders })
    }

    /// Fetches a single order. Actors that are not a party to the order get `Unauthorized`.
    pub async fn order_for_actor(&self, actor: &Actor, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        let order =
            self.db.fetch_order_by_order_id(order_id).await?.ok_or_else(|| OrderFlowError::NotFound(order_id.clone()))?;
        if !actor.is_party_to(&order) {
            return Err(OrderFlowError::Unauthorized(format!("{actor} is not a party to order {order_id}")));
        }
        Ok(order)
    }

    pub async fn status_history(&self, actor: &Actor, order_id: &OrderId) -> Result<Vec<StatusChange>, OrderFlowError> {
        let _ = self.order_for_actor(actor, order_id).await?;
        let history = self.db.fetch_status_history(order_id).await?;
        Ok(history)
    }
}
