use crate::{
    db::traits::{InsertOrderResult, OrderStoreError, OrderUpdate},
    db_types::{Actor, NewOrder, Order, OrderId, OrderPartition, OrderStatusType, StatusChange},
};

/// The `OrderManagement` trait defines the behaviour for storing and querying orders in the database backend.
///
/// Orders are never deleted. All writes to an existing order go through [`OrderManagement::compare_status_and_set`],
/// so no external locking is needed.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a brand-new order in `Pending` status. If an order with the same `order_id` exists, it is returned
    /// untouched as [`InsertOrderResult::AlreadyExists`].
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderStoreError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Fetches the orders the actor is a party to, in the capacity of their role: a customer's own orders, a vendor's
    /// incoming orders, or the orders assigned to a courier. Ordered by creation time, oldest first.
    async fn fetch_orders_for_party(
        &self,
        actor: &Actor,
        partition: OrderPartition,
    ) -> Result<Vec<Order>, OrderStoreError>;

    /// Applies `update` to the order only if its status is still `expected`. `updated_at` is always refreshed.
    ///
    /// Returns the updated order, or `None` if the order's status no longer matched (or the order does not exist).
    async fn compare_status_and_set(
        &self,
        order_id: &OrderId,
        expected: OrderStatusType,
        update: OrderUpdate,
    ) -> Result<Option<Order>, OrderStoreError>;

    /// The audit trail of committed transitions for the order, oldest first.
    async fn fetch_status_history(&self, order_id: &OrderId) -> Result<Vec<StatusChange>, OrderStoreError>;
}
