use log::{debug, trace};
use sqlx::{types::Json, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::{
        sqlite::SqliteDatabaseError,
        traits::{InsertOrderResult, OrderUpdate},
    },
    db_types::{Actor, NewOrder, Order, OrderId, OrderPartition, OrderStatusType, Role},
};

/// Inserts the order, unless one with the same `order_id` already exists, in which case the existing order is
/// returned.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, SqliteDatabaseError> {
    let result = match fetch_order_by_order_id(&order.order_id, &mut *conn).await? {
        Some(existing) => InsertOrderResult::AlreadyExists(existing),
        None => InsertOrderResult::Inserted(insert_order(order, conn).await?),
    };
    Ok(result)
}

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    let order = sqlx::query_as::<_, Order>(
        r#"
            INSERT INTO orders (
                order_id,
                customer_id,
                vendor_id,
                items,
                instructions,
                total_price,
                currency
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(&order.order_id)
    .bind(&order.customer_id)
    .bind(&order.vendor_id)
    .bind(Json(&order.items))
    .bind(&order.instructions)
    .bind(order.total_price)
    .bind(&order.currency)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order {} has been saved in the DB with id {}", order.order_id, order.id);
    Ok(order)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

#[derive(Debug, Clone, Default)]
pub struct OrderQueryFilter {
    order_id: Option<OrderId>,
    customer_id: Option<String>,
    vendor_id: Option<String>,
    courier_id: Option<String>,
    statuses: Vec<OrderStatusType>,
}

impl OrderQueryFilter {
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_customer_id<S: Into<String>>(mut self, customer_id: S) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_vendor_id<S: Into<String>>(mut self, vendor_id: S) -> Self {
        self.vendor_id = Some(vendor_id.into());
        self
    }

    pub fn with_courier_id<S: Into<String>>(mut self, courier_id: S) -> Self {
        self.courier_id = Some(courier_id.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.statuses.push(status);
        self
    }

    /// Restricts the filter to the orders that `actor` is a party to, in the capacity of their role.
    pub fn for_party(self, actor: &Actor) -> Self {
        match actor.role {
            Role::Customer => self.with_customer_id(&actor.user_id),
            Role::Vendor => self.with_vendor_id(&actor.user_id),
            Role::Courier => self.with_courier_id(&actor.user_id),
        }
    }

    pub fn in_partition(mut self, partition: OrderPartition) -> Self {
        let statuses = OrderStatusType::all().into_iter().filter(|s| partition.contains(*s));
        self.statuses.extend(statuses);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() &&
            self.customer_id.is_none() &&
            self.vendor_id.is_none() &&
            self.courier_id.is_none() &&
            self.statuses.is_empty()
    }
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order
pub async fn fetch_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = query.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id);
    }
    if let Some(customer_id) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(customer_id);
    }
    if let Some(vendor_id) = query.vendor_id {
        where_clause.push("vendor_id = ");
        where_clause.push_bind_unseparated(vendor_id);
    }
    if let Some(courier_id) = query.courier_id {
        where_clause.push("courier_id = ");
        where_clause.push_bind_unseparated(courier_id);
    }
    if !query.statuses.is_empty() {
        let statuses = query.statuses.iter().map(|s| format!("'{}'", s.as_str())).collect::<Vec<_>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    builder.push(" ORDER BY created_at ASC, id ASC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of fetch_orders: {}", orders.len());
    Ok(orders)
}

/// The conditional-update primitive. Applies `update` only if the order's status is still `expected`, and returns the
/// updated row. `None` means nothing was written.
pub async fn compare_status_and_set(
    order_id: &OrderId,
    expected: OrderStatusType,
    update: OrderUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET ");
    let mut set_clause = builder.separated(", ");
    if let Some(status) = update.status {
        set_clause.push("status = ");
        set_clause.push_bind_unseparated(status);
    }
    if let Some(courier_id) = update.courier_id {
        set_clause.push("courier_id = ");
        set_clause.push_bind_unseparated(courier_id);
    }
    if let Some(gate) = update.review_gate {
        set_clause.push("review_gate = ");
        set_clause.push_bind_unseparated(gate);
    }
    set_clause.push("updated_at = CURRENT_TIMESTAMP");
    builder.push(" WHERE order_id = ");
    builder.push_bind(order_id);
    builder.push(" AND status = ");
    builder.push_bind(expected);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let order = builder.build_query_as::<Order>().fetch_optional(conn).await?;
    match &order {
        Some(o) => trace!("🗃️ Order {order_id} updated. Status is now {}", o.status),
        None => debug!("🗃️ Order {order_id} was not in status {expected}. Conditional update skipped."),
    }
    Ok(order)
}

/// Lifetime count of completed orders placed by the customer.
pub async fn count_completed_for_customer(
    customer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<i64, SqliteDatabaseError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE customer_id = $1 AND status = $2")
        .bind(customer_id)
        .bind(OrderStatusType::Completed)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub(crate) async fn set_review_id(
    order_id: &OrderId,
    review_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query("UPDATE orders SET review_id = $1 WHERE order_id = $2")
        .bind(review_id)
        .bind(order_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::OrderNotFound(order_id.clone()));
    }
    Ok(())
}
