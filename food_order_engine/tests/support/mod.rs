#![allow(dead_code)]
use fos_common::Cents;
use food_order_engine::{
    db_types::{Actor, NewOrder, Order, OrderId, OrderStatusType, RewardPolicy},
    events::EventProducers,
    test_utils::prepare_env::fresh_database,
    OrderFlowApi,
    SqliteDatabase,
};

pub const CUSTOMER: &str = "alice";
pub const VENDOR: &str = "pizzeria";
pub const COURIER: &str = "carl";

pub async fn setup() -> OrderFlowApi<SqliteDatabase> {
    setup_with(EventProducers::default(), RewardPolicy::default()).await
}

pub async fn setup_with(producers: EventProducers, policy: RewardPolicy) -> OrderFlowApi<SqliteDatabase> {
    let (db, _url) = fresh_database().await;
    OrderFlowApi::new(db, producers).with_reward_policy(policy)
}

pub fn new_order(order_id: &str, customer: &str) -> NewOrder {
    NewOrder::new(OrderId::from(order_id), customer, VENDOR, Cents::from(1850))
        .with_item("Quattro Formaggi", 1)
        .with_item("Tiramisu", 2)
}

pub async fn place(api: &OrderFlowApi<SqliteDatabase>, order_id: &str, customer: &str) -> Order {
    api.place_order(new_order(order_id, customer)).await.expect("Error placing order")
}

/// Drives a freshly placed order along the happy path as far as `target`, acting as the vendor.
pub async fn drive_to(api: &OrderFlowApi<SqliteDatabase>, order_id: &str, target: OrderStatusType) -> Order {
    use OrderStatusType::*;
    let id = OrderId::from(order_id);
    let vendor = Actor::vendor(VENDOR);
    let mut order = None;
    for status in [Accepted, Preparing, OutForDelivery, Completed] {
        order = Some(api.transition(&id, status, &vendor).await.expect("Error moving order along"));
        if status == target {
            break;
        }
    }
    order.expect("target must be past pending")
}

/// Places an order for `customer` and completes it.
pub async fn complete_new_order(api: &OrderFlowApi<SqliteDatabase>, order_id: &str, customer: &str) -> Order {
    place(api, order_id, customer).await;
    drive_to(api, order_id, OrderStatusType::Completed).await
}
