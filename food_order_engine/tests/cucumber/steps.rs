use cucumber::{then, when};
use fos_common::Cents;
use food_order_engine::{
    db_types::{Actor, NewOrder, NewReview, OrderId, OrderStatusType},
    OrderManagement,
    RewardManagement,
};

use crate::cucumber::{
    order_world::{actor, error_kind},
    OrderWorld,
};

#[when(expr = "customer '{word}' places order {word} with vendor '{word}'")]
async fn place_order(world: &mut OrderWorld, customer: String, order_id: String, vendor: String) {
    let order = NewOrder::new(OrderId::from(order_id), customer, vendor, Cents::from(2400)).with_item("Ramen", 2);
    let result = world.api().place_order(order).await;
    world.record(result);
}

#[when(expr = "{word} '{word}' moves order {word} to {word}")]
async fn move_order(world: &mut OrderWorld, role: String, user_id: String, order_id: String, status: String) {
    let status = status.parse::<OrderStatusType>().expect("Not a valid status");
    let actor = actor(&role, user_id);
    let result = world.api().transition(&OrderId::from(order_id), status, &actor).await;
    world.record(result);
}

#[when(expr = "vendor '{word}' delivers order {word}")]
async fn deliver_order(world: &mut OrderWorld, vendor: String, order_id: String) {
    use OrderStatusType::*;
    let vendor = Actor::vendor(vendor);
    let id = OrderId::from(order_id);
    for status in [Accepted, Preparing, OutForDelivery, Completed] {
        world.api().transition(&id, status, &vendor).await.expect("Error delivering order");
    }
}

#[when(expr = "vendor '{word}' assigns courier '{word}' to order {word}")]
async fn assign_courier(world: &mut OrderWorld, vendor: String, courier: String, order_id: String) {
    let result = world.api().assign_courier(&OrderId::from(order_id), &courier, &Actor::vendor(vendor)).await;
    world.record(result);
}

#[when(expr = "the completion of order {word} for '{word}' is delivered {int} more times")]
async fn redeliver_completion(world: &mut OrderWorld, order_id: String, customer: String, times: usize) {
    let id = OrderId::from(order_id);
    for _ in 0..times {
        let written =
            world.system().rewards.credit_for_completed_order(&customer, &id).await.expect("Error crediting order");
        assert!(written.is_empty(), "Redelivery wrote to the ledger");
    }
}

#[when(expr = "customer '{word}' reviews order {word} with {int} stars")]
async fn review_order(world: &mut OrderWorld, customer: String, order_id: String, rating: i64) {
    let review = NewReview::new(OrderId::from(order_id), rating, "Left from a cucumber step");
    let result = world.system().reviews.submit_review(&Actor::customer(customer), review).await;
    world.record(result);
}

#[when(expr = "customer '{word}' complains about order {word}")]
async fn complain(world: &mut OrderWorld, customer: String, order_id: String) {
    let review = NewReview::new(OrderId::from(order_id), 1, "Cold on arrival").as_complaint();
    let result = world.system().reviews.submit_review(&Actor::customer(customer), review).await;
    world.record(result);
}

#[then(expr = "order {word} has status {word}")]
async fn check_status(world: &mut OrderWorld, order_id: String, status: String) {
    let status = status.parse::<OrderStatusType>().expect("Not a valid status");
    let order = world
        .api()
        .db()
        .fetch_order_by_order_id(&OrderId::from(order_id))
        .await
        .expect("Error fetching order")
        .expect("Order does not exist");
    assert_eq!(order.status, status);
}

#[then("the request succeeds")]
async fn check_success(world: &mut OrderWorld) {
    assert!(world.last_error.is_none(), "Request failed: {:?}", world.last_error);
}

#[then(expr = "the request fails with {word}")]
async fn check_failure(world: &mut OrderWorld, kind: String) {
    let err = world.last_error.take().expect("The request did not fail");
    assert_eq!(error_kind(&err), kind, "Unexpected error: {err}");
}

#[then(expr = "the balance of '{word}' is {word}")]
async fn check_balance(world: &mut OrderWorld, user_id: String, balance: String) {
    let actual = world.api().db().fetch_balance(&user_id).await.expect("Error fetching balance");
    assert_eq!(actual.to_string(), balance);
}

#[then(expr = "'{word}' has {int} ledger entries")]
async fn check_ledger_entries(world: &mut OrderWorld, user_id: String, count: usize) {
    let txs = world.api().db().fetch_recent_transactions(&user_id, 1000).await.expect("Error fetching transactions");
    assert_eq!(txs.len(), count);
}

#[then(expr = "vendor '{word}' has {int} complaint(s)")]
async fn check_complaints(world: &mut OrderWorld, vendor: String, count: usize) {
    let complaints = world
        .system()
        .reviews
        .reviews_for_vendor(&Actor::vendor(vendor), true)
        .await
        .expect("Error fetching complaints");
    assert_eq!(complaints.len(), count);
}
