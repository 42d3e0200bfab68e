use actix_web::{http::StatusCode, test::TestRequest, web};
use food_order_engine::{
    db_types::{OrderStatusType, Role},
    events::EventProducers,
    traits::TransitionCommit,
    OrderFlowApi,
};

use super::{
    helpers::{bearer, error_message, send, token_for},
    mocks::{order, MockOrderStore, COURIER, CUSTOMER, VENDOR},
};
use crate::routes::TransitionRoute;

fn configure(store: MockOrderStore) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(TransitionRoute::<MockOrderStore>::new())
            .app_data(web::Data::new(OrderFlowApi::new(store, EventProducers::default())));
    }
}

fn store_with(status: OrderStatusType) -> MockOrderStore {
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().returning(move |id| Ok(Some(order(id.as_str(), status))));
    store
}

fn request(user_id: &str, role: Role, status: &str) -> TestRequest {
    TestRequest::post()
        .uri("/transition")
        .insert_header(bearer(&token_for(user_id, role)))
        .set_json(serde_json::json!({ "order_id": "o1", "status": status }))
}

#[actix_web::test]
async fn vendor_accepts_pending_order() {
    let _ = env_logger::try_init().ok();
    let mut store = store_with(OrderStatusType::Pending);
    store
        .expect_commit_transition()
        .withf(|id, expected, new_status, actor, _| {
            id.as_str() == "o1" &&
                *expected == OrderStatusType::Pending &&
                *new_status == OrderStatusType::Accepted &&
                actor.user_id == VENDOR
        })
        .times(1)
        .returning(|id, old, new, _, _| {
            Ok(Some(TransitionCommit { old_status: old, order: order(id.as_str(), new), rewards: vec![] }))
        });
    let (status, body) = send(request(VENDOR, Role::Vendor, "accepted"), configure(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "accepted");
}

#[actix_web::test]
async fn customer_cannot_accept() {
    let _ = env_logger::try_init().ok();
    let store = store_with(OrderStatusType::Accepted);
    let (status, body) = send(request(CUSTOMER, Role::Customer, "accepted"), configure(store)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(error_message(&body).contains("customer may not move an order to accepted"), "{body}");
}

#[actix_web::test]
async fn skipping_ahead_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let store = store_with(OrderStatusType::Accepted);
    let (status, body) = send(request(VENDOR, Role::Vendor, "completed"), configure(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(error_message(&body).contains("cannot move from accepted to completed"), "{body}");
}

#[actix_web::test]
async fn terminal_orders_stay_put() {
    let _ = env_logger::try_init().ok();
    let store = store_with(OrderStatusType::Cancelled);
    let (status, _) = send(request(VENDOR, Role::Vendor, "accepted"), configure(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn unassigned_courier_cannot_complete() {
    let _ = env_logger::try_init().ok();
    // The canned order has no courier
    let store = store_with(OrderStatusType::OutForDelivery);
    let (status, _) = send(request(COURIER, Role::Courier, "completed"), configure(store)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn lost_race_reports_the_current_status() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    let mut seq = mockall::Sequence::new();
    store
        .expect_fetch_order_by_order_id()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|id| Ok(Some(order(id.as_str(), OrderStatusType::Pending))));
    store.expect_commit_transition().times(1).in_sequence(&mut seq).returning(|_, _, _, _, _| Ok(None));
    store
        .expect_fetch_order_by_order_id()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|id| Ok(Some(order(id.as_str(), OrderStatusType::Cancelled))));
    let (status, body) = send(request(VENDOR, Role::Vendor, "accepted"), configure(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(error_message(&body).contains("cannot move from cancelled to accepted"), "{body}");
}

#[actix_web::test]
async fn unknown_status_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let (status, _) = send(request(VENDOR, Role::Vendor, "teleported"), configure(MockOrderStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
