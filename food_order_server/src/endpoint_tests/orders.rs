use actix_web::{http::StatusCode, test::TestRequest, web};
use food_order_engine::{
    db_types::{Actor, OrderId, OrderPartition, OrderStatusType, Role},
    events::EventProducers,
    traits::InsertOrderResult,
    AccountApi,
    OrderFlowApi,
};

use super::{
    helpers::{bearer, error_message, send, token_for},
    mocks::{order, MockOrderStore, COURIER, CUSTOMER, VENDOR},
};
use crate::routes::{AssignCourierRoute, MyOrdersRoute, OrderByIdRoute, OrderHistoryRoute, PlaceOrderRoute};

fn accounts_configure(store: MockOrderStore) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(MyOrdersRoute::<MockOrderStore>::new())
            .service(OrderHistoryRoute::<MockOrderStore>::new())
            .service(OrderByIdRoute::<MockOrderStore>::new())
            .app_data(web::Data::new(AccountApi::new(store)));
    }
}

fn flow_configure(store: MockOrderStore) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(PlaceOrderRoute::<MockOrderStore>::new())
            .service(AssignCourierRoute::<MockOrderStore>::new())
            .app_data(web::Data::new(OrderFlowApi::new(store, EventProducers::default())));
    }
}

#[actix_web::test]
async fn fetch_my_orders_without_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send(TestRequest::get().uri("/orders"), accounts_configure(MockOrderStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&body), "Authentication Error. No bearer token was provided.");
}

#[actix_web::test]
async fn fetch_my_orders_with_forged_token() {
    let _ = env_logger::try_init().ok();
    let mut token = token_for(CUSTOMER, Role::Customer);
    let n = token.len();
    token.replace_range(n - 6..n - 1, "AAAAA");
    let req = TestRequest::get().uri("/orders").insert_header(bearer(&token));
    let (status, body) = send(req, accounts_configure(MockOrderStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(error_message(&body).contains("Bearer token"), "{body}");
}

#[actix_web::test]
async fn fetch_my_active_orders() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_orders_for_party()
        .withf(|actor, partition| *actor == Actor::customer(CUSTOMER) && *partition == OrderPartition::Active)
        .times(1)
        .returning(|_, _| Ok(vec![order("o1", OrderStatusType::Preparing)]));
    let req = TestRequest::get().uri("/orders").insert_header(bearer(&token_for(CUSTOMER, Role::Customer)));
    let (status, body) = send(req, accounts_configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["partition"], "active");
    assert_eq!(json["orders"][0]["order_id"], "o1");
    assert_eq!(json["orders"][0]["status"], "preparing");
}

#[actix_web::test]
async fn fetch_my_historical_orders() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_orders_for_party()
        .withf(|actor, partition| *actor == Actor::vendor(VENDOR) && *partition == OrderPartition::Historical)
        .times(1)
        .returning(|_, _| Ok(vec![order("o1", OrderStatusType::Completed), order("o2", OrderStatusType::Cancelled)]));
    let req = TestRequest::get()
        .uri("/orders?state=historical")
        .insert_header(bearer(&token_for(VENDOR, Role::Vendor)));
    let (status, body) = send(req, accounts_configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["partition"], "historical");
    assert_eq!(json["orders"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn unknown_order_state_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let req =
        TestRequest::get().uri("/orders?state=delivered").insert_header(bearer(&token_for(CUSTOMER, Role::Customer)));
    let (status, _) = send(req, accounts_configure(MockOrderStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn fetch_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().returning(|id| Ok(Some(order(id.as_str(), OrderStatusType::Pending))));
    let req = TestRequest::get().uri("/orders/o1").insert_header(bearer(&token_for("mallory", Role::Customer)));
    let (status, _) = send(req, accounts_configure(store)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn fetch_missing_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/orders/nope").insert_header(bearer(&token_for(CUSTOMER, Role::Customer)));
    let (status, body) = send(req, accounts_configure(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(error_message(&body).contains("#nope"));
}

#[actix_web::test]
async fn fetch_order_history() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().returning(|id| Ok(Some(order(id.as_str(), OrderStatusType::Accepted))));
    store
        .expect_fetch_status_history()
        .withf(|id| id == &OrderId::from("o1"))
        .times(1)
        .returning(|_| Ok(vec![]));
    let req = TestRequest::get().uri("/orders/o1/history").insert_header(bearer(&token_for(VENDOR, Role::Vendor)));
    let (status, body) = send(req, accounts_configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn vendors_cannot_place_orders() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(bearer(&token_for(VENDOR, Role::Vendor)))
        .set_json(serde_json::json!({
            "order_id": "o9", "vendor_id": VENDOR, "items": [{"name": "Calzone", "quantity": 1}], "total_price": 900
        }));
    let (status, body) = send(req, flow_configure(MockOrderStore::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(error_message(&body).contains("Only customer may call this endpoint"), "{body}");
}

#[actix_web::test]
async fn customers_place_orders_for_themselves() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_insert_order()
        .withf(|o| o.customer_id == CUSTOMER && o.order_id.as_str() == "o9")
        .times(1)
        .returning(|o| Ok(InsertOrderResult::Inserted(order(o.order_id.as_str(), OrderStatusType::Pending))));
    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(bearer(&token_for(CUSTOMER, Role::Customer)))
        .set_json(serde_json::json!({
            "order_id": "o9",
            "vendor_id": VENDOR,
            "customer_id": "somebody-else",
            "items": [{"name": "Calzone", "quantity": 1}],
            "total_price": 900
        }));
    let (status, body) = send(req, flow_configure(store)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "pending");
}

#[actix_web::test]
async fn duplicate_orders_conflict() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_insert_order()
        .returning(|o| Ok(InsertOrderResult::AlreadyExists(order(o.order_id.as_str(), OrderStatusType::Accepted))));
    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(bearer(&token_for(CUSTOMER, Role::Customer)))
        .set_json(serde_json::json!({
            "order_id": "o1", "vendor_id": VENDOR, "items": [{"name": "Calzone", "quantity": 1}], "total_price": 900
        }));
    let (status, _) = send(req, flow_configure(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn malformed_order_body() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(bearer(&token_for(CUSTOMER, Role::Customer)))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"order_id\": 12");
    let (status, body) = send(req, flow_configure(MockOrderStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).starts_with("Could not read request body"));
}

#[actix_web::test]
async fn vendor_assigns_courier() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().returning(|id| Ok(Some(order(id.as_str(), OrderStatusType::Preparing))));
    store
        .expect_compare_status_and_set()
        .withf(|_, expected, update| {
            *expected == OrderStatusType::Preparing && update.courier_id.as_deref() == Some(COURIER)
        })
        .times(1)
        .returning(|id, _, _| {
            let mut o = order(id.as_str(), OrderStatusType::Preparing);
            o.courier_id = Some(COURIER.to_string());
            Ok(Some(o))
        });
    let req = TestRequest::post()
        .uri("/orders/o1/courier")
        .insert_header(bearer(&token_for(VENDOR, Role::Vendor)))
        .set_json(serde_json::json!({ "courier_id": COURIER }));
    let (status, body) = send(req, flow_configure(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["courier_id"], COURIER);
}

#[actix_web::test]
async fn no_couriers_for_finished_orders() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().returning(|id| Ok(Some(order(id.as_str(), OrderStatusType::Cancelled))));
    let req = TestRequest::post()
        .uri("/orders/o1/courier")
        .insert_header(bearer(&token_for(VENDOR, Role::Vendor)))
        .set_json(serde_json::json!({ "courier_id": COURIER }));
    let (status, _) = send(req, flow_configure(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
