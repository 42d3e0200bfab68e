use actix_web::{http::StatusCode, test::TestRequest, web};
use chrono::Utc;
use food_order_engine::{
    db_types::{OrderStatusType, Review, Role},
    ReviewApi,
};

use super::{
    helpers::{bearer, error_message, send, token_for},
    mocks::{order, MockOrderStore, CUSTOMER, VENDOR},
};
use crate::routes::{SubmitReviewRoute, VendorReviewsRoute};

fn configure(store: MockOrderStore) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(SubmitReviewRoute::<MockOrderStore>::new())
            .service(VendorReviewsRoute::<MockOrderStore>::new())
            .app_data(web::Data::new(ReviewApi::new(store)));
    }
}

fn review(rating: i64, is_complaint: bool) -> Review {
    Review {
        id: 7,
        order_id: "o1".into(),
        customer_id: CUSTOMER.to_string(),
        vendor_id: VENDOR.to_string(),
        rating,
        text: "Cold by the time it arrived".to_string(),
        is_complaint,
        created_at: Utc::now(),
    }
}

fn review_request(rating: i64) -> TestRequest {
    TestRequest::post().uri("/review").insert_header(bearer(&token_for(CUSTOMER, Role::Customer))).set_json(
        serde_json::json!({ "order_id": "o1", "rating": rating, "text": "Cold by the time it arrived", "is_complaint": true }),
    )
}

#[actix_web::test]
async fn review_a_completed_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().returning(|id| Ok(Some(order(id.as_str(), OrderStatusType::Completed))));
    store
        .expect_submit_review()
        .withf(|r| r.rating == 2 && r.is_complaint)
        .times(1)
        .returning(|r| Ok(Some(review(r.rating, r.is_complaint))));
    let (status, body) = send(review_request(2), configure(store)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["rating"], 2);
    assert_eq!(json["is_complaint"], true);
}

#[actix_web::test]
async fn pending_orders_cannot_be_reviewed() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().returning(|id| Ok(Some(order(id.as_str(), OrderStatusType::Pending))));
    let (status, body) = send(review_request(4), configure(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(error_message(&body).contains("has not been completed"), "{body}");
}

#[actix_web::test]
async fn second_review_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().returning(|id| Ok(Some(order(id.as_str(), OrderStatusType::Completed))));
    store.expect_submit_review().returning(|_| Ok(None));
    let (status, body) = send(review_request(5), configure(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(error_message(&body).contains("already been reviewed"), "{body}");
}

#[actix_web::test]
async fn ratings_are_bounded() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send(review_request(6), configure(MockOrderStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("Rating must be between 1 and 5"), "{body}");
}

#[actix_web::test]
async fn vendors_cannot_review() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/review")
        .insert_header(bearer(&token_for(VENDOR, Role::Vendor)))
        .set_json(serde_json::json!({ "order_id": "o1", "rating": 5 }));
    let (status, _) = send(req, configure(MockOrderStore::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn vendor_lists_complaints() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_reviews_for_vendor()
        .withf(|vendor, complaints_only| vendor == VENDOR && *complaints_only)
        .times(1)
        .returning(|_, _| Ok(vec![review(1, true)]));
    let req = TestRequest::get()
        .uri("/reviews?complaints_only=true")
        .insert_header(bearer(&token_for(VENDOR, Role::Vendor)));
    let (status, body) = send(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
}
