use actix_web::{http::StatusCode, test::TestRequest, web};
use chrono::Utc;
use food_order_engine::{
    db_types::{RewardCategory, RewardPolicy, RewardTransaction, Role},
    RewardsApi,
};
use fos_common::Cents;

use super::{
    helpers::{bearer, send, token_for},
    mocks::{MockOrderStore, CUSTOMER},
};
use crate::routes::WalletRoute;

fn configure(store: MockOrderStore) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(WalletRoute::<MockOrderStore>::new())
            .app_data(web::Data::new(RewardsApi::new(store, RewardPolicy::default())));
    }
}

fn credit(id: i64, order_id: &str) -> RewardTransaction {
    RewardTransaction {
        id,
        user_id: CUSTOMER.to_string(),
        amount: Cents::from(100),
        category: RewardCategory::DeliveryCredit,
        description: format!("Delivery credit for order {order_id}"),
        order_id: Some(order_id.into()),
        created_at: Utc::now(),
    }
}

#[actix_web::test]
async fn wallet_summary() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_balance().withf(|user| user == CUSTOMER).times(1).returning(|_| Ok(Cents::from(200)));
    store
        .expect_fetch_recent_transactions()
        .withf(|user, limit| user == CUSTOMER && *limit == 10)
        .times(1)
        .returning(|_, _| Ok(vec![credit(2, "o2"), credit(1, "o1")]));
    let req = TestRequest::get().uri("/wallet").insert_header(bearer(&token_for(CUSTOMER, Role::Customer)));
    let (status, body) = send(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["user_id"], CUSTOMER);
    assert_eq!(json["balance"], 200);
    assert_eq!(json["recent_transactions"].as_array().unwrap().len(), 2);
    assert_eq!(json["recent_transactions"][0]["category"], "delivery_credit");
}

#[actix_web::test]
async fn wallet_limit_is_capped() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_balance().returning(|_| Ok(Cents::from(0)));
    store.expect_fetch_recent_transactions().withf(|_, limit| *limit == 100).times(1).returning(|_, _| Ok(vec![]));
    let req =
        TestRequest::get().uri("/wallet?limit=100000").insert_header(bearer(&token_for(CUSTOMER, Role::Customer)));
    let (status, _) = send(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
}
