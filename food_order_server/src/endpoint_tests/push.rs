use actix_web::{http::StatusCode, test::TestRequest, web};
use food_order_engine::{
    db_types::{Actor, OrderPartition, OrderStatusType, Role},
    notifications::BroadcastPushTransport,
    AccountApi,
};

use super::{
    helpers::{bearer, send_and_read_chunks, token_for},
    mocks::{order, MockOrderStore, CUSTOMER},
};
use crate::routes::SubscribeRoute;

#[actix_web::test]
async fn push_channel_opens_with_a_snapshot() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_orders_for_party()
        .withf(|actor, partition| *actor == Actor::customer(CUSTOMER) && *partition == OrderPartition::Active)
        .times(1)
        .returning(|_, _| Ok(vec![order("o1", OrderStatusType::OutForDelivery)]));
    let transport = BroadcastPushTransport::new(16);
    let configure = move |cfg: &mut web::ServiceConfig| {
        cfg.service(SubscribeRoute::<MockOrderStore>::new())
            .app_data(web::Data::new(AccountApi::new(store)))
            .app_data(web::Data::new(transport));
    };
    let req = TestRequest::get().uri("/subscribe").insert_header(bearer(&token_for(CUSTOMER, Role::Customer)));
    let (status, chunks) = send_and_read_chunks(req, configure, 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].starts_with("event: snapshot\ndata: "), "{}", chunks[0]);
    assert!(chunks[0].contains(r#""status":"out_for_delivery""#));
}
