use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use food_order_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    notifications::{BroadcastPushTransport, NotificationFanout},
    AccountApi,
    OrderFlowApi,
    ReviewApi,
    RewardsApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::TokenIssuer,
    config::{ServerConfig, ServerOptions},
    errors::{json_error_handler, query_error_handler, ServerError},
    middleware::BearerAuthMiddlewareFactory,
    routes::{
        health,
        AssignCourierRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        OrderHistoryRoute,
        PlaceOrderRoute,
        SubscribeRoute,
        SubmitReviewRoute,
        TransitionRoute,
        VendorReviewsRoute,
        WalletRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🗃️ Database is ready at {}", config.database_url);
    let transport = BroadcastPushTransport::new(config.event_buffer_size);
    let hooks = create_event_hooks(&transport);
    let handlers = EventHandlers::new(config.event_buffer_size, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers, transport)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Hooks every committed change into the push fan-out, and logs reward credits.
pub fn create_event_hooks(transport: &BroadcastPushTransport) -> EventHooks {
    let mut hooks = EventHooks::default();
    let fanout = NotificationFanout::new(transport.clone());
    fanout.register_hooks(&mut hooks);
    hooks.on_reward_credited(|ev| {
        Box::pin(async move {
            let total = ev.transactions.iter().map(|t| t.amount).sum::<fos_common::Cents>();
            info!("💰️ {} credited to {} in {} transaction(s)", total, ev.user_id, ev.transactions.len());
        })
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
    transport: BroadcastPushTransport,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let issuer = TokenIssuer::new(&config.auth);
    let policy = config.reward_policy;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone()).with_reward_policy(policy);
        let accounts_api = AccountApi::new(db.clone());
        let rewards_api = RewardsApi::new(db.clone(), policy);
        let reviews_api = ReviewApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("fos::access_log"))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(rewards_api))
            .app_data(web::Data::new(reviews_api))
            .app_data(web::Data::new(transport.clone()))
            .app_data(web::Data::new(options));
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(BearerAuthMiddlewareFactory::new(issuer.clone(), options))
            .service(TransitionRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(PlaceOrderRoute::<SqliteDatabase>::new())
            .service(OrderHistoryRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(AssignCourierRoute::<SqliteDatabase>::new())
            .service(SubmitReviewRoute::<SqliteDatabase>::new())
            .service(VendorReviewsRoute::<SqliteDatabase>::new())
            .service(WalletRoute::<SqliteDatabase>::new())
            .service(SubscribeRoute::<SqliteDatabase>::new());
        app.service(health).service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
