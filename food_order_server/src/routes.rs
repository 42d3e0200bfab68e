//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
//!
//! Every route in this module lives in the authenticated `/api` scope, except for `/health`.
use actix_web::{get, web, HttpResponse, Responder};
use food_order_engine::{
    db_types::{NewReview, OrderId, OrderPartition, Role},
    notifications::BroadcastPushTransport,
    order_objects::{CourierAssignment, TransitionRequest},
    traits::{OrderFlowDatabase, OrderManagement},
    AccountApi,
    OrderFlowApi,
    ReviewApi,
    RewardsApi,
};
use log::*;

use crate::{
    auth::IdentityClaims,
    config::ServerOptions,
    data_objects::{NewOrderRequest, OrdersQuery, ReviewsQuery, WalletQuery},
    errors::ServerError,
    push::subscriber_stream,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Transitions  ----------------------------------------------------
route!(transition => Post "/transition" impl OrderFlowDatabase);
/// Route handler for status transitions.
///
/// Any authenticated role may call this. Whether *this* caller may make *this* change is decided by the order state
/// machine: the caller must be a party to the order, their role must be allowed to request the target status, and the
/// target must be reachable in one step from the current status.
///
/// On success the updated order is returned. Failures are 403 (not allowed), 404 (no such order) or 409 (the order
/// cannot make that move from where it is now).
pub async fn transition<B: OrderFlowDatabase>(
    claims: IdentityClaims,
    body: web::Json<TransitionRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let actor = claims.actor();
    let TransitionRequest { order_id, status } = body.into_inner();
    debug!("💻️ POST transition {order_id} -> {status} for {actor}");
    let order = api.transition(&order_id, status, &actor).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(my_orders => Get "/orders" impl OrderManagement);
/// Route handler for the caller's orders.
///
/// `state` selects `active` (the default) or `historical` orders. Customers see the orders they placed, vendors their
/// incoming orders and couriers the deliveries assigned to them. Clients whose push channel is down poll this
/// endpoint.
pub async fn my_orders<B: OrderManagement>(
    claims: IdentityClaims,
    query: web::Query<OrdersQuery>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let actor = claims.actor();
    let partition = query.partition();
    trace!("💻️ GET {partition} orders for {actor}");
    let orders = api.orders_for_actor(&actor, partition).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderManagement);
pub async fn order_by_id<B: OrderManagement>(
    claims: IdentityClaims,
    path: web::Path<OrderId>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET order {order_id} for {}", claims.user_id);
    let order = api.order_for_actor(&claims.actor(), &order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_history => Get "/orders/{order_id}/history" impl OrderManagement);
pub async fn order_history<B: OrderManagement>(
    claims: IdentityClaims,
    path: web::Path<OrderId>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET status history of {order_id} for {}", claims.user_id);
    let history = api.status_history(&claims.actor(), &order_id).await?;
    Ok(HttpResponse::Ok().json(history))
}

route!(place_order => Post "/orders" impl OrderFlowDatabase where requires [Role::Customer]);
/// Places a new order on behalf of the calling customer. Any `customer_id` in the body is ignored.
pub async fn place_order<B: OrderFlowDatabase>(
    claims: IdentityClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order = body.into_inner().into_new_order(&claims.user_id);
    debug!("💻️ POST new order {} from {} for {}", order.order_id, order.customer_id, order.vendor_id);
    let order = api.place_order(order).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(assign_courier => Post "/orders/{order_id}/courier" impl OrderFlowDatabase where requires [Role::Vendor]);
pub async fn assign_courier<B: OrderFlowDatabase>(
    claims: IdentityClaims,
    path: web::Path<OrderId>,
    body: web::Json<CourierAssignment>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let courier_id = body.into_inner().courier_id;
    debug!("💻️ POST assign {courier_id} to {order_id} by {}", claims.user_id);
    let order = api.assign_courier(&order_id, &courier_id, &claims.actor()).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Reviews  ----------------------------------------------------
route!(submit_review => Post "/review" impl OrderFlowDatabase where requires [Role::Customer]);
/// Leaves the single review a customer may write for a completed order.
///
/// 409 is returned if the order has not been completed yet, or has already been reviewed.
pub async fn submit_review<B: OrderFlowDatabase>(
    claims: IdentityClaims,
    body: web::Json<NewReview>,
    api: web::Data<ReviewApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let review = body.into_inner();
    debug!("💻️ POST review for {} by {}", review.order_id, claims.user_id);
    let review = api.submit_review(&claims.actor(), review).await?;
    Ok(HttpResponse::Created().json(review))
}

route!(vendor_reviews => Get "/reviews" impl OrderFlowDatabase where requires [Role::Vendor]);
pub async fn vendor_reviews<B: OrderFlowDatabase>(
    claims: IdentityClaims,
    query: web::Query<ReviewsQuery>,
    api: web::Data<ReviewApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET reviews for {} (complaints only: {})", claims.user_id, query.complaints_only);
    let reviews = api.reviews_for_vendor(&claims.actor(), query.complaints_only).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

//----------------------------------------------   Wallet  ----------------------------------------------------
route!(wallet => Get "/wallet" impl OrderFlowDatabase);
/// The caller's reward balance and their most recent ledger entries (10 by default, at most 100).
pub async fn wallet<B: OrderFlowDatabase>(
    claims: IdentityClaims,
    query: web::Query<WalletQuery>,
    api: web::Data<RewardsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET wallet for {}", claims.user_id);
    let summary = api.wallet_summary(&claims.user_id, query.limit()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

//----------------------------------------------   Push  ----------------------------------------------------
route!(subscribe => Get "/subscribe" impl OrderManagement);
/// Opens the caller's push channel as a `text/event-stream` response. See [`crate::push`].
pub async fn subscribe<B: OrderManagement>(
    claims: IdentityClaims,
    api: web::Data<AccountApi<B>>,
    transport: web::Data<BroadcastPushTransport>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let actor = claims.actor();
    // Subscribe first, so that nothing committed while the snapshot is being read is missed
    let receiver = transport.subscribe();
    let snapshot = api.orders_for_actor(&actor, OrderPartition::Active).await?;
    info!("💻️ {actor} opened a push channel. {} active orders in snapshot.", snapshot.orders.len());
    let stream = subscriber_stream(actor.user_id, receiver, snapshot.orders, options.push_heartbeat);
    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream))
}
