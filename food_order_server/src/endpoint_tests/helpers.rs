use std::pin::Pin;

use actix_web::{
    body::{to_bytes, BoxBody, MessageBody},
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
    HttpResponse,
};
use chrono::Duration;
use food_order_engine::db_types::Role;
use futures::future::poll_fn;
use log::debug;

use crate::{
    auth::TokenIssuer,
    config::{AuthConfig, ServerOptions},
    errors::{json_error_handler, query_error_handler},
    middleware::BearerAuthMiddlewareFactory,
};

// DO NOT re-use this secret anywhere.
const TEST_SECRET: &str = "endpoint-tests-only-secret-0123456789abcdef";

pub fn issuer() -> TokenIssuer {
    TokenIssuer::new(&AuthConfig::new(TEST_SECRET, Duration::hours(1)))
}

pub fn token_for(user_id: &str, role: Role) -> String {
    issuer().issue_token(user_id, role, None).expect("Failed to sign token")
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

async fn respond<F>(req: TestRequest, configure: F) -> HttpResponse<BoxBody>
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new()
        .wrap(BearerAuthMiddlewareFactory::new(issuer(), ServerOptions::default()))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::Data::new(ServerOptions::default()))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.map_into_boxed_body().into_parts().1,
        Err(e) => e.error_response(),
    }
}

/// Sends the request and collects the full response body.
pub async fn send<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let res = respond(req, configure).await;
    let status = res.status();
    let body = to_bytes(res.into_body()).await.expect("Failed to read body");
    (status, String::from_utf8_lossy(&body).into_owned())
}

/// Sends the request and reads the first `n` chunks of a streaming response.
pub async fn send_and_read_chunks<F>(req: TestRequest, configure: F, n: usize) -> (StatusCode, Vec<String>)
where F: FnOnce(&mut ServiceConfig) {
    let res = respond(req, configure).await;
    let status = res.status();
    let mut body = res.into_body();
    let mut chunks = Vec::with_capacity(n);
    for _ in 0..n {
        match poll_fn(|cx| Pin::new(&mut body).poll_next(cx)).await {
            Some(Ok(bytes)) => chunks.push(String::from_utf8_lossy(&bytes).into_owned()),
            _ => break,
        }
    }
    (status, chunks)
}

pub fn error_message(body: &str) -> String {
    let json: serde_json::Value = serde_json::from_str(body).expect("Error body was not JSON");
    json["error"].as_str().expect("No error field").to_string()
}
