//! Bearer token middleware.
//!
//! Wraps the authenticated scope. The `Authorization: Bearer <token>` header is verified with the server's
//! [`TokenIssuer`] and the resulting [`crate::auth::IdentityClaims`] are placed in the request extensions for the ACL
//! middleware and the handlers to pick up. Requests without a valid token never reach a handler.
use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::*;

use crate::{
    auth::TokenIssuer,
    config::ServerOptions,
    errors::{AuthError, ServerError},
    helpers::get_remote_ip,
};

pub struct BearerAuthMiddlewareFactory {
    issuer: TokenIssuer,
    options: ServerOptions,
}

impl BearerAuthMiddlewareFactory {
    pub fn new(issuer: TokenIssuer, options: ServerOptions) -> Self {
        Self { issuer, options }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = BearerAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(BearerAuthMiddlewareService {
            issuer: self.issuer.clone(),
            options: self.options,
            service: Rc::new(service),
        })
    }
}

pub struct BearerAuthMiddlewareService<S> {
    issuer: TokenIssuer,
    options: ServerOptions,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let claims = bearer_token(&req).and_then(|token| self.issuer.verify_token(token));
        let options = self.options;
        Box::pin(async move {
            match claims {
                Ok(claims) => {
                    trace!("🔐️ Authenticated {} as {}", claims.user_id, claims.role);
                    req.extensions_mut().insert(claims);
                    svc.call(req).await
                },
                Err(e) => {
                    let peer = get_remote_ip(req.request(), options.use_x_forwarded_for, options.use_forwarded)
                        .map(|ip| ip.to_string())
                        .unwrap_or_else(|| "unknown peer".to_string());
                    info!("🔐️ Rejected request to {} from {peer}. {e}", req.path());
                    Err(ServerError::AuthenticationError(e).into())
                },
            }
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Result<&str, AuthError> {
    let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = header
        .to_str()
        .map_err(|e| AuthError::PoorlyFormattedToken(format!("Authorization header is not valid text. {e}")))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected 'Authorization: Bearer <token>'".to_string()))
}
