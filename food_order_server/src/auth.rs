//! Bearer token identity.
//!
//! Tokens are `base64url(claims_json).base64url(hmac_sha256(claims_json))`. Logging users in is the job of an upstream
//! identity provider; this server only needs to mint tokens for it (and for tests) and to verify them on every request.
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use food_order_engine::db_types::{Actor, Role};
use fos_common::Secret;
use futures::future::{ready, Ready};
use hmac::{Hmac, Mac};
use log::*;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub user_id: String,
    pub role: Role,
    /// Expiry, as a unix timestamp in seconds
    pub exp: i64,
}

impl IdentityClaims {
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id.clone(), self.role)
    }

    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }
}

/// Handlers take `IdentityClaims` as an argument to get at the caller's identity. The claims are placed in the request
/// extensions by [`crate::middleware::BearerAuthMiddlewareFactory`], so any route outside the authenticated scope
/// will be rejected.
impl FromRequest for IdentityClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<IdentityClaims>().cloned().ok_or_else(|| {
            warn!("🔐️ No identity claims found in request extensions");
            ServerError::AuthenticationError(AuthError::MissingToken)
        });
        ready(claims)
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    secret: Secret<String>,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { secret: config.token_secret.clone(), lifetime: config.token_lifetime }
    }

    /// Issue a new bearer token for the given identity. The identity is NOT checked here; that is the job of whoever
    /// asks for the token.
    pub fn issue_token(&self, user_id: &str, role: Role, lifetime: Option<Duration>) -> Result<String, AuthError> {
        let exp = (Utc::now() + lifetime.unwrap_or(self.lifetime)).timestamp();
        let claims = IdentityClaims { user_id: user_id.to_string(), role, exp };
        self.sign(&claims)
    }

    /// Signs the claims exactly as given. `exp` is not adjusted.
    pub fn sign(&self, claims: &IdentityClaims) -> Result<String, AuthError> {
        let payload = serde_json::to_vec(claims).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let signature = self.mac(&payload)?.finalize().into_bytes();
        Ok(format!(
            "{}.{}",
            base64::encode_config(&payload, base64::URL_SAFE_NO_PAD),
            base64::encode_config(signature, base64::URL_SAFE_NO_PAD)
        ))
    }

    pub fn verify_token(&self, token: &str) -> Result<IdentityClaims, AuthError> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected <claims>.<signature>".to_string()))?;
        let payload = base64::decode_config(payload, base64::URL_SAFE_NO_PAD)
            .map_err(|e| AuthError::PoorlyFormattedToken(format!("Claims are not valid base64. {e}")))?;
        let signature = base64::decode_config(signature, base64::URL_SAFE_NO_PAD)
            .map_err(|e| AuthError::PoorlyFormattedToken(format!("Signature is not valid base64. {e}")))?;
        self.mac(&payload)?
            .verify_slice(&signature)
            .map_err(|_| AuthError::ValidationError("signature has failed verification".to_string()))?;
        let claims: IdentityClaims =
            serde_json::from_slice(&payload).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        if claims.is_expired() {
            debug!("🔐️ Token for {} expired at {}", claims.user_id, claims.exp);
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    fn mac(&self, payload: &[u8]) -> Result<HmacSha256, AuthError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.reveal().as_bytes())
            .map_err(|e| AuthError::ValidationError(format!("Invalid token secret. {e}")))?;
        mac.update(payload);
        Ok(mac)
    }
}
