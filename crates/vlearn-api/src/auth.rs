//! Identity extraction seam.
//!
//! Verifying the bearer identity behind a `user_id` is an explicit
//! out-of-scope boundary surface (§1, §6): this extractor trusts an
//! already-authenticated `X-User-Id` header the way a real deployment's
//! `FromRequestParts` impl would inject a verified claim, without
//! re-implementing JWKS verification here.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;

use vlearn_models::UserId;

/// The caller's identity, trusted as already verified upstream of this
/// service (a gateway, sidecar, or load balancer terminating real auth).
pub struct AuthUser(pub UserId);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .ok_or((StatusCode::UNAUTHORIZED, "missing X-User-Id header"))?;

        Ok(AuthUser(UserId::from(header)))
    }
}
