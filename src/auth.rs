use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::api::error::ApiError;
use crate::controller::AppState;

/// Placeholder written into shipped config files; startup refuses it
pub const TOKEN_PLACEHOLDER_PREFIX: &str = "__SET_VIA_ENV";

/// Operator bearer token, required on every route that can switch the grid.
///
/// Extracting this from a request checks `Authorization: Bearer <token>`
/// against `auth.token`.
#[derive(Debug, Clone, Copy)]
pub struct AuthBearer;

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthBearer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(ApiError::Unauthorized)?;

        if tokens_match(presented, &state.cfg.auth.token) {
            Ok(AuthBearer)
        } else {
            tracing::warn!(path = %parts.uri.path(), "rejected request with invalid bearer token");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Token usable in a running deployment
pub fn is_usable_token(token: &str) -> bool {
    !token.trim().is_empty() && !token.starts_with(TOKEN_PLACEHOLDER_PREFIX)
}

// length-independent comparison over the expected token
fn tokens_match(presented: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    let a = presented.as_bytes();
    let b = expected.as_bytes();
    let mut diff = a.len() ^ b.len();
    for (i, byte) in b.iter().enumerate() {
        diff |= usize::from(a.get(i).copied().unwrap_or(0) ^ byte);
    }
    diff == 0
}
