use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::AppState;

/// Returned for every rejected request, whatever the route or query
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized access: Invalid API key";

/// Shared-secret gate placed in front of every data route.
///
/// A plain byte comparison against a single configured key: no per-client
/// credentials and no constant-time check.
pub async fn api_key_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    check_api_key(request.headers(), &state.config.security)?;
    Ok(next.run(request).await)
}

pub fn check_api_key(headers: &HeaderMap, security: &SecurityConfig) -> Result<(), ApiError> {
    let presented = headers.get(security.api_key_header.as_str());
    match presented {
        Some(value) if value.as_bytes() == security.api_key.as_bytes() => Ok(()),
        Some(_) => {
            tracing::warn!("Rejected request: {} header does not match", security.api_key_header);
            Err(ApiError::unauthorized(UNAUTHORIZED_MESSAGE))
        }
        None => {
            tracing::warn!("Rejected request: missing {} header", security.api_key_header);
            Err(ApiError::unauthorized(UNAUTHORIZED_MESSAGE))
        }
    }
}
