// handlers/mod.rs - Two-tier handler layout
//
// Public (no credentials) → Protected (shared API key checked by
// middleware::auth before the handler runs).
pub mod params;
pub mod protected; // API key required: /patterns/*, /pattern-rank, /stock/:symbol
pub mod public; // Liveness: /health

use axum::response::IntoResponse;

use crate::error::ApiError;

/// JSON body for unmatched routes
pub async fn fallback() -> impl IntoResponse {
    ApiError::not_found("Not Found")
}
