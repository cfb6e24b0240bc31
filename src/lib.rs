pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;

use std::any::Any;
use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as CorsAny, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig};
use crate::database::PatternStore;
use crate::error::ApiError;

/// Shared state handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PatternStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: impl PatternStore + 'static, config: AppConfig) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }
}

/// Builds the full router: public probe, key-gated data routes, JSON
/// fallbacks for unknown routes and panics.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/health", get(handlers::public::health_get))
        // Protected
        .merge(protected_routes(state.clone()))
        .fallback(handlers::fallback)
        .with_state(state)
        // Global middleware
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::protected;

    Router::new()
        .route("/patterns/latest", get(protected::patterns_latest))
        .route("/patterns/search", get(protected::patterns_search))
        .route("/pattern-rank", get(protected::pattern_rank_list))
        .route("/stock/:symbol", get(protected::stock_get))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::api_key_middleware,
        ))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(CorsAny)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", detail);
    ApiError::internal_server_error(format!("Internal Server Error: {}", detail)).into_response()
}
