//! Docstamp API Server
//!
//! Provides REST endpoints for:
//! - PDF upload (`POST /api/pdf/upload`, multipart field `pdfFile`)
//! - Signature stamping (`POST /api/pdf/add-signature`)
//! - Serving stored documents (`GET /uploads/<file>`)

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use config::ApiConfig;
pub use error::ApiError;
pub use state::AppState;

/// Build the router for a prepared state
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        // Health check
        .route("/api/health", get(handlers::health))
        // Document endpoints
        .route("/api/pdf/upload", post(handlers::upload_pdf))
        .route("/api/pdf/add-signature", post(handlers::add_signature))
        // Stored documents
        .nest_service("/uploads", uploads)
        // Add middleware
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
