//! HTTP surface: health check, OTP gateway and quiz API behind one router.

use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::ServerConfig;
use crate::otp::{OtpRouteState, OtpService, otp_routes};
use crate::quiz::{QuizEngine, QuizRouteState, quiz_routes};

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": "lead-funnel" }))
}

fn cors(config: &ServerConfig) -> CorsLayer {
    let origin = match config
        .allowed_origin
        .as_deref()
        .and_then(|o| HeaderValue::from_str(o).ok())
    {
        Some(origin) => AllowOrigin::exact(origin),
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Assemble the full application router.
pub fn build_router(
    otp: Arc<dyn OtpService>,
    engine: Arc<QuizEngine>,
    config: &ServerConfig,
) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", otp_routes(OtpRouteState { service: otp }))
        .merge(quiz_routes(QuizRouteState { engine }))
        .layer(cors(config))
}
