//! `POST /send-otp` and `POST /verify-otp`.
//!
//! Both accept `OPTIONS` (empty 200) and answer every other non-POST method
//! with 405. Bodies are parsed after the method check so a bad body on a GET
//! still reports 405.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::gateway::OtpService;
use crate::error::OtpError;

/// Shared state for the OTP routes.
#[derive(Clone)]
pub struct OtpRouteState {
    pub service: Arc<dyn OtpService>,
}

#[derive(Debug, Default, Deserialize)]
struct SendOtpRequest {
    #[serde(default)]
    phone: String,
}

#[derive(Debug, Default, Deserialize)]
struct VerifyOtpRequest {
    #[serde(default)]
    phone: String,
    #[serde(default)]
    code: String,
}

impl IntoResponse for OtpError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = match &self {
            OtpError::Rejected {
                status: provider_status,
            } => json!({
                "success": false,
                "status": provider_status,
                "error": self.to_string(),
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Parse a JSON body, falling back to the empty request. A body that is
/// present but malformed is logged so it can be told apart from a missing
/// field.
pub(crate) fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    if body.is_empty() {
        return T::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, len = body.len(), "Ignoring malformed request body");
        T::default()
    })
}

/// Method gate shared by both handlers. `None` means "go ahead, it's a POST".
fn method_gate(method: &Method) -> Option<Response> {
    if *method == Method::OPTIONS {
        return Some(StatusCode::OK.into_response());
    }
    if *method != Method::POST {
        return Some(
            (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(json!({ "error": "Method not allowed" })),
            )
                .into_response(),
        );
    }
    None
}

async fn send_otp(
    State(state): State<OtpRouteState>,
    method: Method,
    body: Bytes,
) -> Response {
    if let Some(resp) = method_gate(&method) {
        return resp;
    }
    let req: SendOtpRequest = parse_body(&body);

    match state.service.send_code(&req.phone).await {
        Ok(outcome) => Json(json!({
            "success": true,
            "status": outcome.status,
            "message": "Verification code sent!",
        }))
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn verify_otp(
    State(state): State<OtpRouteState>,
    method: Method,
    body: Bytes,
) -> Response {
    if let Some(resp) = method_gate(&method) {
        return resp;
    }
    let req: VerifyOtpRequest = parse_body(&body);

    match state.service.check_code(&req.phone, &req.code).await {
        Ok(_) => Json(json!({
            "success": true,
            "status": "approved",
            "message": "Phone number verified!",
        }))
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Build the OTP routes. Mounted under `/api` by the server.
pub fn otp_routes(state: OtpRouteState) -> Router {
    Router::new()
        .route("/send-otp", any(send_otp))
        .route("/verify-otp", any(verify_otp))
        .with_state(state)
}
