//! REST endpoints for driving a quiz session.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::engine::QuizEngine;
use super::record::LeadRecord;
use super::session::{PhonePhase, QuizSession};
use super::step::QuizStep;
use super::validation::Field;
use crate::error::{DispatchError, QuizError};
use crate::otp::phone::format_phone_display;
use crate::otp::routes::parse_body;
use crate::variant::AbVariant;

/// Shared state for quiz routes.
#[derive(Clone)]
pub struct QuizRouteState {
    pub engine: Arc<QuizEngine>,
}

/// What the page needs to render the current step.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub step: QuizStep,
    pub step_index: usize,
    pub progress: u8,
    pub title: String,
    /// Input placeholder for free-text steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    pub phone_phase: PhonePhase,
    /// "Code sent to: (540) 123-4567" while awaiting a code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_display: Option<String>,
    pub variant: Option<AbVariant>,
    pub show_before_after_image: bool,
    pub complete: bool,
    pub record: LeadRecord,
}

impl From<&QuizSession> for SessionView {
    fn from(session: &QuizSession) -> Self {
        let name = Some(session.record.name.as_str());
        let placeholder = match (session.step, &session.phone_phase) {
            (QuizStep::Name, _) => Some(Field::Name.default_placeholder()),
            (QuizStep::City, _) => Some(Field::City.default_placeholder()),
            (QuizStep::Zip, _) => Some(Field::Zip.default_placeholder()),
            (QuizStep::Email, _) => Some(Field::Email.default_placeholder()),
            (QuizStep::Phone, PhonePhase::EnteringPhone) => Some(Field::Phone.default_placeholder()),
            (QuizStep::Phone, PhonePhase::AwaitingCode { .. }) => {
                Some(Field::Code.default_placeholder())
            }
            _ => None,
        };
        let phone_display = match &session.phone_phase {
            PhonePhase::AwaitingCode { phone } if session.step == QuizStep::Phone => {
                Some(format!("Code sent to: {}", format_phone_display(phone)))
            }
            _ => None,
        };
        let variant = session.variant();

        Self {
            id: session.id,
            step: session.step,
            step_index: session.step.index(),
            progress: session.step.progress(),
            title: session.step.title(name),
            placeholder,
            phone_phase: session.phone_phase.clone(),
            phone_display,
            variant,
            show_before_after_image: variant.is_some_and(|v| v.shows_before_after_image()),
            complete: session.step.is_terminal(),
            record: session.record.clone(),
        }
    }
}

impl IntoResponse for QuizError {
    fn into_response(self) -> Response {
        match self {
            QuizError::Otp(e) => e.into_response(),
            QuizError::Validation(v) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": v.placeholder,
                    "field": v.field,
                    "placeholder": v.placeholder,
                })),
            )
                .into_response(),
            QuizError::Refused(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": message })),
            )
                .into_response(),
            QuizError::Dispatch(DispatchError::Incomplete { missing }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "Please fill out all fields before submitting.",
                    "missing": missing,
                })),
            )
                .into_response(),
            QuizError::Dispatch(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response(),
            e @ (QuizError::InvalidAction { .. } | QuizError::AlreadySubmitting) => (
                StatusCode::CONFLICT,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response(),
            e @ QuizError::SessionNotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response(),
        }
    }
}

fn parse_id(id: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(id).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid session ID" })),
        )
            .into_response()
    })
}

fn respond(result: Result<QuizSession, QuizError>) -> Response {
    match result {
        Ok(session) => Json(SessionView::from(&session)).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Default, Deserialize)]
struct StartRequest {
    #[serde(default)]
    variant: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AnswerRequest {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct PhoneRequest {
    #[serde(default)]
    phone: String,
}

#[derive(Debug, Default, Deserialize)]
struct CodeRequest {
    #[serde(default)]
    code: String,
}

/// POST /api/quiz
async fn start_quiz(State(state): State<QuizRouteState>, body: Bytes) -> Response {
    let req: StartRequest = parse_body(&body);
    let session = state.engine.start(req.variant.as_deref()).await;
    (StatusCode::CREATED, Json(SessionView::from(&session))).into_response()
}

/// GET /api/quiz/{id}
async fn get_quiz(State(state): State<QuizRouteState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(state.engine.get(id).await)
}

/// POST /api/quiz/{id}/answer
async fn answer(
    State(state): State<QuizRouteState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let req: AnswerRequest = parse_body(&body);
    respond(state.engine.answer(id, &req.value).await)
}

/// POST /api/quiz/{id}/send-code
async fn send_code(
    State(state): State<QuizRouteState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let req: PhoneRequest = parse_body(&body);
    respond(state.engine.send_code(id, &req.phone).await)
}

/// POST /api/quiz/{id}/resend-code
async fn resend_code(State(state): State<QuizRouteState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(state.engine.resend_code(id).await)
}

/// POST /api/quiz/{id}/verify-code
async fn verify_code(
    State(state): State<QuizRouteState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let req: CodeRequest = parse_body(&body);
    respond(state.engine.verify_code(id, &req.code).await)
}

/// POST /api/quiz/{id}/change-phone
async fn change_phone(State(state): State<QuizRouteState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(state.engine.change_phone(id).await)
}

/// Build the quiz REST routes.
pub fn quiz_routes(state: QuizRouteState) -> Router {
    Router::new()
        .route("/api/quiz", post(start_quiz))
        .route("/api/quiz/{id}", get(get_quiz))
        .route("/api/quiz/{id}/answer", post(answer))
        .route("/api/quiz/{id}/send-code", post(send_code))
        .route("/api/quiz/{id}/resend-code", post(resend_code))
        .route("/api/quiz/{id}/verify-code", post(verify_code))
        .route("/api/quiz/{id}/change-phone", post(change_phone))
        .with_state(state)
}
