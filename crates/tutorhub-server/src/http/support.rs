// SPDX-License-Identifier: Apache-2.0

use crate::telemetry::make_request_id;
use crate::AppState;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::time::Instant;
use tutorhub_api::{map_error, ApiError};
use tutorhub_model::{Session, User};
use tutorhub_store::{StoreError, StoreErrorCode};

/// The store is synchronous rusqlite; run its work on the blocking pool so
/// a slow query or an exhausted connection pool never parks a runtime
/// worker.
pub(crate) async fn run_blocking<F>(state: &AppState, work: F) -> Result<Response, ApiError>
where
    F: FnOnce(AppState) -> Result<Response, ApiError> + Send + 'static,
{
    let state = state.clone();
    match tokio::task::spawn_blocking(move || work(state)).await {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(error = %err, "blocking handler task failed");
            Err(ApiError::internal())
        }
    }
}

pub(crate) fn api_error_response(err: &ApiError) -> Response {
    let status = StatusCode::from_u16(map_error(err).status_code)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"error": err}))).into_response()
}

/// Store failures cross into the API as coarse codes; details stay in the
/// log to avoid leaking SQL text to clients.
pub(crate) fn store_error(err: StoreError) -> ApiError {
    match err.code {
        StoreErrorCode::NotFound => ApiError::not_found("resource"),
        StoreErrorCode::Conflict => ApiError::booking_conflict(),
        StoreErrorCode::Constraint => {
            ApiError::new(tutorhub_api::ApiErrorCode::ValidationFailed, err.message, json!({}))
        }
        _ => {
            tracing::error!(error = %err, "store operation failed");
            ApiError::internal()
        }
    }
}

pub(crate) fn propagated_request_id(headers: &HeaderMap, state: &AppState) -> String {
    if let Some(raw) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    make_request_id(state)
}

pub(crate) fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(v) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert("x-request-id", v);
    }
    response
}

/// Tail shared by every handler: map errors to the wire shape, record the
/// route metric off the final status, stamp the request id.
pub(crate) async fn finish(
    state: &AppState,
    route: &'static str,
    started: Instant,
    request_id: &str,
    result: Result<Response, ApiError>,
) -> Response {
    let response = match result {
        Ok(response) => response,
        Err(err) => api_error_response(&err),
    };
    state
        .metrics
        .observe_request(route, response.status(), started.elapsed())
        .await;
    with_request_id(response, request_id)
}

pub(crate) fn json_created(payload: Value) -> Response {
    (StatusCode::CREATED, Json(payload)).into_response()
}

pub(crate) fn user_summary(user: &User) -> Value {
    json!({
        "id": user.id,
        "name": user.name,
        "full_name": user.full_name,
        "email": user.email,
        "role": user.role,
    })
}

/// Session rows embed tutor/student summaries, matching the upstream
/// `tutor:tutor_id(...)` join shape.
pub(crate) fn session_wire(state: &AppState, session: &Session) -> Result<Value, ApiError> {
    let tutor = state.store.get_user(&session.tutor_id).map_err(store_error)?;
    let student = state
        .store
        .get_user(&session.student_id)
        .map_err(store_error)?;
    let mut wire = serde_json::to_value(session).map_err(|_| ApiError::internal())?;
    wire["tutor"] = tutor.as_ref().map(user_summary).unwrap_or(Value::Null);
    wire["student"] = student.as_ref().map(user_summary).unwrap_or(Value::Null);
    Ok(wire)
}

pub(crate) fn sessions_wire(state: &AppState, sessions: &[Session]) -> Result<Value, ApiError> {
    let mut rows = Vec::with_capacity(sessions.len());
    for session in sessions {
        rows.push(session_wire(state, session)?);
    }
    Ok(Value::Array(rows))
}
