// SPDX-License-Identifier: Apache-2.0

use crate::auth::require_user;
use crate::http::support::{
    finish, json_created, propagated_request_id, run_blocking, session_wire, sessions_wire,
    store_error,
};
use crate::policy::can_access_session;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde_json::json;
use std::collections::HashMap;
use std::time::Instant;
use tutorhub_api::dto::{CreateSessionBody, UpdateSessionBody};
use tutorhub_api::params::parse_session_list_params;
use tutorhub_api::ApiError;
use tutorhub_model::{Role, Session, SessionStatus, TimeOfDay, UserId};
use tutorhub_store::{NewSession, SessionFilter, SessionUpdate};

const MINUTES_PER_DAY: u32 = 24 * 60;

pub(crate) async fn list_sessions_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| list_sessions(&state, &headers, &query)).await;
    finish(&state, "/v1/sessions", started, &request_id, result).await
}

fn list_sessions(
    state: &AppState,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    let params = parse_session_list_params(query)?;
    let mut filter = SessionFilter {
        status: params.status,
        from: params.from,
        to: params.to,
        ..SessionFilter::default()
    };
    match user.role {
        Role::Student => filter.student_id = Some(user.id.clone()),
        Role::Tutor => filter.tutor_id = Some(user.id.clone()),
        Role::Parent => {
            filter.student_ids =
                Some(state.store.child_ids_of_parent(&user.id).map_err(store_error)?);
        }
        Role::Admin => {}
    }
    let sessions = state.store.list_sessions(&filter).map_err(store_error)?;
    Ok(Json(json!({"sessions": sessions_wire(state, &sessions)?})).into_response())
}

pub(crate) async fn create_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateSessionBody>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| create_session(&state, &headers, body)).await;
    finish(&state, "/v1/sessions", started, &request_id, result).await
}

fn create_session(
    state: &AppState,
    headers: &HeaderMap,
    body: CreateSessionBody,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;

    let subject_raw = body
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::missing_field("subject"))?;
    let subject = state
        .store
        .find_subject_by_name(subject_raw)
        .map_err(store_error)?
        .ok_or_else(|| ApiError::invalid_field("subject", "unknown subject"))?;

    let tutor_raw = body
        .tutor_id
        .as_deref()
        .ok_or_else(|| ApiError::missing_field("tutorId"))?;
    let tutor_id = UserId::parse(tutor_raw)
        .map_err(|_| ApiError::invalid_field("tutorId", "malformed id"))?;
    let tutor = state
        .store
        .get_user(&tutor_id)
        .map_err(store_error)?
        .ok_or_else(|| ApiError::invalid_field("tutorId", "unknown tutor"))?;
    if tutor.role != Role::Tutor {
        return Err(ApiError::invalid_field("tutorId", "user is not a tutor"));
    }

    let date_raw = body
        .session_date
        .as_deref()
        .ok_or_else(|| ApiError::missing_field("sessionDate"))?;
    let session_date = date_raw
        .parse::<NaiveDate>()
        .map_err(|_| ApiError::invalid_field("sessionDate", "expected YYYY-MM-DD"))?;

    let time_raw = body
        .start_time
        .as_deref()
        .ok_or_else(|| ApiError::missing_field("startTime"))?;
    let start_time = TimeOfDay::parse(time_raw)
        .map_err(|_| ApiError::invalid_field("startTime", "expected HH:MM"))?;

    if body.duration == 0 {
        return Err(ApiError::invalid_field("duration", "must be positive"));
    }
    if start_time.end_minutes(body.duration) > MINUTES_PER_DAY {
        return Err(ApiError::invalid_field("duration", "session runs past midnight"));
    }

    // The caller is always the student on this endpoint.
    let session = state
        .store
        .create_session(NewSession {
            tutor_id,
            student_id: user.id,
            subject: subject.name,
            session_date,
            start_time,
            duration_minutes: body.duration,
            notes: body.notes,
        })
        .map_err(store_error)?;
    tracing::info!(session_id = %session.id, "session booked");
    Ok(json_created(json!({"session": session_wire(state, &session)?})))
}

pub(crate) async fn get_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| get_session(&state, &headers, &id)).await;
    finish(&state, "/v1/sessions/{id}", started, &request_id, result).await
}

fn get_session(state: &AppState, headers: &HeaderMap, id: &str) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    let session = fetch_session(state, id)?;
    can_access_session(state, &user, &session)?;
    Ok(Json(json!({"session": session_wire(state, &session)?})).into_response())
}

pub(crate) async fn update_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateSessionBody>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| update_session(&state, &headers, &id, body)).await;
    finish(&state, "/v1/sessions/{id}", started, &request_id, result).await
}

fn update_session(
    state: &AppState,
    headers: &HeaderMap,
    id: &str,
    body: UpdateSessionBody,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    let session = fetch_session(state, id)?;
    can_access_session(state, &user, &session)?;

    let mut update = SessionUpdate::default();
    if let Some(subject_raw) = body.subject.as_deref() {
        let subject = state
            .store
            .find_subject_by_name(subject_raw)
            .map_err(store_error)?
            .ok_or_else(|| ApiError::invalid_field("subject", "unknown subject"))?;
        update.subject = Some(subject.name);
    }
    if let Some(raw) = body.session_date.as_deref() {
        update.session_date = Some(
            raw.parse::<NaiveDate>()
                .map_err(|_| ApiError::invalid_field("sessionDate", "expected YYYY-MM-DD"))?,
        );
    }
    if let Some(raw) = body.start_time.as_deref() {
        update.start_time = Some(
            TimeOfDay::parse(raw)
                .map_err(|_| ApiError::invalid_field("startTime", "expected HH:MM"))?,
        );
    }
    if let Some(duration) = body.duration {
        if duration == 0 {
            return Err(ApiError::invalid_field("duration", "must be positive"));
        }
        update.duration_minutes = Some(duration);
    }
    if let Some(raw) = body.status.as_deref() {
        let next = SessionStatus::parse(raw)
            .map_err(|_| ApiError::invalid_field("status", "unknown status"))?;
        if !session.status.can_transition_to(next) {
            return Err(ApiError::invalid_status_transition(
                session.status.as_str(),
                next.as_str(),
            ));
        }
        update.status = Some(next);
    }
    update.notes = body.notes;

    let start = update.start_time.unwrap_or(session.start_time);
    let duration = update.duration_minutes.unwrap_or(session.duration_minutes);
    if start.end_minutes(duration) > MINUTES_PER_DAY {
        return Err(ApiError::invalid_field("duration", "session runs past midnight"));
    }

    let updated = state.store.update_session(id, &update).map_err(store_error)?;
    Ok(Json(json!({"session": session_wire(state, &updated)?})).into_response())
}

pub(crate) async fn delete_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| delete_session(&state, &headers, &id)).await;
    finish(&state, "/v1/sessions/{id}", started, &request_id, result).await
}

fn delete_session(state: &AppState, headers: &HeaderMap, id: &str) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    let session = fetch_session(state, id)?;
    can_access_session(state, &user, &session)?;
    state.store.delete_session(id).map_err(store_error)?;
    Ok(Json(json!({"success": true})).into_response())
}

fn fetch_session(state: &AppState, id: &str) -> Result<Session, ApiError> {
    state
        .store
        .get_session(id)
        .map_err(store_error)?
        .ok_or_else(|| ApiError::not_found("session"))
}
