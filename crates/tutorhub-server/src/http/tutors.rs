// SPDX-License-Identifier: Apache-2.0

use crate::auth::require_user;
use crate::http::support::{
    finish, json_created, propagated_request_id, run_blocking, store_error, user_summary,
};
use crate::policy::require_tutor;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Instant;
use tutorhub_api::dto::{CreateAvailabilityBody, CreateExceptionBody, UpdateProfileBody};
use tutorhub_api::params::{parse_slots_params, require_user_id_param};
use tutorhub_api::ApiError;
use tutorhub_model::{
    free_slots, AvailabilityException, Role, TimeOfDay, User, UserId, Weekday,
};
use tutorhub_store::UserProfileUpdate;

pub(crate) async fn list_tutors_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| list_tutors(&state, &headers, &query)).await;
    finish(&state, "/v1/tutors", started, &request_id, result).await
}

fn list_tutors(
    state: &AppState,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Result<Response, ApiError> {
    require_user(state, headers)?;
    let subject = query.get("subject").map(String::as_str);
    let tutors = state.store.list_tutors(subject).map_err(store_error)?;
    let mut rows = Vec::with_capacity(tutors.len());
    for tutor in &tutors {
        rows.push(tutor_wire(state, tutor)?);
    }
    Ok(Json(json!({"tutors": rows})).into_response())
}

pub(crate) async fn get_tutor_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| get_tutor(&state, &headers, &id)).await;
    finish(&state, "/v1/tutors/{id}", started, &request_id, result).await
}

fn get_tutor(state: &AppState, headers: &HeaderMap, id: &str) -> Result<Response, ApiError> {
    require_user(state, headers)?;
    let tutor_id = parse_tutor_id(id)?;
    let (tutor, subjects) = state
        .store
        .get_tutor(&tutor_id)
        .map_err(store_error)?
        .ok_or_else(|| ApiError::not_found("tutor"))?;
    let mut wire = user_summary(&tutor);
    wire["subjects"] = serde_json::to_value(&subjects).map_err(|_| ApiError::internal())?;
    Ok(Json(json!({"tutor": wire})).into_response())
}

pub(crate) async fn update_tutor_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateProfileBody>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| update_tutor(&state, &headers, &id, body)).await;
    finish(&state, "/v1/tutors/{id}", started, &request_id, result).await
}

fn update_tutor(
    state: &AppState,
    headers: &HeaderMap,
    id: &str,
    body: UpdateProfileBody,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    let tutor_id = parse_tutor_id(id)?;
    if user.role != Role::Admin && user.id != tutor_id {
        return Err(ApiError::forbidden("admin or the tutor themselves required"));
    }
    if body.is_empty() {
        return Err(ApiError::invalid_field("body", "no updatable fields present"));
    }
    // 404 before update when the target is not a tutor.
    state
        .store
        .get_tutor(&tutor_id)
        .map_err(store_error)?
        .ok_or_else(|| ApiError::not_found("tutor"))?;
    let updated = state
        .store
        .update_user_profile(
            &tutor_id,
            &UserProfileUpdate {
                name: body.name,
                full_name: body.full_name,
                email: body.email,
            },
        )
        .map_err(store_error)?;
    Ok(Json(json!({"tutor": tutor_wire(state, &updated)?})).into_response())
}

pub(crate) async fn availability_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| get_availability(&state, &headers, &query)).await;
    finish(&state, "/v1/tutors/availability", started, &request_id, result).await
}

fn get_availability(
    state: &AppState,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Result<Response, ApiError> {
    require_user(state, headers)?;
    let tutor_id = require_user_id_param(query, "tutor_id")?;
    let windows = state
        .store
        .list_availability_windows(&tutor_id)
        .map_err(store_error)?;
    let today = chrono::Utc::now().date_naive();
    let booked = state
        .store
        .upcoming_sessions(&tutor_id, today)
        .map_err(store_error)?;
    let booked_rows: Vec<Value> = booked
        .iter()
        .map(|s| {
            json!({
                "session_date": s.session_date,
                "start_time": s.start_time,
                "duration": s.duration_minutes,
            })
        })
        .collect();
    Ok(Json(json!({"availability": windows, "bookedSessions": booked_rows})).into_response())
}

pub(crate) async fn create_availability_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateAvailabilityBody>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| create_availability(&state, &headers, body)).await;
    finish(&state, "/v1/tutors/availability", started, &request_id, result).await
}

fn create_availability(
    state: &AppState,
    headers: &HeaderMap,
    body: CreateAvailabilityBody,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    require_tutor(&user)?;

    let day = parse_day_of_week(body.day_of_week.as_ref())?;
    let start_time = parse_body_time(body.start_time.as_deref(), "startTime")?;
    let end_time = parse_body_time(body.end_time.as_deref(), "endTime")?;
    if start_time >= end_time {
        return Err(ApiError::invalid_field("endTime", "must be after startTime"));
    }
    let window = state
        .store
        .add_availability_window(&user.id, day, start_time, end_time, body.is_recurring)
        .map_err(store_error)?;
    Ok(json_created(json!({"availability": window})))
}

pub(crate) async fn delete_availability_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| delete_availability(&state, &headers, &id)).await;
    finish(
        &state,
        "/v1/tutors/availability/{id}",
        started,
        &request_id,
        result,
    )
    .await
}

fn delete_availability(
    state: &AppState,
    headers: &HeaderMap,
    id: &str,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    let window = state
        .store
        .get_availability_window(id)
        .map_err(store_error)?
        .ok_or_else(|| ApiError::not_found("availability window"))?;
    if user.role != Role::Admin && user.id != window.tutor_id {
        return Err(ApiError::forbidden("owning tutor or admin required"));
    }
    state.store.delete_availability_window(id).map_err(store_error)?;
    Ok(Json(json!({"success": true})).into_response())
}

pub(crate) async fn create_exception_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateExceptionBody>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| create_exception(&state, &headers, body)).await;
    finish(
        &state,
        "/v1/tutors/availability/exceptions",
        started,
        &request_id,
        result,
    )
    .await
}

fn create_exception(
    state: &AppState,
    headers: &HeaderMap,
    body: CreateExceptionBody,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    require_tutor(&user)?;

    let date_raw = body
        .exception_date
        .as_deref()
        .ok_or_else(|| ApiError::missing_field("exceptionDate"))?;
    let exception_date = date_raw
        .parse::<NaiveDate>()
        .map_err(|_| ApiError::invalid_field("exceptionDate", "expected YYYY-MM-DD"))?;
    let start_time = body
        .start_time
        .as_deref()
        .map(|raw| parse_body_time(Some(raw), "startTime"))
        .transpose()?;
    let end_time = body
        .end_time
        .as_deref()
        .map(|raw| parse_body_time(Some(raw), "endTime"))
        .transpose()?;
    if let (Some(start), Some(end)) = (start_time, end_time) {
        if start >= end {
            return Err(ApiError::invalid_field("endTime", "must be after startTime"));
        }
    }
    // A range needs both bounds.
    if start_time.is_some() != end_time.is_some() {
        return Err(ApiError::invalid_field(
            "startTime",
            "startTime and endTime must be given together",
        ));
    }
    let exception = state
        .store
        .add_availability_exception(&AvailabilityException {
            id: String::new(),
            tutor_id: user.id,
            exception_date,
            is_available: body.is_available,
            start_time,
            end_time,
            reason: body.reason,
        })
        .map_err(store_error)?;
    Ok(json_created(json!({"exception": exception})))
}

pub(crate) async fn slots_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| get_slots(&state, &headers, &id, &query)).await;
    finish(&state, "/v1/tutors/{id}/slots", started, &request_id, result).await
}

fn get_slots(
    state: &AppState,
    headers: &HeaderMap,
    id: &str,
    query: &HashMap<String, String>,
) -> Result<Response, ApiError> {
    require_user(state, headers)?;
    let tutor_id = parse_tutor_id(id)?;
    state
        .store
        .get_tutor(&tutor_id)
        .map_err(store_error)?
        .ok_or_else(|| ApiError::not_found("tutor"))?;
    let params = parse_slots_params(query)?;

    let windows = state
        .store
        .list_availability_windows(&tutor_id)
        .map_err(store_error)?;
    let exceptions = state
        .store
        .exceptions_on(&tutor_id, params.date)
        .map_err(store_error)?;
    let booked = state
        .store
        .booked_on(&tutor_id, params.date)
        .map_err(store_error)?;
    let slots = free_slots(
        params.date,
        &windows,
        &exceptions,
        &booked,
        params.duration_minutes,
        params.step_minutes,
    );
    Ok(Json(json!({
        "date": params.date,
        "durationMinutes": params.duration_minutes,
        "slots": slots,
    }))
    .into_response())
}

fn tutor_wire(state: &AppState, tutor: &User) -> Result<Value, ApiError> {
    let subjects = state.store.tutor_subjects(&tutor.id).map_err(store_error)?;
    let mut wire = user_summary(tutor);
    wire["subjects"] = serde_json::to_value(&subjects).map_err(|_| ApiError::internal())?;
    Ok(wire)
}

fn parse_tutor_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::parse(raw).map_err(|_| ApiError::not_found("tutor"))
}

/// The upstream form posted `dayOfWeek` as either a 0-6 number or a day
/// name; both are accepted.
fn parse_day_of_week(raw: Option<&Value>) -> Result<Weekday, ApiError> {
    let value = raw.ok_or_else(|| ApiError::missing_field("dayOfWeek"))?;
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return Err(ApiError::invalid_field("dayOfWeek", "expected number or name")),
    };
    Weekday::parse(&text).map_err(|_| ApiError::invalid_field("dayOfWeek", "unknown day"))
}

fn parse_body_time(raw: Option<&str>, field: &str) -> Result<TimeOfDay, ApiError> {
    let raw = raw.ok_or_else(|| ApiError::missing_field(field))?;
    TimeOfDay::parse(raw).map_err(|_| ApiError::invalid_field(field, "expected HH:MM"))
}
