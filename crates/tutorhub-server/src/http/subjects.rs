// SPDX-License-Identifier: Apache-2.0

use crate::auth::require_user;
use crate::http::support::{finish, json_created, propagated_request_id, run_blocking, store_error};
use crate::policy::require_admin;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::time::Instant;
use tutorhub_api::dto::SubjectBody;
use tutorhub_api::ApiError;
use tutorhub_model::Subject;

pub(crate) async fn list_subjects_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| list_subjects(&state, &headers)).await;
    finish(&state, "/v1/subjects", started, &request_id, result).await
}

fn list_subjects(state: &AppState, headers: &HeaderMap) -> Result<Response, ApiError> {
    require_user(state, headers)?;
    let subjects = state.store.list_subjects().map_err(store_error)?;
    Ok(Json(json!({"subjects": subjects})).into_response())
}

pub(crate) async fn create_subject_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SubjectBody>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| create_subject(&state, &headers, body)).await;
    finish(&state, "/v1/subjects", started, &request_id, result).await
}

fn create_subject(
    state: &AppState,
    headers: &HeaderMap,
    body: SubjectBody,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    require_admin(&user)?;
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::missing_field("name"))?;
    let subject = state
        .store
        .create_subject(name, body.description.as_deref(), body.level.as_deref())
        .map_err(store_error)?;
    Ok(json_created(json!({"subject": subject})))
}

pub(crate) async fn get_subject_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| get_subject(&state, &headers, &id)).await;
    finish(&state, "/v1/subjects/{id}", started, &request_id, result).await
}

fn get_subject(state: &AppState, headers: &HeaderMap, id: &str) -> Result<Response, ApiError> {
    require_user(state, headers)?;
    let subject = fetch_subject(state, id)?;
    Ok(Json(json!({"subject": subject})).into_response())
}

pub(crate) async fn update_subject_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<SubjectBody>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| update_subject(&state, &headers, &id, body)).await;
    finish(&state, "/v1/subjects/{id}", started, &request_id, result).await
}

fn update_subject(
    state: &AppState,
    headers: &HeaderMap,
    id: &str,
    body: SubjectBody,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    require_admin(&user)?;
    // Name is required on update even when unchanged; the catalog is
    // keyed by it.
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::missing_field("name"))?;
    fetch_subject(state, id)?;
    let subject = state
        .store
        .update_subject(id, name, body.description.as_deref(), body.level.as_deref())
        .map_err(store_error)?;
    Ok(Json(json!({"subject": subject})).into_response())
}

pub(crate) async fn delete_subject_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| delete_subject(&state, &headers, &id)).await;
    finish(&state, "/v1/subjects/{id}", started, &request_id, result).await
}

fn delete_subject(state: &AppState, headers: &HeaderMap, id: &str) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    require_admin(&user)?;
    fetch_subject(state, id)?;
    state.store.delete_subject(id).map_err(store_error)?;
    Ok(Json(json!({"success": true})).into_response())
}

fn fetch_subject(state: &AppState, id: &str) -> Result<Subject, ApiError> {
    state
        .store
        .get_subject(id)
        .map_err(store_error)?
        .ok_or_else(|| ApiError::not_found("subject"))
}
