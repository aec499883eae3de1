// SPDX-License-Identifier: Apache-2.0

use crate::auth::require_user;
use crate::http::support::{
    finish, json_created, propagated_request_id, run_blocking, store_error, user_summary,
};
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Instant;
use tutorhub_api::dto::CreateChildLinkBody;
use tutorhub_api::params::{parse_students_params, require_user_id_param};
use tutorhub_api::ApiError;
use tutorhub_model::{Role, User, UserId};

pub(crate) async fn list_students_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| list_students(&state, &headers, &query)).await;
    finish(&state, "/v1/students", started, &request_id, result).await
}

fn list_students(
    state: &AppState,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    let params = parse_students_params(query)?;

    // Each role sees a different slice of the roster; the query params only
    // narrow within what the role could already see.
    let students = match user.role {
        Role::Admin => {
            if let Some(parent_id) = &params.parent_id {
                linked_children(state, parent_id)?
            } else if let Some(tutor_id) = &params.tutor_id {
                students_of_tutor(state, tutor_id)?
            } else {
                state.store.list_students(None).map_err(store_error)?
            }
        }
        Role::Tutor => students_of_tutor(state, &user.id)?,
        Role::Parent => linked_children(state, &user.id)?,
        Role::Student => state
            .store
            .list_students(Some(std::slice::from_ref(&user.id)))
            .map_err(store_error)?,
    };
    let rows: Vec<Value> = students.iter().map(user_summary).collect();
    Ok(Json(json!({"students": rows})).into_response())
}

fn students_of_tutor(state: &AppState, tutor_id: &UserId) -> Result<Vec<User>, ApiError> {
    let ids = state
        .store
        .student_ids_of_tutor(tutor_id)
        .map_err(store_error)?;
    state.store.list_students(Some(&ids)).map_err(store_error)
}

fn linked_children(state: &AppState, parent_id: &UserId) -> Result<Vec<User>, ApiError> {
    let ids = state
        .store
        .child_ids_of_parent(parent_id)
        .map_err(store_error)?;
    state.store.list_students(Some(&ids)).map_err(store_error)
}

pub(crate) async fn list_children_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| list_children(&state, &headers, &query)).await;
    finish(&state, "/v1/children", started, &request_id, result).await
}

fn list_children(
    state: &AppState,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    let parent_id = match user.role {
        Role::Parent => user.id.clone(),
        // Admins inspect a specific family.
        Role::Admin => require_user_id_param(query, "parent_id")?,
        _ => return Err(ApiError::forbidden("parent role required")),
    };
    let links = state.store.links_of_parent(&parent_id).map_err(store_error)?;
    let ids: Vec<UserId> = links.iter().map(|l| l.student_id.clone()).collect();
    let children = state.store.list_students(Some(&ids)).map_err(store_error)?;
    let rows: Vec<Value> = children
        .iter()
        .map(|child| {
            let mut wire = user_summary(child);
            if let Some(link) = links.iter().find(|l| l.student_id == child.id) {
                wire["relationship"] = json!(link.relationship);
                wire["isPrimary"] = json!(link.is_primary);
            }
            wire
        })
        .collect();
    Ok(Json(json!({"children": rows})).into_response())
}

pub(crate) async fn create_child_link_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateChildLinkBody>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| create_child_link(&state, &headers, body)).await;
    finish(&state, "/v1/children", started, &request_id, result).await
}

fn create_child_link(
    state: &AppState,
    headers: &HeaderMap,
    body: CreateChildLinkBody,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;

    // Parents link to themselves; an admin may link on behalf of any parent.
    let parent_id = match (&user.role, body.parent_id.as_deref()) {
        (Role::Parent, None) => user.id.clone(),
        (Role::Parent, Some(raw)) => {
            let id = UserId::parse(raw)
                .map_err(|_| ApiError::invalid_field("parentId", "malformed id"))?;
            if id != user.id {
                return Err(ApiError::forbidden("parents may only link their own children"));
            }
            id
        }
        (Role::Admin, Some(raw)) => {
            let id = UserId::parse(raw)
                .map_err(|_| ApiError::invalid_field("parentId", "malformed id"))?;
            let parent = state
                .store
                .get_user(&id)
                .map_err(store_error)?
                .ok_or_else(|| ApiError::not_found("parent"))?;
            if parent.role != Role::Parent {
                return Err(ApiError::invalid_field("parentId", "user is not a parent"));
            }
            id
        }
        (Role::Admin, None) => return Err(ApiError::missing_field("parentId")),
        _ => return Err(ApiError::forbidden("parent or admin role required")),
    };

    let student_raw = body
        .student_id
        .as_deref()
        .ok_or_else(|| ApiError::missing_field("studentId"))?;
    let student_id = UserId::parse(student_raw)
        .map_err(|_| ApiError::invalid_field("studentId", "malformed id"))?;
    let student = state
        .store
        .get_user(&student_id)
        .map_err(store_error)?
        .ok_or_else(|| ApiError::not_found("student"))?;
    if student.role != Role::Student {
        return Err(ApiError::invalid_field("studentId", "user is not a student"));
    }

    let link = state
        .store
        .add_parent_link(
            &parent_id,
            &student_id,
            body.relationship.as_deref(),
            body.is_primary,
        )
        .map_err(store_error)?;
    Ok(json_created(json!({"link": link})))
}
