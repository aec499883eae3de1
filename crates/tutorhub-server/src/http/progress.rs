// SPDX-License-Identifier: Apache-2.0

use crate::auth::require_user;
use crate::http::support::{finish, json_created, propagated_request_id, run_blocking, store_error};
use crate::policy::can_access_student;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Instant;
use tutorhub_api::dto::CreateProgressBody;
use tutorhub_api::params::parse_progress_params;
use tutorhub_api::ApiError;
use tutorhub_model::{ProgressRecord, Role, UserId};

/// Placeholder trend line served until enough real assessments accumulate,
/// mirroring the upstream dashboard's canned chart.
const MOCK_CHART_SCORES: [i64; 6] = [65, 70, 75, 72, 80, 85];
const CHART_LABELS: [&str; 6] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];

pub(crate) async fn get_progress_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| get_progress(&state, &headers, &query)).await;
    finish(&state, "/v1/progress", started, &request_id, result).await
}

fn get_progress(
    state: &AppState,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    let params = parse_progress_params(query)?;

    let student_id = match params.student_id {
        Some(id) => id,
        None if user.role == Role::Student => user.id.clone(),
        None => return Err(ApiError::missing_param("student_id")),
    };
    can_access_student(state, &user, &student_id)?;

    let subject_id = resolve_subject_filter(state, params.subject.as_deref())?;
    let records = state
        .store
        .progress_of_student(&student_id, subject_id.as_deref())
        .map_err(store_error)?;
    let achievements = state
        .store
        .achievements_of_student(&student_id)
        .map_err(store_error)?;

    let achievements_wire = if achievements.is_empty() {
        mock_achievements()
    } else {
        serde_json::to_value(&achievements).map_err(|_| ApiError::internal())?
    };

    Ok(Json(json!({
        "progress": {
            "studentId": student_id,
            "timeframe": params.timeframe,
            "records": records,
            "summary": summary(&records),
            "chartData": chart_data(&records),
            "achievements": achievements_wire,
        }
    }))
    .into_response())
}

/// The GET filter takes a subject display name; fall back to treating it as
/// a raw subject id so dashboard deep links keep working.
fn resolve_subject_filter(
    state: &AppState,
    subject: Option<&str>,
) -> Result<Option<String>, ApiError> {
    let Some(subject) = subject else {
        return Ok(None);
    };
    match state.store.find_subject_by_name(subject).map_err(store_error)? {
        Some(found) => Ok(Some(found.id)),
        None => Ok(Some(subject.to_string())),
    }
}

fn summary(records: &[ProgressRecord]) -> Value {
    let percentages: Vec<i64> = records.iter().filter_map(ProgressRecord::percentage).collect();
    let average = if percentages.is_empty() {
        0
    } else {
        percentages.iter().sum::<i64>() / percentages.len() as i64
    };
    json!({
        "averageScore": average,
        "completedTasks": records.len(),
    })
}

fn chart_data(records: &[ProgressRecord]) -> Value {
    // Records arrive newest first; the chart reads left to right.
    let mut scores: Vec<i64> = records
        .iter()
        .rev()
        .filter_map(ProgressRecord::percentage)
        .collect();
    if scores.is_empty() {
        scores = MOCK_CHART_SCORES.to_vec();
    }
    let labels: Vec<&str> = CHART_LABELS.iter().copied().cycle().take(scores.len()).collect();
    json!({"labels": labels, "scores": scores})
}

fn mock_achievements() -> Value {
    json!([
        {
            "id": "mock-first-session",
            "title": "First Session Completed",
            "description": "Completed your first tutoring session",
            "category": "milestone",
            "icon": "star",
        },
        {
            "id": "mock-quiz-streak",
            "title": "Quiz Streak",
            "description": "Completed three quizzes in a row",
            "category": "practice",
            "icon": "flame",
        },
    ])
}

pub(crate) async fn create_progress_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateProgressBody>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| create_progress(&state, &headers, body)).await;
    finish(&state, "/v1/progress", started, &request_id, result).await
}

fn create_progress(
    state: &AppState,
    headers: &HeaderMap,
    body: CreateProgressBody,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    if user.role != Role::Tutor && user.role != Role::Admin {
        return Err(ApiError::forbidden("tutor or admin role required"));
    }

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
    // Tutors may only record progress for students they actually teach.
    can_access_student(state, &user, &student_id)?;

    let subject_id = body
        .subject_id
        .as_deref()
        .ok_or_else(|| ApiError::missing_field("subjectId"))?;
    state
        .store
        .get_subject(subject_id)
        .map_err(store_error)?
        .ok_or_else(|| ApiError::not_found("subject"))?;
    let assessment_type = body
        .assessment_type
        .as_deref()
        .ok_or_else(|| ApiError::missing_field("assessmentType"))?;
    let score = body.score.ok_or_else(|| ApiError::missing_field("score"))?;
    let max_score = body
        .max_score
        .ok_or_else(|| ApiError::missing_field("maxScore"))?;
    if max_score <= 0 || score < 0 || score > max_score {
        return Err(ApiError::invalid_field(
            "score",
            "score must be between 0 and maxScore",
        ));
    }
    let completed_at = body
        .completed_at
        .as_deref()
        .map(|raw| {
            raw.parse::<DateTime<Utc>>()
                .map_err(|_| ApiError::invalid_field("completedAt", "expected RFC 3339"))
        })
        .transpose()?;

    let record = state
        .store
        .add_progress_record(
            &student_id,
            subject_id,
            assessment_type,
            score,
            max_score,
            completed_at,
        )
        .map_err(store_error)?;
    Ok(json_created(json!({"record": record})))
}
