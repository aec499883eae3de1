// SPDX-License-Identifier: Apache-2.0

//! Mock content generators. The upstream product called an LLM here; this
//! build serves deterministic placeholder content but persists the rows the
//! same way, so the rest of the system is exercised end to end.

use crate::auth::require_user;
use crate::genai;
use crate::http::support::{finish, json_created, propagated_request_id, run_blocking, store_error};
use crate::policy::can_access_student;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::time::Instant;
use tutorhub_api::dto::{
    GenerateQuizBody, GenerateRecommendationsBody, GenerateTeachingPlanBody, QuizAttemptBody,
};
use tutorhub_api::ApiError;
use tutorhub_model::{Subject, UserId};

const DEFAULT_STUDENT_LEVEL: &str = "intermediate";
const MAX_QUIZ_QUESTIONS: u32 = 20;

pub(crate) async fn generate_quiz_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GenerateQuizBody>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| generate_quiz(&state, &headers, body)).await;
    finish(&state, "/v1/ai/quiz", started, &request_id, result).await
}

fn generate_quiz(
    state: &AppState,
    headers: &HeaderMap,
    body: GenerateQuizBody,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    let subject = require_subject(state, body.subject.as_deref())?;
    let topic = body
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::missing_field("topic"))?;
    if !body.include_multiple_choice && !body.include_short_answer {
        return Err(ApiError::invalid_field(
            "includeMultipleChoice",
            "at least one question type must be enabled",
        ));
    }
    if body.question_count == 0 || body.question_count > MAX_QUIZ_QUESTIONS {
        return Err(ApiError::invalid_field(
            "questionCount",
            "must be between 1 and 20",
        ));
    }

    let questions = genai::generate_quiz_questions(
        topic,
        body.question_count,
        body.include_multiple_choice,
        body.include_short_answer,
    );
    let title = format!("{topic} Quiz");
    let quiz = state
        .store
        .insert_quiz(&title, &subject.id, &questions, &user.id, true)
        .map_err(store_error)?;
    tracing::info!(quiz_id = %quiz.id, question_count = questions.len(), "generated quiz");
    Ok(Json(json!({"quiz": quiz})).into_response())
}

pub(crate) async fn generate_teaching_plan_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GenerateTeachingPlanBody>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| generate_teaching_plan(&state, &headers, body)).await;
    finish(&state, "/v1/ai/teaching-plan", started, &request_id, result).await
}

fn generate_teaching_plan(
    state: &AppState,
    headers: &HeaderMap,
    body: GenerateTeachingPlanBody,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    let subject = require_subject(state, body.subject.as_deref())?;
    let topic = body
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::missing_field("topic"))?;
    let student_level = body
        .student_level
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_STUDENT_LEVEL);

    let content = genai::teaching_plan_markdown(topic);
    let title = format!("{topic} - Teaching Plan");
    let plan = state
        .store
        .insert_teaching_plan(&title, &subject.id, &content, Some(student_level), &user.id, true)
        .map_err(store_error)?;
    Ok(Json(json!({
        "plan": {
            "id": plan.id,
            "title": plan.title,
            "subject": subject.name,
            "content": plan.content,
            "studentLevel": plan.student_level,
            "aiGenerated": plan.ai_generated,
            "createdAt": plan.created_at,
        }
    }))
    .into_response())
}

pub(crate) async fn generate_recommendations_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GenerateRecommendationsBody>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| generate_recommendations(&state, &headers, body)).await;
    finish(&state, "/v1/ai/recommendations", started, &request_id, result).await
}

fn generate_recommendations(
    state: &AppState,
    headers: &HeaderMap,
    body: GenerateRecommendationsBody,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    let subject = require_subject(state, body.subject.as_deref())?;

    let student_id = match body.student_id.as_deref() {
        Some(raw) => {
            let id = UserId::parse(raw)
                .map_err(|_| ApiError::invalid_field("studentId", "malformed id"))?;
            can_access_student(state, &user, &id)?;
            id
        }
        None => user.id.clone(),
    };

    let batch = genai::generate_recommendations(&student_id, &subject.id);
    let stored = state
        .store
        .insert_recommendations(&batch)
        .map_err(store_error)?;
    Ok(Json(json!({"recommendations": stored})).into_response())
}

pub(crate) async fn quiz_attempt_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<QuizAttemptBody>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let result = run_blocking(&state, move |state| record_quiz_attempt(&state, &headers, &id, body)).await;
    finish(&state, "/v1/quizzes/{id}/attempts", started, &request_id, result).await
}

fn record_quiz_attempt(
    state: &AppState,
    headers: &HeaderMap,
    quiz_id: &str,
    body: QuizAttemptBody,
) -> Result<Response, ApiError> {
    let user = require_user(state, headers)?;
    state
        .store
        .get_quiz(quiz_id)
        .map_err(store_error)?
        .ok_or_else(|| ApiError::not_found("quiz"))?;
    let answers = body
        .answers
        .as_ref()
        .ok_or_else(|| ApiError::missing_field("answers"))?;
    if let (Some(score), Some(max_score)) = (body.score, body.max_score) {
        if max_score <= 0 || score < 0 || score > max_score {
            return Err(ApiError::invalid_field(
                "score",
                "score must be between 0 and maxScore",
            ));
        }
    }
    let attempt = state
        .store
        .record_quiz_attempt(
            quiz_id,
            &user.id,
            answers,
            body.score,
            body.max_score,
            body.completed,
        )
        .map_err(store_error)?;
    Ok(json_created(json!({"attempt": attempt})))
}

fn require_subject(state: &AppState, raw: Option<&str>) -> Result<Subject, ApiError> {
    let name = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::missing_field("subject"))?;
    state
        .store
        .find_subject_by_name(name)
        .map_err(store_error)?
        .ok_or_else(|| ApiError::invalid_field("subject", "unknown subject"))
}
