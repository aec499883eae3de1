// SPDX-License-Identifier: Apache-2.0

//! Request bodies. Field names stay camelCase on the wire; defaults mirror
//! the booking form (60-minute sessions, 5-question quizzes, both question
//! types on).

use serde::Deserialize;
use serde_json::Value;

fn default_duration() -> u32 {
    60
}

fn default_question_count() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionBody {
    pub subject: Option<String>,
    pub tutor_id: Option<String>,
    pub session_date: Option<String>,
    pub start_time: Option<String>,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionBody {
    pub subject: Option<String>,
    pub session_date: Option<String>,
    pub start_time: Option<String>,
    pub duration: Option<u32>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAvailabilityBody {
    pub day_of_week: Option<Value>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default = "default_true")]
    pub is_recurring: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExceptionBody {
    pub exception_date: Option<String>,
    #[serde(default)]
    pub is_available: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileBody {
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

impl UpdateProfileBody {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.full_name.is_none() && self.email.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChildLinkBody {
    pub student_id: Option<String>,
    /// Admins may link on behalf of a parent; parents link for themselves.
    pub parent_id: Option<String>,
    pub relationship: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProgressBody {
    pub student_id: Option<String>,
    pub subject_id: Option<String>,
    pub assessment_type: Option<String>,
    pub score: Option<i64>,
    pub max_score: Option<i64>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizBody {
    pub subject: Option<String>,
    pub topic: Option<String>,
    #[serde(default = "default_question_count")]
    pub question_count: u32,
    #[serde(default = "default_true")]
    pub include_multiple_choice: bool,
    #[serde(default = "default_true")]
    pub include_short_answer: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTeachingPlanBody {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub student_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRecommendationsBody {
    pub subject: Option<String>,
    pub student_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttemptBody {
    pub answers: Option<Value>,
    pub score: Option<i64>,
    pub max_score: Option<i64>,
    #[serde(default)]
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_body_defaults_duration() {
        let body: CreateSessionBody = serde_json::from_str(
            r#"{"subject":"Mathematics","tutorId":"t1","sessionDate":"2026-09-07","startTime":"10:00"}"#,
        )
        .expect("parse");
        assert_eq!(body.duration, 60);
        assert_eq!(body.tutor_id.as_deref(), Some("t1"));
    }

    #[test]
    fn quiz_body_defaults() {
        let body: GenerateQuizBody =
            serde_json::from_str(r#"{"subject":"Mathematics","topic":"Algebra"}"#).expect("parse");
        assert_eq!(body.question_count, 5);
        assert!(body.include_multiple_choice);
        assert!(body.include_short_answer);
    }
}
