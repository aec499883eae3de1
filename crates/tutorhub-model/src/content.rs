// SPDX-License-Identifier: Apache-2.0

use crate::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestionOption {
    pub id: String,
    pub text: String,
}

/// One quiz question; the wire shape keeps the upstream camelCase keys and
/// `type` discriminator so stored quizzes replay byte-compatible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuizQuestion {
    #[serde(rename = "multiple-choice")]
    MultipleChoice {
        id: String,
        text: String,
        options: Vec<QuizQuestionOption>,
        #[serde(rename = "correctAnswer")]
        correct_answer: String,
    },
    #[serde(rename = "short-answer")]
    ShortAnswer {
        id: String,
        text: String,
        #[serde(rename = "sampleAnswer")]
        sample_answer: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub subject_id: String,
    pub questions: Vec<QuizQuestion>,
    pub created_by: UserId,
    pub ai_generated: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: String,
    pub quiz_id: String,
    pub student_id: UserId,
    pub answers: Value,
    pub score: Option<i64>,
    pub max_score: Option<i64>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeachingPlan {
    pub id: String,
    pub title: String,
    pub subject_id: String,
    pub content: String,
    pub student_level: Option<String>,
    pub created_by: UserId,
    pub ai_generated: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningRecommendation {
    pub id: String,
    pub student_id: UserId,
    pub subject_id: String,
    pub title: String,
    pub resource_type: String,
    pub resource_url: Option<String>,
    pub description: Option<String>,
    pub viewed: bool,
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_question_wire_shape() {
        let q = QuizQuestion::MultipleChoice {
            id: "mc-0".to_string(),
            text: "Sample".to_string(),
            options: vec![QuizQuestionOption {
                id: "a".to_string(),
                text: "Answer option A".to_string(),
            }],
            correct_answer: "b".to_string(),
        };
        let v = serde_json::to_value(&q).expect("serialize");
        assert_eq!(v["type"], "multiple-choice");
        assert_eq!(v["correctAnswer"], "b");

        let s = QuizQuestion::ShortAnswer {
            id: "sa-0".to_string(),
            text: "Sample".to_string(),
            sample_answer: "Because".to_string(),
        };
        let v = serde_json::to_value(&s).expect("serialize");
        assert_eq!(v["type"], "short-answer");
        assert_eq!(v["sampleAnswer"], "Because");
    }
}
