use crate::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Append-only assessment record entered by a tutor or admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub id: String,
    pub student_id: UserId,
    pub subject_id: String,
    pub assessment_type: String,
    pub score: i64,
    pub max_score: i64,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Percentage score, `None` when `max_score` is zero or negative.
    #[must_use]
    pub fn percentage(&self) -> Option<i64> {
        if self.max_score <= 0 {
            return None;
        }
        Some(self.score * 100 / self.max_score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub requirements: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentAchievement {
    pub id: String,
    pub student_id: UserId,
    pub achievement_id: String,
    pub earned_at: Option<DateTime<Utc>>,
}
