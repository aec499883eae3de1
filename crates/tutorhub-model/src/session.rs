// SPDX-License-Identifier: Apache-2.0

use crate::{TimeOfDay, UserId, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Session lifecycle. Created as `Scheduled`; transitions are enforced
/// server-side (the upstream generic update endpoint accepted any string,
/// which is documented as a bug, not a contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl SessionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim() {
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ValidationError(format!("unknown session status: {other}"))),
        }
    }

    /// Allowed transition edges. `Cancelled -> Scheduled` is the reschedule
    /// path the booking UI exposes; `Completed` is terminal.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Self::Scheduled, Self::InProgress)
                | (Self::Scheduled, Self::Completed)
                | (Self::Scheduled, Self::Cancelled)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Cancelled)
                | (Self::Cancelled, Self::Scheduled)
        )
    }

    /// Cancelled sessions never block a tutor's calendar.
    #[must_use]
    pub const fn blocks_calendar(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled tutor-student meeting record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub tutor_id: UserId,
    pub student_id: UserId,
    /// Free-text subject name; not normalized to the subjects table
    /// upstream, kept that way here.
    pub subject: String,
    pub session_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub duration_minutes: u32,
    pub status: SessionStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Parent-student link row; gates a parent's visibility into the student's
/// sessions and progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentParentLink {
    pub id: String,
    pub parent_id: UserId,
    pub student_id: UserId,
    pub relationship: Option<String>,
    pub is_primary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table() {
        use SessionStatus::*;
        assert!(Scheduled.can_transition_to(InProgress));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Cancelled.can_transition_to(Scheduled));
        assert!(!Completed.can_transition_to(Scheduled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(InProgress));
        // self-transition is a no-op update, always allowed
        assert!(Completed.can_transition_to(Completed));
    }
}
