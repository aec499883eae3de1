#![forbid(unsafe_code)]
//! Tutorhub domain model SSOT.
//!
//! Every identifier arriving over the wire goes through a `parse`
//! constructor here; handlers and stores never work with raw strings for
//! roles, statuses, weekdays, or times of day.

mod availability;
mod content;
mod progress;
mod session;
mod slots;
mod subject;
mod time;
mod user;

pub use availability::{AvailabilityException, AvailabilityWindow};
pub use content::{
    LearningRecommendation, Quiz, QuizAttempt, QuizQuestion, QuizQuestionOption, TeachingPlan,
};
pub use progress::{Achievement, ProgressRecord, StudentAchievement};
pub use session::{Session, SessionStatus, StudentParentLink};
pub use slots::{free_slots, BookedInterval, SLOT_STEP_MINUTES};
pub use subject::{Subject, TutorSubject, SUBJECT_SEED};
pub use time::{TimeOfDay, Weekday};
pub use user::{Role, User, UserId, USER_ID_MAX_LEN};

pub const CRATE_NAME: &str = "tutorhub-model";

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}
