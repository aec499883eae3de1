use crate::UserId;
use serde::{Deserialize, Serialize};

/// Default subject catalog installed when the table is empty; same list the
/// upstream served as a hard-coded mock.
pub const SUBJECT_SEED: [&str; 7] = [
    "Mathematics",
    "Physics",
    "Chemistry",
    "Biology",
    "English",
    "History",
    "Computer Science",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub level: Option<String>,
}

/// Join of a tutor and a subject they teach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorSubject {
    pub id: String,
    pub user_id: UserId,
    pub subject_id: String,
    pub proficiency_level: String,
    pub is_verified: bool,
}
