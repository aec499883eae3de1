use crate::{TimeOfDay, UserId, Weekday};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Recurring weekly window during which a tutor accepts bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: String,
    pub tutor_id: UserId,
    pub day: Weekday,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub is_recurring: bool,
}

impl AvailabilityWindow {
    /// Inverted or empty windows contribute no bookable time.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.start_time < self.end_time
    }
}

/// Date-specific override of the recurring windows. `is_available = false`
/// blocks the date (or just the given time range); `is_available = true`
/// opens an extra one-off window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityException {
    pub id: String,
    pub tutor_id: UserId,
    pub exception_date: NaiveDate,
    pub is_available: bool,
    pub start_time: Option<TimeOfDay>,
    pub end_time: Option<TimeOfDay>,
    pub reason: Option<String>,
}
