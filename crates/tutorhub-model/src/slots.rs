// SPDX-License-Identifier: Apache-2.0

//! Free-slot computation: recurring weekly windows minus date exceptions
//! minus booked sessions, walked in fixed increments.
//!
//! Pure over immutable inputs; all arithmetic is naive minutes past
//! midnight on a single date (no timezone model, per the upstream
//! contract).

use crate::{AvailabilityException, AvailabilityWindow, TimeOfDay, Weekday};
use chrono::NaiveDate;

/// Candidate slots start on half-hour boundaries relative to the window
/// start; same increment the upstream booking form used.
pub const SLOT_STEP_MINUTES: u32 = 30;

/// A booking that blocks tutor time. Cancelled sessions are excluded by the
/// caller (`SessionStatus::blocks_calendar`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedInterval {
    pub start: TimeOfDay,
    pub duration_minutes: u32,
}

impl BookedInterval {
    fn range(self) -> (u32, u32) {
        (
            u32::from(self.start.minutes()),
            self.start.end_minutes(self.duration_minutes),
        )
    }
}

fn overlaps(a: (u32, u32), b: (u32, u32)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

/// Computes free start times of `duration_minutes`-long slots for `date`.
///
/// Windows whose weekday does not match the date are ignored. A
/// `is_available = false` exception blocks its time range, or the whole day
/// when it carries no range; a `is_available = true` exception with a range
/// contributes an extra window. Results are sorted and deduplicated across
/// overlapping windows.
#[must_use]
pub fn free_slots(
    date: NaiveDate,
    windows: &[AvailabilityWindow],
    exceptions: &[AvailabilityException],
    booked: &[BookedInterval],
    duration_minutes: u32,
    step_minutes: u32,
) -> Vec<TimeOfDay> {
    if duration_minutes == 0 || step_minutes == 0 {
        return Vec::new();
    }
    let weekday = Weekday::of_date(date);

    let mut blocked: Vec<(u32, u32)> = booked.iter().map(|b| b.range()).collect();
    let mut extra_windows: Vec<(u32, u32)> = Vec::new();
    for ex in exceptions.iter().filter(|e| e.exception_date == date) {
        match (ex.is_available, ex.start_time, ex.end_time) {
            (false, Some(start), Some(end)) => {
                blocked.push((u32::from(start.minutes()), u32::from(end.minutes())));
            }
            (false, _, _) => return Vec::new(),
            (true, Some(start), Some(end)) => {
                extra_windows.push((u32::from(start.minutes()), u32::from(end.minutes())));
            }
            (true, _, _) => {}
        }
    }

    let mut open: Vec<(u32, u32)> = windows
        .iter()
        .filter(|w| w.day == weekday && w.is_well_formed())
        .map(|w| {
            (
                u32::from(w.start_time.minutes()),
                u32::from(w.end_time.minutes()),
            )
        })
        .collect();
    open.extend(extra_windows.into_iter().filter(|(s, e)| s < e));

    let mut out: Vec<TimeOfDay> = Vec::new();
    for (win_start, win_end) in open {
        let mut start = win_start;
        while start + duration_minutes <= win_end {
            let candidate = (start, start + duration_minutes);
            if !blocked.iter().any(|b| overlaps(candidate, *b)) {
                if let Ok(minutes) = u16::try_from(start) {
                    if let Some(t) = TimeOfDay::from_minutes(minutes) {
                        out.push(t);
                    }
                }
            }
            start += step_minutes;
        }
    }
    out.sort_unstable();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserId;

    fn tutor() -> UserId {
        UserId::parse("tutor-1").expect("id")
    }

    fn window(day: Weekday, start: &str, end: &str) -> AvailabilityWindow {
        AvailabilityWindow {
            id: format!("w-{day}-{start}"),
            tutor_id: tutor(),
            day,
            start_time: TimeOfDay::parse(start).expect("start"),
            end_time: TimeOfDay::parse(end).expect("end"),
            is_recurring: true,
        }
    }

    fn booked(start: &str, duration: u32) -> BookedInterval {
        BookedInterval {
            start: TimeOfDay::parse(start).expect("start"),
            duration_minutes: duration,
        }
    }

    // 2026-09-01 is a Tuesday.
    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 1).expect("date")
    }

    fn fmt(slots: &[TimeOfDay]) -> Vec<String> {
        slots.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn no_matching_weekday_yields_empty() {
        let windows = vec![window(Weekday::Monday, "09:00", "12:00")];
        let slots = free_slots(tuesday(), &windows, &[], &[], 60, SLOT_STEP_MINUTES);
        assert!(slots.is_empty());
    }

    #[test]
    fn walks_window_in_half_hour_steps() {
        let windows = vec![window(Weekday::Tuesday, "09:00", "11:00")];
        let slots = free_slots(tuesday(), &windows, &[], &[], 60, SLOT_STEP_MINUTES);
        assert_eq!(fmt(&slots), ["09:00", "09:30", "10:00"]);
    }

    #[test]
    fn booked_session_blocks_overlapping_increments() {
        let windows = vec![window(Weekday::Tuesday, "09:00", "12:00")];
        let taken = vec![booked("10:00", 60)];
        let slots = free_slots(tuesday(), &windows, &[], &taken, 60, SLOT_STEP_MINUTES);
        assert_eq!(fmt(&slots), ["09:00", "11:00"]);
    }

    #[test]
    fn full_day_exception_blocks_everything() {
        let windows = vec![window(Weekday::Tuesday, "09:00", "17:00")];
        let ex = AvailabilityException {
            id: "e1".to_string(),
            tutor_id: tutor(),
            exception_date: tuesday(),
            is_available: false,
            start_time: None,
            end_time: None,
            reason: Some("holiday".to_string()),
        };
        let slots = free_slots(tuesday(), &windows, &[ex], &[], 60, SLOT_STEP_MINUTES);
        assert!(slots.is_empty());
    }

    #[test]
    fn ranged_exception_blocks_only_its_range() {
        let windows = vec![window(Weekday::Tuesday, "09:00", "12:00")];
        let ex = AvailabilityException {
            id: "e1".to_string(),
            tutor_id: tutor(),
            exception_date: tuesday(),
            is_available: false,
            start_time: Some(TimeOfDay::parse("09:00").expect("t")),
            end_time: Some(TimeOfDay::parse("10:00").expect("t")),
            reason: None,
        };
        let slots = free_slots(tuesday(), &windows, &[ex], &[], 60, SLOT_STEP_MINUTES);
        assert_eq!(fmt(&slots), ["10:00", "10:30", "11:00"]);
    }

    #[test]
    fn available_exception_adds_one_off_window() {
        let windows = vec![window(Weekday::Monday, "09:00", "12:00")];
        let ex = AvailabilityException {
            id: "e1".to_string(),
            tutor_id: tutor(),
            exception_date: tuesday(),
            is_available: true,
            start_time: Some(TimeOfDay::parse("14:00").expect("t")),
            end_time: Some(TimeOfDay::parse("15:30").expect("t")),
            reason: None,
        };
        let slots = free_slots(tuesday(), &windows, &[ex], &[], 60, SLOT_STEP_MINUTES);
        assert_eq!(fmt(&slots), ["14:00", "14:30"]);
    }

    #[test]
    fn overlapping_windows_dedup() {
        let windows = vec![
            window(Weekday::Tuesday, "09:00", "11:00"),
            window(Weekday::Tuesday, "10:00", "12:00"),
        ];
        let slots = free_slots(tuesday(), &windows, &[], &[], 60, SLOT_STEP_MINUTES);
        assert_eq!(fmt(&slots), ["09:00", "09:30", "10:00", "10:30", "11:00"]);
    }

    #[test]
    fn inverted_window_contributes_nothing() {
        let windows = vec![window(Weekday::Tuesday, "12:00", "09:00")];
        let slots = free_slots(tuesday(), &windows, &[], &[], 60, SLOT_STEP_MINUTES);
        assert!(slots.is_empty());
    }

    #[test]
    fn exceptions_for_other_dates_are_ignored() {
        let windows = vec![window(Weekday::Tuesday, "09:00", "10:30")];
        let ex = AvailabilityException {
            id: "e1".to_string(),
            tutor_id: tutor(),
            exception_date: NaiveDate::from_ymd_opt(2026, 9, 8).expect("date"),
            is_available: false,
            start_time: None,
            end_time: None,
            reason: None,
        };
        let slots = free_slots(tuesday(), &windows, &[ex], &[], 60, SLOT_STEP_MINUTES);
        assert_eq!(fmt(&slots), ["09:00", "09:30"]);
    }
}
