// SPDX-License-Identifier: Apache-2.0

use crate::{decode, Store, StoreError};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use tutorhub_model::{AvailabilityException, AvailabilityWindow, TimeOfDay, UserId, Weekday};

struct RawWindow {
    id: String,
    tutor_id: String,
    day: String,
    start_time: String,
    end_time: String,
    is_recurring: bool,
}

fn window_from_row(row: &Row<'_>) -> Result<RawWindow, rusqlite::Error> {
    Ok(RawWindow {
        id: row.get(0)?,
        tutor_id: row.get(1)?,
        day: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        is_recurring: row.get(5)?,
    })
}

fn finish_window(raw: RawWindow) -> Result<AvailabilityWindow, StoreError> {
    Ok(AvailabilityWindow {
        id: raw.id,
        tutor_id: decode::user_id(&raw.tutor_id)?,
        day: decode::weekday(&raw.day)?,
        start_time: decode::time(&raw.start_time)?,
        end_time: decode::time(&raw.end_time)?,
        is_recurring: raw.is_recurring,
    })
}

struct RawException {
    id: String,
    tutor_id: String,
    exception_date: String,
    is_available: bool,
    start_time: Option<String>,
    end_time: Option<String>,
    reason: Option<String>,
}

fn exception_from_row(row: &Row<'_>) -> Result<RawException, rusqlite::Error> {
    Ok(RawException {
        id: row.get(0)?,
        tutor_id: row.get(1)?,
        exception_date: row.get(2)?,
        is_available: row.get(3)?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
        reason: row.get(6)?,
    })
}

fn finish_exception(raw: RawException) -> Result<AvailabilityException, StoreError> {
    Ok(AvailabilityException {
        id: raw.id,
        tutor_id: decode::user_id(&raw.tutor_id)?,
        exception_date: decode::date(&raw.exception_date)?,
        is_available: raw.is_available,
        start_time: decode::opt_time(raw.start_time)?,
        end_time: decode::opt_time(raw.end_time)?,
        reason: raw.reason,
    })
}

impl Store {
    pub fn add_availability_window(
        &self,
        tutor_id: &UserId,
        day: Weekday,
        start_time: TimeOfDay,
        end_time: TimeOfDay,
        is_recurring: bool,
    ) -> Result<AvailabilityWindow, StoreError> {
        let conn = self.conn()?;
        let id = Self::new_id();
        conn.execute(
            "INSERT INTO tutor_availability
                 (id, tutor_id, day, start_time, end_time, is_recurring, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                tutor_id.as_str(),
                day.as_str(),
                start_time.to_string(),
                end_time.to_string(),
                is_recurring,
                Self::now_rfc3339(),
            ],
        )?;
        Ok(AvailabilityWindow {
            id,
            tutor_id: tutor_id.clone(),
            day,
            start_time,
            end_time,
            is_recurring,
        })
    }

    pub fn list_availability_windows(
        &self,
        tutor_id: &UserId,
    ) -> Result<Vec<AvailabilityWindow>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, tutor_id, day, start_time, end_time, is_recurring
             FROM tutor_availability WHERE tutor_id = ?1
             ORDER BY day, start_time",
        )?;
        let rows = stmt.query_map(params![tutor_id.as_str()], window_from_row)?;
        let mut out = Vec::new();
        for raw in rows {
            out.push(finish_window(raw?)?);
        }
        Ok(out)
    }

    /// Fetch one window by id; callers check ownership before deleting.
    pub fn get_availability_window(
        &self,
        id: &str,
    ) -> Result<Option<AvailabilityWindow>, StoreError> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                "SELECT id, tutor_id, day, start_time, end_time, is_recurring
                 FROM tutor_availability WHERE id = ?1",
                params![id],
                window_from_row,
            )
            .optional()?;
        raw.map(finish_window).transpose()
    }

    pub fn delete_availability_window(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let affected =
            conn.execute("DELETE FROM tutor_availability WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StoreError::not_found("availability window"));
        }
        Ok(())
    }

    pub fn add_availability_exception(
        &self,
        exception: &AvailabilityException,
    ) -> Result<AvailabilityException, StoreError> {
        let conn = self.conn()?;
        let id = Self::new_id();
        conn.execute(
            "INSERT INTO tutor_availability_exceptions
                 (id, tutor_id, exception_date, is_available, start_time, end_time,
                  reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                exception.tutor_id.as_str(),
                exception.exception_date.to_string(),
                exception.is_available,
                exception.start_time.map(|t| t.to_string()),
                exception.end_time.map(|t| t.to_string()),
                exception.reason,
                Self::now_rfc3339(),
            ],
        )?;
        Ok(AvailabilityException {
            id,
            ..exception.clone()
        })
    }

    pub fn exceptions_on(
        &self,
        tutor_id: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<AvailabilityException>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, tutor_id, exception_date, is_available, start_time, end_time, reason
             FROM tutor_availability_exceptions
             WHERE tutor_id = ?1 AND exception_date = ?2",
        )?;
        let rows = stmt.query_map(params![tutor_id.as_str(), date.to_string()], exception_from_row)?;
        let mut out = Vec::new();
        for raw in rows {
            out.push(finish_exception(raw?)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NewUser, StoreErrorCode};
    use tutorhub_model::Role;

    fn seed_tutor(store: &Store) -> UserId {
        store
            .create_user(NewUser {
                id: None,
                name: Some("Tutor".to_string()),
                full_name: None,
                email: None,
                role: Role::Tutor,
                token_identifier: "tok-tutor".to_string(),
            })
            .expect("tutor")
            .id
    }

    #[test]
    fn windows_round_trip_ordered() {
        let store = Store::open_in_memory().expect("open");
        let tutor = seed_tutor(&store);
        store
            .add_availability_window(
                &tutor,
                Weekday::Monday,
                TimeOfDay::parse("14:00").expect("t"),
                TimeOfDay::parse("17:00").expect("t"),
                true,
            )
            .expect("pm");
        store
            .add_availability_window(
                &tutor,
                Weekday::Monday,
                TimeOfDay::parse("09:00").expect("t"),
                TimeOfDay::parse("12:00").expect("t"),
                true,
            )
            .expect("am");
        let windows = store.list_availability_windows(&tutor).expect("list");
        assert_eq!(windows.len(), 2);
        assert!(windows[0].start_time < windows[1].start_time);
    }

    #[test]
    fn delete_missing_window_is_not_found() {
        let store = Store::open_in_memory().expect("open");
        let err = store
            .delete_availability_window("nope")
            .expect_err("missing");
        assert_eq!(err.code, StoreErrorCode::NotFound);
    }

    #[test]
    fn exceptions_filter_by_date() {
        let store = Store::open_in_memory().expect("open");
        let tutor = seed_tutor(&store);
        let date = NaiveDate::from_ymd_opt(2026, 9, 7).expect("date");
        store
            .add_availability_exception(&AvailabilityException {
                id: String::new(),
                tutor_id: tutor.clone(),
                exception_date: date,
                is_available: false,
                start_time: None,
                end_time: None,
                reason: Some("holiday".to_string()),
            })
            .expect("add");
        assert_eq!(store.exceptions_on(&tutor, date).expect("on").len(), 1);
        let other = NaiveDate::from_ymd_opt(2026, 9, 8).expect("date");
        assert!(store.exceptions_on(&tutor, other).expect("off").is_empty());
    }
}
