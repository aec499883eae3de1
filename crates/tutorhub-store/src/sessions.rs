// SPDX-License-Identifier: Apache-2.0

//! Session rows and the transactional booking path. The overlap check and
//! the insert run inside one `BEGIN IMMEDIATE` transaction so two racing
//! bookings for the same tutor cannot both commit.

use crate::{decode, Store, StoreError};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use tutorhub_model::{BookedInterval, Session, SessionStatus, TimeOfDay, UserId};

const SESSION_COLUMNS: &str = "id, tutor_id, student_id, subject, session_date, start_time, \
                               duration, status, notes, created_at, updated_at";

fn session_from_row(row: &Row<'_>) -> Result<RawSession, rusqlite::Error> {
    Ok(RawSession {
        id: row.get(0)?,
        tutor_id: row.get(1)?,
        student_id: row.get(2)?,
        subject: row.get(3)?,
        session_date: row.get(4)?,
        start_time: row.get(5)?,
        duration: row.get(6)?,
        status: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

struct RawSession {
    id: String,
    tutor_id: String,
    student_id: String,
    subject: String,
    session_date: String,
    start_time: String,
    duration: i64,
    status: String,
    notes: Option<String>,
    created_at: String,
    updated_at: Option<String>,
}

fn finish_session(raw: RawSession) -> Result<Session, StoreError> {
    Ok(Session {
        id: raw.id,
        tutor_id: decode::user_id(&raw.tutor_id)?,
        student_id: decode::user_id(&raw.student_id)?,
        subject: raw.subject,
        session_date: decode::date(&raw.session_date)?,
        start_time: decode::time(&raw.start_time)?,
        duration_minutes: u32::try_from(raw.duration)
            .map_err(|_| decode::bad_row("duration", &raw.duration.to_string()))?,
        status: decode::status(&raw.status)?,
        notes: raw.notes,
        created_at: decode::datetime(&raw.created_at)?,
        updated_at: decode::opt_datetime(raw.updated_at)?,
    })
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub tutor_id: UserId,
    pub student_id: UserId,
    pub subject: String,
    pub session_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub duration_minutes: u32,
    pub notes: Option<String>,
}

/// Role scoping plus the query-string filters of the list endpoint. `None`
/// fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub tutor_id: Option<UserId>,
    pub student_id: Option<UserId>,
    /// Parent scope: sessions of any of these students.
    pub student_ids: Option<Vec<UserId>>,
    pub status: Option<SessionStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Whitelisted PATCH fields. Status transitions are validated by the
/// caller against the current row before this is applied.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub subject: Option<String>,
    pub session_date: Option<NaiveDate>,
    pub start_time: Option<TimeOfDay>,
    pub duration_minutes: Option<u32>,
    pub status: Option<SessionStatus>,
    pub notes: Option<String>,
}

impl SessionUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.session_date.is_none()
            && self.start_time.is_none()
            && self.duration_minutes.is_none()
            && self.status.is_none()
            && self.notes.is_none()
    }
}

/// Counts non-cancelled sessions for `tutor_id` on `date` overlapping the
/// `[start, start + duration)` interval, excluding `exclude_id` (used when
/// rescheduling an existing session).
fn overlap_count(
    conn: &Connection,
    tutor_id: &UserId,
    date: NaiveDate,
    start: TimeOfDay,
    duration_minutes: u32,
    exclude_id: Option<&str>,
) -> Result<i64, StoreError> {
    let new_start = i64::from(start.minutes());
    let new_end = i64::from(start.end_minutes(duration_minutes));
    // start_time is zero-padded HH:MM, so the lexicographic split into
    // hours/minutes below is safe; arithmetic happens in SQL minutes.
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sessions
         WHERE tutor_id = ?1 AND session_date = ?2 AND status != 'cancelled'
           AND id != ?3
           AND (CAST(substr(start_time, 1, 2) AS INTEGER) * 60
                + CAST(substr(start_time, 4, 2) AS INTEGER)) < ?4
           AND (CAST(substr(start_time, 1, 2) AS INTEGER) * 60
                + CAST(substr(start_time, 4, 2) AS INTEGER) + duration) > ?5",
        params![
            tutor_id.as_str(),
            date.to_string(),
            exclude_id.unwrap_or(""),
            new_end,
            new_start,
        ],
        |row| row.get(0),
    )?;
    Ok(count)
}

impl Store {
    /// Books a session. Fails with a `Conflict` error when the tutor
    /// already has a non-cancelled session overlapping the requested
    /// interval; the check and insert share one immediate transaction.
    pub fn create_session(&self, new: NewSession) -> Result<Session, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        if overlap_count(
            &tx,
            &new.tutor_id,
            new.session_date,
            new.start_time,
            new.duration_minutes,
            None,
        )? > 0
        {
            return Err(StoreError::conflict(
                "tutor already has a session in this time slot",
            ));
        }
        let id = Self::new_id();
        let created_at = Self::now_rfc3339();
        tx.execute(
            "INSERT INTO sessions
                 (id, tutor_id, student_id, subject, session_date, start_time,
                  duration, status, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                new.tutor_id.as_str(),
                new.student_id.as_str(),
                new.subject,
                new.session_date.to_string(),
                new.start_time.to_string(),
                new.duration_minutes,
                SessionStatus::Scheduled.as_str(),
                new.notes,
                created_at,
            ],
        )?;
        // Read back on the same transaction; the pool connection is still
        // checked out and may be the only one.
        let created = finish_session(tx.query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
            params![id],
            session_from_row,
        )?)?;
        tx.commit()?;
        Ok(created)
    }

    pub fn get_session(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![id],
                session_from_row,
            )
            .optional()?;
        raw.map(finish_session).transpose()
    }

    pub fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<Session>, StoreError> {
        // Parent scope with no linked students can match nothing.
        if matches!(&filter.student_ids, Some(ids) if ids.is_empty()) {
            return Ok(Vec::new());
        }
        let mut sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE 1=1");
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(tutor_id) = &filter.tutor_id {
            args.push(Box::new(tutor_id.as_str().to_string()));
            sql.push_str(&format!(" AND tutor_id = ?{}", args.len()));
        }
        if let Some(student_id) = &filter.student_id {
            args.push(Box::new(student_id.as_str().to_string()));
            sql.push_str(&format!(" AND student_id = ?{}", args.len()));
        }
        if let Some(student_ids) = &filter.student_ids {
            let mut placeholders = Vec::with_capacity(student_ids.len());
            for id in student_ids {
                args.push(Box::new(id.as_str().to_string()));
                placeholders.push(format!("?{}", args.len()));
            }
            sql.push_str(&format!(
                " AND student_id IN ({})",
                placeholders.join(", ")
            ));
        }
        if let Some(status) = filter.status {
            args.push(Box::new(status.as_str().to_string()));
            sql.push_str(&format!(" AND status = ?{}", args.len()));
        }
        if let Some(from) = filter.from {
            args.push(Box::new(from.to_string()));
            sql.push_str(&format!(" AND session_date >= ?{}", args.len()));
        }
        if let Some(to) = filter.to {
            args.push(Box::new(to.to_string()));
            sql.push_str(&format!(" AND session_date <= ?{}", args.len()));
        }
        sql.push_str(" ORDER BY session_date, start_time");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), session_from_row)?;
        let mut out = Vec::new();
        for raw in rows {
            out.push(finish_session(raw?)?);
        }
        Ok(out)
    }

    /// Applies a whitelisted partial update. When the booking interval
    /// changes, the overlap check runs again inside the same transaction.
    pub fn update_session(&self, id: &str, update: &SessionUpdate) -> Result<Session, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let current = finish_session(
            tx.query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![id],
                session_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found("session"))?,
        )?;

        // Reactivating a cancelled session re-contends for its slot.
        let reactivates = current.status == SessionStatus::Cancelled
            && update.status.is_some_and(|s| s.blocks_calendar());
        let reschedules = update.session_date.is_some()
            || update.start_time.is_some()
            || update.duration_minutes.is_some()
            || reactivates;
        if reschedules {
            let date = update.session_date.unwrap_or(current.session_date);
            let start = update.start_time.unwrap_or(current.start_time);
            let duration = update.duration_minutes.unwrap_or(current.duration_minutes);
            if overlap_count(&tx, &current.tutor_id, date, start, duration, Some(id))? > 0 {
                return Err(StoreError::conflict(
                    "tutor already has a session in this time slot",
                ));
            }
        }

        let mut sets = Vec::new();
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(subject) = &update.subject {
            args.push(Box::new(subject.clone()));
            sets.push(format!("subject = ?{}", args.len()));
        }
        if let Some(date) = update.session_date {
            args.push(Box::new(date.to_string()));
            sets.push(format!("session_date = ?{}", args.len()));
        }
        if let Some(start) = update.start_time {
            args.push(Box::new(start.to_string()));
            sets.push(format!("start_time = ?{}", args.len()));
        }
        if let Some(duration) = update.duration_minutes {
            args.push(Box::new(i64::from(duration)));
            sets.push(format!("duration = ?{}", args.len()));
        }
        if let Some(status) = update.status {
            args.push(Box::new(status.as_str().to_string()));
            sets.push(format!("status = ?{}", args.len()));
        }
        if let Some(notes) = &update.notes {
            args.push(Box::new(notes.clone()));
            sets.push(format!("notes = ?{}", args.len()));
        }
        if !sets.is_empty() {
            args.push(Box::new(Self::now_rfc3339()));
            sets.push(format!("updated_at = ?{}", args.len()));
            args.push(Box::new(id.to_string()));
            let sql = format!(
                "UPDATE sessions SET {} WHERE id = ?{}",
                sets.join(", "),
                args.len()
            );
            tx.execute(&sql, rusqlite::params_from_iter(args.iter()))?;
        }
        let updated = finish_session(tx.query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
            params![id],
            session_from_row,
        )?)?;
        tx.commit()?;
        Ok(updated)
    }

    pub fn delete_session(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let affected = conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StoreError::not_found("session"));
        }
        Ok(())
    }

    /// Calendar-blocking intervals for a tutor on one date. Feeds free-slot
    /// computation, which is why cancelled sessions are excluded here.
    pub fn booked_on(
        &self,
        tutor_id: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<BookedInterval>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT start_time, duration FROM sessions
             WHERE tutor_id = ?1 AND session_date = ?2 AND status != 'cancelled'",
        )?;
        let rows = stmt.query_map(params![tutor_id.as_str(), date.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (start, duration) = row?;
            out.push(BookedInterval {
                start: decode::time(&start)?,
                duration_minutes: u32::try_from(duration)
                    .map_err(|_| decode::bad_row("duration", &duration.to_string()))?,
            });
        }
        Ok(out)
    }

    /// Non-cancelled sessions for a tutor from `from` onward; shown next to
    /// the availability windows.
    pub fn upcoming_sessions(
        &self,
        tutor_id: &UserId,
        from: NaiveDate,
    ) -> Result<Vec<Session>, StoreError> {
        self.list_sessions(&SessionFilter {
            tutor_id: Some(tutor_id.clone()),
            from: Some(from),
            ..SessionFilter::default()
        })
        .map(|sessions| {
            sessions
                .into_iter()
                .filter(|s| s.status.blocks_calendar())
                .collect()
        })
    }

    /// Whether any session links this tutor and student, regardless of
    /// status. Gates a tutor's view of a student's progress.
    pub fn has_session_between(
        &self,
        tutor_id: &UserId,
        student_id: &UserId,
    ) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE tutor_id = ?1 AND student_id = ?2",
            params![tutor_id.as_str(), student_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Distinct students a tutor has ever had a session with.
    pub fn student_ids_of_tutor(&self, tutor_id: &UserId) -> Result<Vec<UserId>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT student_id FROM sessions WHERE tutor_id = ?1 ORDER BY student_id",
        )?;
        let rows = stmt.query_map(params![tutor_id.as_str()], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for raw in rows {
            out.push(decode::user_id(&raw?)?);
        }
        Ok(out)
    }
}
