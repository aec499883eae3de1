// SPDX-License-Identifier: Apache-2.0

use crate::{decode, Store, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tutorhub_model::{Achievement, ProgressRecord, UserId};

struct RawRecord {
    id: String,
    student_id: String,
    subject_id: String,
    assessment_type: String,
    score: i64,
    max_score: i64,
    completed_at: Option<String>,
}

fn record_from_row(row: &Row<'_>) -> Result<RawRecord, rusqlite::Error> {
    Ok(RawRecord {
        id: row.get(0)?,
        student_id: row.get(1)?,
        subject_id: row.get(2)?,
        assessment_type: row.get(3)?,
        score: row.get(4)?,
        max_score: row.get(5)?,
        completed_at: row.get(6)?,
    })
}

fn finish_record(raw: RawRecord) -> Result<ProgressRecord, StoreError> {
    Ok(ProgressRecord {
        id: raw.id,
        student_id: decode::user_id(&raw.student_id)?,
        subject_id: raw.subject_id,
        assessment_type: raw.assessment_type,
        score: raw.score,
        max_score: raw.max_score,
        completed_at: decode::opt_datetime(raw.completed_at)?,
    })
}

impl Store {
    pub fn add_progress_record(
        &self,
        student_id: &UserId,
        subject_id: &str,
        assessment_type: &str,
        score: i64,
        max_score: i64,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<ProgressRecord, StoreError> {
        let conn = self.conn()?;
        let id = Self::new_id();
        conn.execute(
            "INSERT INTO student_progress
                 (id, student_id, subject_id, assessment_type, score, max_score,
                  completed_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                student_id.as_str(),
                subject_id,
                assessment_type,
                score,
                max_score,
                completed_at.map(|d| d.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
                Self::now_rfc3339(),
            ],
        )?;
        Ok(ProgressRecord {
            id,
            student_id: student_id.clone(),
            subject_id: subject_id.to_string(),
            assessment_type: assessment_type.to_string(),
            score,
            max_score,
            completed_at,
        })
    }

    /// Records for one student, newest first, optionally narrowed to one
    /// subject.
    pub fn progress_of_student(
        &self,
        student_id: &UserId,
        subject_id: Option<&str>,
    ) -> Result<Vec<ProgressRecord>, StoreError> {
        let conn = self.conn()?;
        let mut out = Vec::new();
        if let Some(subject_id) = subject_id {
            let mut stmt = conn.prepare(
                "SELECT id, student_id, subject_id, assessment_type, score, max_score, completed_at
                 FROM student_progress WHERE student_id = ?1 AND subject_id = ?2
                 ORDER BY created_at DESC",
            )?;
            let rows =
                stmt.query_map(params![student_id.as_str(), subject_id], record_from_row)?;
            for raw in rows {
                out.push(finish_record(raw?)?);
            }
        } else {
            let mut stmt = conn.prepare(
                "SELECT id, student_id, subject_id, assessment_type, score, max_score, completed_at
                 FROM student_progress WHERE student_id = ?1
                 ORDER BY created_at DESC",
            )?;
            let rows = stmt.query_map(params![student_id.as_str()], record_from_row)?;
            for raw in rows {
                out.push(finish_record(raw?)?);
            }
        }
        Ok(out)
    }

    /// Achievements the student has earned, joined through
    /// `student_achievements`.
    pub fn achievements_of_student(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<Achievement>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT a.id, a.title, a.description, a.category, a.icon, a.requirements
             FROM achievements a
             JOIN student_achievements sa ON sa.achievement_id = a.id
             WHERE sa.student_id = ?1
             ORDER BY sa.earned_at",
        )?;
        let rows = stmt.query_map(params![student_id.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, title, description, category, icon, requirements) = row?;
            let requirements = requirements
                .map(|raw| {
                    serde_json::from_str(&raw).map_err(|_| decode::bad_row("requirements", &raw))
                })
                .transpose()?;
            out.push(Achievement {
                id,
                title,
                description,
                category,
                icon,
                requirements,
            });
        }
        Ok(out)
    }
}
