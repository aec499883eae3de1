// SPDX-License-Identifier: Apache-2.0

use crate::{Store, StoreError, StoreErrorCode};
use rusqlite::{params, OptionalExtension, Row};
use tutorhub_model::{Subject, SUBJECT_SEED};

fn subject_from_row(row: &Row<'_>) -> Result<Subject, rusqlite::Error> {
    Ok(Subject {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        level: row.get(3)?,
    })
}

impl Store {
    /// Installs the default subject catalog when the table is empty. Runs
    /// on every open; a populated table makes it a no-op.
    pub(crate) fn seed_subjects(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM subjects", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }
        let now = Self::now_rfc3339();
        for name in SUBJECT_SEED {
            conn.execute(
                "INSERT INTO subjects (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![Self::new_id(), name, now],
            )?;
        }
        Ok(())
    }

    pub fn list_subjects(&self) -> Result<Vec<Subject>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, name, description, level FROM subjects ORDER BY name")?;
        let rows = stmt.query_map([], subject_from_row)?;
        let mut out = Vec::new();
        for subject in rows {
            out.push(subject?);
        }
        Ok(out)
    }

    pub fn get_subject(&self, id: &str) -> Result<Option<Subject>, StoreError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id, name, description, level FROM subjects WHERE id = ?1",
                params![id],
                subject_from_row,
            )
            .optional()?)
    }

    /// Case-insensitive lookup by display name; booking validates the
    /// free-text subject field against the catalog through this.
    pub fn find_subject_by_name(&self, name: &str) -> Result<Option<Subject>, StoreError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id, name, description, level FROM subjects
                 WHERE name = ?1 COLLATE NOCASE",
                params![name.trim()],
                subject_from_row,
            )
            .optional()?)
    }

    pub fn create_subject(
        &self,
        name: &str,
        description: Option<&str>,
        level: Option<&str>,
    ) -> Result<Subject, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::new(
                StoreErrorCode::Constraint,
                "subject name must be non-empty",
            ));
        }
        let conn = self.conn()?;
        let id = Self::new_id();
        conn.execute(
            "INSERT INTO subjects (id, name, description, level, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, name, description, level, Self::now_rfc3339()],
        )?;
        Ok(Subject {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            level: level.map(str::to_string),
        })
    }

    pub fn update_subject(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
        level: Option<&str>,
    ) -> Result<Subject, StoreError> {
        let conn = self.conn()?;
        let affected = conn.execute(
            "UPDATE subjects SET name = ?2, description = ?3, level = ?4, updated_at = ?5
             WHERE id = ?1",
            params![id, name.trim(), description, level, Self::now_rfc3339()],
        )?;
        if affected == 0 {
            return Err(StoreError::not_found("subject"));
        }
        // Re-read on the held connection; re-entering the pool here can
        // deadlock when this is the last connection.
        conn.query_row(
            "SELECT id, name, description, level FROM subjects WHERE id = ?1",
            params![id],
            subject_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("subject"))
    }

    pub fn delete_subject(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let affected = conn.execute("DELETE FROM subjects WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StoreError::not_found("subject"));
        }
        Ok(())
    }
}
