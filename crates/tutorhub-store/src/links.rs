// SPDX-License-Identifier: Apache-2.0

//! Parent-student links. These rows gate every parent-scoped read, so the
//! helpers here stay small and boolean-shaped.

use crate::{decode, Store, StoreError};
use rusqlite::{params, Row};
use tutorhub_model::{StudentParentLink, UserId};

struct RawLink {
    id: String,
    parent_id: String,
    student_id: String,
    relationship: Option<String>,
    is_primary: bool,
}

fn link_from_row(row: &Row<'_>) -> Result<RawLink, rusqlite::Error> {
    Ok(RawLink {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        student_id: row.get(2)?,
        relationship: row.get(3)?,
        is_primary: row.get(4)?,
    })
}

fn finish_link(raw: RawLink) -> Result<StudentParentLink, StoreError> {
    Ok(StudentParentLink {
        id: raw.id,
        parent_id: decode::user_id(&raw.parent_id)?,
        student_id: decode::user_id(&raw.student_id)?,
        relationship: raw.relationship,
        is_primary: raw.is_primary,
    })
}

impl Store {
    pub fn add_parent_link(
        &self,
        parent_id: &UserId,
        student_id: &UserId,
        relationship: Option<&str>,
        is_primary: bool,
    ) -> Result<StudentParentLink, StoreError> {
        let conn = self.conn()?;
        let id = Self::new_id();
        conn.execute(
            "INSERT INTO student_parent
                 (id, parent_id, student_id, relationship, is_primary, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                parent_id.as_str(),
                student_id.as_str(),
                relationship,
                is_primary,
                Self::now_rfc3339(),
            ],
        )?;
        Ok(StudentParentLink {
            id,
            parent_id: parent_id.clone(),
            student_id: student_id.clone(),
            relationship: relationship.map(str::to_string),
            is_primary,
        })
    }

    pub fn links_of_parent(
        &self,
        parent_id: &UserId,
    ) -> Result<Vec<StudentParentLink>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, parent_id, student_id, relationship, is_primary
             FROM student_parent WHERE parent_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![parent_id.as_str()], link_from_row)?;
        let mut out = Vec::new();
        for raw in rows {
            out.push(finish_link(raw?)?);
        }
        Ok(out)
    }

    pub fn child_ids_of_parent(&self, parent_id: &UserId) -> Result<Vec<UserId>, StoreError> {
        Ok(self
            .links_of_parent(parent_id)?
            .into_iter()
            .map(|link| link.student_id)
            .collect())
    }

    pub fn is_parent_of(
        &self,
        parent_id: &UserId,
        student_id: &UserId,
    ) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM student_parent WHERE parent_id = ?1 AND student_id = ?2",
            params![parent_id.as_str(), student_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
