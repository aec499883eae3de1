// SPDX-License-Identifier: Apache-2.0

use crate::{decode, Store, StoreError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tutorhub_model::{Role, TutorSubject, User, UserId};

const USER_COLUMNS: &str = "id, name, full_name, email, role";
// Qualified variant for joins where tutor_subjects.id shadows users.id.
const USER_COLUMNS_QUALIFIED: &str = "u.id, u.name, u.full_name, u.email, u.role";

struct RawUser {
    id: String,
    name: Option<String>,
    full_name: Option<String>,
    email: Option<String>,
    role: Option<String>,
}

fn user_from_row(row: &Row<'_>) -> Result<RawUser, rusqlite::Error> {
    Ok(RawUser {
        id: row.get(0)?,
        name: row.get(1)?,
        full_name: row.get(2)?,
        email: row.get(3)?,
        role: row.get(4)?,
    })
}

fn finish_user(raw: RawUser) -> Result<User, StoreError> {
    Ok(User {
        id: decode::user_id(&raw.id)?,
        name: raw.name,
        full_name: raw.full_name,
        email: raw.email,
        role: decode::role(raw.role.as_deref()),
    })
}

/// Lookup on an already-held connection. The pool may be down to a single
/// connection; methods that hold one must not re-enter `Store::conn`.
fn user_by_id(conn: &Connection, id: &UserId) -> Result<Option<User>, StoreError> {
    let raw = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.as_str()],
            user_from_row,
        )
        .optional()?;
    raw.map(finish_user).transpose()
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Option<String>,
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub token_identifier: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserProfileUpdate {
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

impl UserProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.full_name.is_none() && self.email.is_none()
    }
}

impl Store {
    pub fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let conn = self.conn()?;
        let id = new.id.unwrap_or_else(Self::new_id);
        conn.execute(
            "INSERT INTO users (id, name, full_name, email, role, token_identifier, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                new.name,
                new.full_name,
                new.email,
                new.role.as_str(),
                new.token_identifier,
                Self::now_rfc3339(),
            ],
        )?;
        Ok(User {
            id: decode::user_id(&id)?,
            name: new.name,
            full_name: new.full_name,
            email: new.email,
            role: new.role,
        })
    }

    /// Authentication lookup: bearer token to user row.
    pub fn find_user_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE token_identifier = ?1"),
                params![token],
                user_from_row,
            )
            .optional()?;
        raw.map(finish_user).transpose()
    }

    pub fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        user_by_id(&conn, id)
    }

    /// Tutor listing with optional subject filter through tutor_subjects.
    pub fn list_tutors(&self, subject_id: Option<&str>) -> Result<Vec<User>, StoreError> {
        let conn = self.conn()?;
        let mut out = Vec::new();
        if let Some(subject) = subject_id {
            let mut stmt = conn.prepare(&format!(
                "SELECT DISTINCT {USER_COLUMNS_QUALIFIED} FROM users u
                 JOIN tutor_subjects ts ON ts.user_id = u.id
                 WHERE u.role = 'tutor' AND ts.subject_id = ?1
                 ORDER BY u.id"
            ))?;
            let rows = stmt.query_map(params![subject], user_from_row)?;
            for raw in rows {
                out.push(finish_user(raw?)?);
            }
        } else {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE role = 'tutor' ORDER BY id"
            ))?;
            let rows = stmt.query_map([], user_from_row)?;
            for raw in rows {
                out.push(finish_user(raw?)?);
            }
        }
        Ok(out)
    }

    /// Tutor profile fetch; `None` when missing or not a tutor.
    pub fn get_tutor(&self, id: &UserId) -> Result<Option<(User, Vec<TutorSubject>)>, StoreError> {
        let Some(user) = self.get_user(id)? else {
            return Ok(None);
        };
        if user.role != Role::Tutor {
            return Ok(None);
        }
        let subjects = self.tutor_subjects(id)?;
        Ok(Some((user, subjects)))
    }

    pub fn tutor_subjects(&self, tutor_id: &UserId) -> Result<Vec<TutorSubject>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, subject_id, proficiency_level, is_verified
             FROM tutor_subjects WHERE user_id = ?1 ORDER BY subject_id",
        )?;
        let rows = stmt.query_map(params![tutor_id.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, bool>(4)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, user_id, subject_id, proficiency_level, is_verified) = row?;
            out.push(TutorSubject {
                id,
                user_id: decode::user_id(&user_id)?,
                subject_id,
                proficiency_level,
                is_verified,
            });
        }
        Ok(out)
    }

    pub fn add_tutor_subject(
        &self,
        tutor_id: &UserId,
        subject_id: &str,
        proficiency_level: &str,
    ) -> Result<TutorSubject, StoreError> {
        let conn = self.conn()?;
        let id = Self::new_id();
        conn.execute(
            "INSERT INTO tutor_subjects (id, user_id, subject_id, proficiency_level, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                tutor_id.as_str(),
                subject_id,
                proficiency_level,
                Self::now_rfc3339()
            ],
        )?;
        Ok(TutorSubject {
            id,
            user_id: tutor_id.clone(),
            subject_id: subject_id.to_string(),
            proficiency_level: proficiency_level.to_string(),
            is_verified: false,
        })
    }

    /// Whitelisted profile-field update; role and token never change here.
    pub fn update_user_profile(
        &self,
        id: &UserId,
        update: &UserProfileUpdate,
    ) -> Result<User, StoreError> {
        let conn = self.conn()?;
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<&dyn rusqlite::ToSql> = Vec::new();
        if let Some(name) = &update.name {
            sets.push("name = ?");
            values.push(name);
        }
        if let Some(full_name) = &update.full_name {
            sets.push("full_name = ?");
            values.push(full_name);
        }
        if let Some(email) = &update.email {
            sets.push("email = ?");
            values.push(email);
        }
        if sets.is_empty() {
            return user_by_id(&conn, id)?.ok_or_else(|| StoreError::not_found("user"));
        }
        let now = Self::now_rfc3339();
        let sql = format!(
            "UPDATE users SET {}, updated_at = ? WHERE id = ?",
            sets.join(", ")
        );
        values.push(&now);
        let id_str = id.as_str().to_string();
        values.push(&id_str);
        let changed = conn.execute(&sql, values.as_slice())?;
        if changed == 0 {
            return Err(StoreError::not_found("user"));
        }
        user_by_id(&conn, id)?.ok_or_else(|| StoreError::not_found("user"))
    }

    /// Students visible in a listing, optionally restricted to an id set
    /// (role scoping is decided by the caller).
    pub fn list_students(&self, ids: Option<&[UserId]>) -> Result<Vec<User>, StoreError> {
        if let Some(ids) = ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
        }
        let conn = self.conn()?;
        let mut out = Vec::new();
        match ids {
            Some(ids) => {
                let placeholders = vec!["?"; ids.len()].join(", ");
                let sql = format!(
                    "SELECT {USER_COLUMNS} FROM users
                     WHERE role = 'student' AND id IN ({placeholders}) ORDER BY id"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(
                    rusqlite::params_from_iter(ids.iter().map(UserId::as_str)),
                    user_from_row,
                )?;
                for raw in rows {
                    out.push(finish_user(raw?)?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE role = 'student' ORDER BY id"
                ))?;
                let rows = stmt.query_map([], user_from_row)?;
                for raw in rows {
                    out.push(finish_user(raw?)?);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreErrorCode;
    use tutorhub_model::Role;

    fn new_user(role: Role, token: &str) -> NewUser {
        NewUser {
            id: None,
            name: Some("n".to_string()),
            full_name: None,
            email: None,
            role,
            token_identifier: token.to_string(),
        }
    }

    #[test]
    fn token_lookup_roundtrip() {
        let store = Store::open_in_memory().expect("open");
        let created = store.create_user(new_user(Role::Tutor, "tok-1")).expect("create");
        let found = store
            .find_user_by_token("tok-1")
            .expect("lookup")
            .expect("present");
        assert_eq!(found, created);
        assert!(store.find_user_by_token("nope").expect("lookup").is_none());
    }

    #[test]
    fn duplicate_token_is_a_constraint_error() {
        let store = Store::open_in_memory().expect("open");
        store.create_user(new_user(Role::Student, "tok")).expect("first");
        let err = store.create_user(new_user(Role::Student, "tok")).expect_err("dup");
        assert_eq!(err.code, StoreErrorCode::Constraint);
    }

    #[test]
    fn tutor_listing_filters_by_subject() {
        let store = Store::open_in_memory().expect("open");
        let t1 = store.create_user(new_user(Role::Tutor, "t1")).expect("t1");
        let t2 = store.create_user(new_user(Role::Tutor, "t2")).expect("t2");
        store.create_user(new_user(Role::Student, "s1")).expect("s1");
        let math = store
            .list_subjects()
            .expect("subjects")
            .into_iter()
            .find(|s| s.name == "Mathematics")
            .expect("seeded");
        store
            .add_tutor_subject(&t1.id, &math.id, "advanced")
            .expect("link");

        assert_eq!(store.list_tutors(None).expect("all").len(), 2);
        let filtered = store.list_tutors(Some(&math.id)).expect("filtered");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, t1.id);
        assert!(store.get_tutor(&t2.id).expect("t2").is_some());
    }

    #[test]
    fn get_tutor_rejects_non_tutor_rows() {
        let store = Store::open_in_memory().expect("open");
        let s = store.create_user(new_user(Role::Student, "s")).expect("s");
        assert!(store.get_tutor(&s.id).expect("lookup").is_none());
    }

    #[test]
    fn student_listing_restricts_to_an_id_set() {
        let store = Store::open_in_memory().expect("open");
        let a = store.create_user(new_user(Role::Student, "a")).expect("a");
        let b = store.create_user(new_user(Role::Student, "b")).expect("b");
        store.create_user(new_user(Role::Student, "c")).expect("c");
        store.create_user(new_user(Role::Tutor, "t")).expect("t");

        let subset = store
            .list_students(Some(&[a.id.clone(), b.id.clone()]))
            .expect("subset");
        assert_eq!(subset.len(), 2);
        assert!(subset.iter().all(|u| u.id == a.id || u.id == b.id));
        assert!(store.list_students(Some(&[])).expect("empty").is_empty());
        assert_eq!(store.list_students(None).expect("all").len(), 3);
    }

    #[test]
    fn profile_update_whitelists_fields() {
        let store = Store::open_in_memory().expect("open");
        let t = store.create_user(new_user(Role::Tutor, "t")).expect("t");
        let updated = store
            .update_user_profile(
                &t.id,
                &UserProfileUpdate {
                    full_name: Some("Dr. Smith".to_string()),
                    ..UserProfileUpdate::default()
                },
            )
            .expect("update");
        assert_eq!(updated.full_name.as_deref(), Some("Dr. Smith"));
        assert_eq!(updated.role, Role::Tutor);
    }
}
