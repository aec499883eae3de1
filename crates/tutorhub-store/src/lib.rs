#![forbid(unsafe_code)]
//! SQLite persistence for tutorhub.
//!
//! A single [`Store`] owns an r2d2 connection pool; entity operations live
//! in per-entity modules as `impl Store` blocks. Everything is synchronous
//! rusqlite — callers on the async side go through
//! `tokio::task::spawn_blocking` if they care (the queries here are
//! single-row or small-scan and fast in practice).

mod availability;
mod content;
mod links;
mod progress;
pub mod schema;
mod sessions;
mod subjects;
mod users;

pub use sessions::{NewSession, SessionFilter, SessionUpdate};
pub use users::{NewUser, UserProfileUpdate};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub const CRATE_NAME: &str = "tutorhub-store";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorCode {
    NotFound,
    Conflict,
    Constraint,
    Pool,
    Sql,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(entity: &str) -> Self {
        Self::new(StoreErrorCode::NotFound, format!("{entity} not found"))
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Conflict, message)
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Self::new(
                StoreErrorCode::NotFound,
                "query returned no rows".to_string(),
            ),
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::new(
                    StoreErrorCode::Constraint,
                    msg.unwrap_or_else(|| "constraint violation".to_string()),
                )
            }
            other => Self::new(StoreErrorCode::Sql, other.to_string()),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(value: r2d2::Error) -> Self {
        Self::new(StoreErrorCode::Pool, value.to_string())
    }
}

type PooledConn = r2d2::PooledConnection<SqliteConnectionManager>;

#[derive(Clone)]
pub struct Store {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl Store {
    /// Opens (creating if needed) the database at `db_path` and applies the
    /// schema plus the default subject seed.
    pub fn open(db_path: &Path, max_connections: u32) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::new(StoreErrorCode::Pool, e.to_string()))?;
        }
        let manager = SqliteConnectionManager::file(db_path).with_flags(
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        );
        let pool = Pool::builder().max_size(max_connections).build(manager)?;
        {
            let conn = pool.get()?;
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )?;
            conn.execute_batch(schema::SCHEMA_SQL)?;
        }
        info!(path = %db_path.display(), "store opened");
        let store = Self {
            pool: Arc::new(pool),
        };
        store.seed_subjects()?;
        Ok(store)
    }

    /// Private in-memory database, used by tests and the integration suite.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::memory();
        // Single connection: each pooled connection would otherwise get its
        // own empty in-memory database.
        let pool = Pool::builder().max_size(1).build(manager)?;
        {
            let conn = pool.get()?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.execute_batch(schema::SCHEMA_SQL)?;
        }
        let store = Self {
            pool: Arc::new(pool),
        };
        store.seed_subjects()?;
        Ok(store)
    }

    pub(crate) fn conn(&self) -> Result<PooledConn, StoreError> {
        Ok(self.pool.get()?)
    }

    pub(crate) fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub(crate) fn now_rfc3339() -> String {
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}

pub(crate) mod decode {
    //! TEXT-column decoding shared by the entity modules. Corrupt rows are
    //! surfaced as Sql errors rather than panics.

    use super::{StoreError, StoreErrorCode};
    use chrono::{DateTime, NaiveDate, Utc};
    use tutorhub_model::{Role, SessionStatus, TimeOfDay, UserId, Weekday};

    pub fn bad_row(column: &str, value: &str) -> StoreError {
        StoreError::new(
            StoreErrorCode::Sql,
            format!("corrupt {column} value in row: {value}"),
        )
    }

    pub fn user_id(raw: &str) -> Result<UserId, StoreError> {
        UserId::parse(raw).map_err(|_| bad_row("user id", raw))
    }

    pub fn role(raw: Option<&str>) -> Role {
        Role::from_stored(raw)
    }

    pub fn date(raw: &str) -> Result<NaiveDate, StoreError> {
        raw.parse::<NaiveDate>().map_err(|_| bad_row("date", raw))
    }

    pub fn time(raw: &str) -> Result<TimeOfDay, StoreError> {
        TimeOfDay::parse(raw).map_err(|_| bad_row("time", raw))
    }

    pub fn status(raw: &str) -> Result<SessionStatus, StoreError> {
        SessionStatus::parse(raw).map_err(|_| bad_row("status", raw))
    }

    pub fn weekday(raw: &str) -> Result<Weekday, StoreError> {
        Weekday::parse(raw).map_err(|_| bad_row("weekday", raw))
    }

    pub fn datetime(raw: &str) -> Result<DateTime<Utc>, StoreError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|_| bad_row("datetime", raw))
    }

    pub fn opt_datetime(raw: Option<String>) -> Result<Option<DateTime<Utc>>, StoreError> {
        raw.map(|s| datetime(&s)).transpose()
    }

    pub fn opt_time(raw: Option<String>) -> Result<Option<TimeOfDay>, StoreError> {
        raw.map(|s| time(&s)).transpose()
    }
}
