// SPDX-License-Identifier: Apache-2.0

//! Database schema. One polymorphic `users` table distinguished by `role`;
//! all times are stored as TEXT (`YYYY-MM-DD`, `HH:MM`, RFC 3339).

pub const SCHEMA_VERSION: i64 = 1;

pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS users (
    id               TEXT PRIMARY KEY,
    name             TEXT,
    full_name        TEXT,
    email            TEXT,
    role             TEXT NOT NULL DEFAULT 'student',
    token_identifier TEXT NOT NULL UNIQUE,
    created_at       TEXT NOT NULL,
    updated_at       TEXT
);

CREATE TABLE IF NOT EXISTS subjects (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    level       TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT
);

CREATE TABLE IF NOT EXISTS tutor_subjects (
    id                TEXT PRIMARY KEY,
    user_id           TEXT NOT NULL REFERENCES users(id),
    subject_id        TEXT NOT NULL REFERENCES subjects(id),
    proficiency_level TEXT NOT NULL DEFAULT 'intermediate',
    is_verified       INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT NOT NULL,
    UNIQUE (user_id, subject_id)
);

CREATE TABLE IF NOT EXISTS sessions (
    id           TEXT PRIMARY KEY,
    tutor_id     TEXT NOT NULL REFERENCES users(id),
    student_id   TEXT NOT NULL REFERENCES users(id),
    subject      TEXT NOT NULL,
    session_date TEXT NOT NULL,
    start_time   TEXT NOT NULL,
    duration     INTEGER NOT NULL DEFAULT 60,
    status       TEXT NOT NULL DEFAULT 'scheduled',
    notes        TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT
);
CREATE INDEX IF NOT EXISTS idx_sessions_tutor_date ON sessions (tutor_id, session_date);
CREATE INDEX IF NOT EXISTS idx_sessions_student ON sessions (student_id);

CREATE TABLE IF NOT EXISTS tutor_availability (
    id           TEXT PRIMARY KEY,
    tutor_id     TEXT NOT NULL REFERENCES users(id),
    day          TEXT NOT NULL,
    start_time   TEXT NOT NULL,
    end_time     TEXT NOT NULL,
    is_recurring INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_availability_tutor ON tutor_availability (tutor_id);

CREATE TABLE IF NOT EXISTS tutor_availability_exceptions (
    id             TEXT PRIMARY KEY,
    tutor_id       TEXT NOT NULL REFERENCES users(id),
    exception_date TEXT NOT NULL,
    is_available   INTEGER NOT NULL DEFAULT 0,
    start_time     TEXT,
    end_time       TEXT,
    reason         TEXT,
    created_at     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_exceptions_tutor_date
    ON tutor_availability_exceptions (tutor_id, exception_date);

CREATE TABLE IF NOT EXISTS student_parent (
    id           TEXT PRIMARY KEY,
    parent_id    TEXT NOT NULL REFERENCES users(id),
    student_id   TEXT NOT NULL REFERENCES users(id),
    relationship TEXT,
    is_primary   INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    UNIQUE (parent_id, student_id)
);

CREATE TABLE IF NOT EXISTS student_progress (
    id              TEXT PRIMARY KEY,
    student_id      TEXT NOT NULL REFERENCES users(id),
    subject_id      TEXT NOT NULL,
    assessment_type TEXT NOT NULL,
    score           INTEGER NOT NULL,
    max_score       INTEGER NOT NULL,
    completed_at    TEXT,
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_progress_student ON student_progress (student_id);

CREATE TABLE IF NOT EXISTS achievements (
    id           TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL,
    category     TEXT,
    icon         TEXT,
    requirements TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS student_achievements (
    id             TEXT PRIMARY KEY,
    student_id     TEXT NOT NULL REFERENCES users(id),
    achievement_id TEXT NOT NULL REFERENCES achievements(id),
    earned_at      TEXT,
    created_at     TEXT NOT NULL,
    UNIQUE (student_id, achievement_id)
);

CREATE TABLE IF NOT EXISTS quizzes (
    id           TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    subject_id   TEXT NOT NULL,
    questions    TEXT NOT NULL,
    created_by   TEXT NOT NULL REFERENCES users(id),
    ai_generated INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS quiz_attempts (
    id           TEXT PRIMARY KEY,
    quiz_id      TEXT NOT NULL REFERENCES quizzes(id),
    student_id   TEXT NOT NULL REFERENCES users(id),
    answers      TEXT NOT NULL,
    score        INTEGER,
    max_score    INTEGER,
    completed    INTEGER NOT NULL DEFAULT 0,
    completed_at TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS teaching_plans (
    id            TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    subject_id    TEXT NOT NULL,
    content       TEXT NOT NULL,
    student_level TEXT,
    created_by    TEXT NOT NULL REFERENCES users(id),
    ai_generated  INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS learning_recommendations (
    id            TEXT PRIMARY KEY,
    student_id    TEXT NOT NULL REFERENCES users(id),
    subject_id    TEXT NOT NULL,
    title         TEXT NOT NULL,
    resource_type TEXT NOT NULL,
    resource_url  TEXT,
    description   TEXT,
    viewed        INTEGER NOT NULL DEFAULT 0,
    completed     INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_recommendations_student
    ON learning_recommendations (student_id);
";
