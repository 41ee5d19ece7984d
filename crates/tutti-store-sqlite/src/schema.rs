//! SQL schema for the Tutti SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;

CREATE TABLE IF NOT EXISTS members (
    member_id   TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    active      INTEGER NOT NULL DEFAULT 1,
    suspended   INTEGER NOT NULL DEFAULT 0,
    role        TEXT NOT NULL,      -- 'musician' | 'section_leader' | 'board' | 'conductor'
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    event_id    TEXT PRIMARY KEY,
    kind        TEXT NOT NULL,      -- 'rehearsal' | 'concert'
    event_date  TEXT NOT NULL,      -- YYYY-MM-DD
    title       TEXT NOT NULL
);

-- One row per (member, period). Rows are never deleted by the engine.
CREATE TABLE IF NOT EXISTS dues_records (
    dues_id       TEXT PRIMARY KEY,
    member_id     TEXT NOT NULL REFERENCES members(member_id),
    period_year   INTEGER NOT NULL,
    period_month  INTEGER NOT NULL,
    paid          INTEGER NOT NULL DEFAULT 0,
    note          TEXT,
    created_at    TEXT NOT NULL,
    UNIQUE (member_id, period_year, period_month),
    CHECK  (period_month BETWEEN 1 AND 12)
);

-- One row per (member, rehearsal date). `event_date` is a copy of the
-- event's date, not a foreign key.
CREATE TABLE IF NOT EXISTS attendance_records (
    attendance_id TEXT PRIMARY KEY,
    member_id     TEXT NOT NULL REFERENCES members(member_id),
    event_date    TEXT NOT NULL,    -- YYYY-MM-DD
    status        TEXT NOT NULL DEFAULT 'pending',
    created_at    TEXT NOT NULL,
    UNIQUE (member_id, event_date)
);

CREATE INDEX IF NOT EXISTS events_date_idx       ON events(event_date);
CREATE INDEX IF NOT EXISTS dues_paid_idx         ON dues_records(paid);
CREATE INDEX IF NOT EXISTS attendance_date_idx   ON attendance_records(event_date);

PRAGMA user_version = 1;
";
