//! SQL schema for the MemoPal SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,   -- normalised: trimmed, lower-case
    password_hash TEXT NOT NULL,          -- argon2 PHC string
    face_data     TEXT,                   -- JSON array of floats or NULL
    created_at    TEXT NOT NULL
);

-- One row per memory; list-valued fields are JSON arrays.
CREATE TABLE IF NOT EXISTS memories (
    memory_id     TEXT PRIMARY KEY,
    owner_id      TEXT NOT NULL REFERENCES users(user_id),
    person_name   TEXT NOT NULL,
    relationship  TEXT NOT NULL DEFAULT '',
    cues          TEXT NOT NULL DEFAULT '[]',
    images        TEXT NOT NULL DEFAULT '[]',
    videos        TEXT NOT NULL DEFAULT '[]',
    conversations TEXT NOT NULL DEFAULT '[]',
    notes         TEXT NOT NULL DEFAULT '',
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS memories_owner_idx ON memories(owner_id, created_at);

PRAGMA user_version = 1;
";
