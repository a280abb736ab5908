//! SQL schema for the intake SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `foreign_keys` and `busy_timeout` are per-connection settings, so this must
/// run on every connection, not only when the file is created.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;

CREATE TABLE IF NOT EXISTS submissions (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id     TEXT,
    date            TEXT NOT NULL,   -- YYYY-MM-DD
    type            TEXT NOT NULL CHECK (type IN ('IN', 'OUT')),
    sphere          TEXT CHECK (sphere IN ('IDEELL', 'ZWECK', 'VERMOEGEN', 'WGB')),
    payment_method  TEXT CHECK (payment_method IN ('BAR', 'BANK')),
    description     TEXT,
    category_hint   TEXT,
    counterparty    TEXT,
    gross_amount    TEXT NOT NULL,   -- exact decimal string
    submitted_by    TEXT NOT NULL,
    submitted_at    TEXT NOT NULL,   -- fixed-width RFC 3339 UTC; store-assigned
    status          TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'approved', 'rejected')),
    reviewed_at     TEXT,
    reviewer_notes  TEXT,
    voucher_id      INTEGER
);

-- Attachments are written once with their submission and never updated.
CREATE TABLE IF NOT EXISTS submission_attachments (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    submission_id   INTEGER NOT NULL
                    REFERENCES submissions(id) ON DELETE CASCADE,
    filename        TEXT NOT NULL CHECK (length(filename) > 0),
    mime_type       TEXT,
    data            BLOB NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS submissions_status_idx
    ON submissions(status, submitted_at);
CREATE INDEX IF NOT EXISTS submissions_submitted_idx
    ON submissions(submitted_at);
CREATE INDEX IF NOT EXISTS attachments_submission_idx
    ON submission_attachments(submission_id);

PRAGMA user_version = 1;
";
