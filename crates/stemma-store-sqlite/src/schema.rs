//! SQL schema for the Stemma SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// The UNIQUE constraints mirror the engine's invariants: one fingerprint
/// per source, one two-parent family per canonical pair per source
/// (`pair_key` is NULL for single-parent placeholders, which SQLite leaves
/// out of the uniqueness check), and one link per (family, person).
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS people (
    person_id        TEXT PRIMARY KEY,
    source_id        TEXT NOT NULL,
    generation       INTEGER NOT NULL,
    display_name     TEXT NOT NULL,
    given            TEXT,
    surname          TEXT,
    surname_inferred INTEGER NOT NULL DEFAULT 0,
    title            TEXT,
    sex              TEXT,            -- 'M' | 'F'
    birth_json       TEXT,            -- JSON-encoded Vitals or NULL
    death_json       TEXT,
    notes            TEXT,
    chart_id         TEXT,
    norm_given       TEXT,
    norm_surname     TEXT,
    fingerprint      TEXT,
    page_index       INTEGER,
    line_index       INTEGER,
    approx           INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL,   -- RFC 3339 UTC; store-assigned
    UNIQUE (source_id, fingerprint)
);

CREATE TABLE IF NOT EXISTS families (
    family_id   TEXT PRIMARY KEY,
    source_id   TEXT NOT NULL,
    husband_id  TEXT REFERENCES people(person_id),
    wife_id     TEXT REFERENCES people(person_id),
    pair_key    TEXT,                 -- canonical 'min:max' of both parents
    fingerprint TEXT,
    approx      INTEGER NOT NULL DEFAULT 0,
    page_index  INTEGER,
    created_at  TEXT NOT NULL,
    UNIQUE (source_id, pair_key)
);

CREATE TABLE IF NOT EXISTS children (
    child_id    TEXT PRIMARY KEY,
    family_id   TEXT NOT NULL REFERENCES families(family_id),
    person_id   TEXT NOT NULL REFERENCES people(person_id),
    ordinal     INTEGER NOT NULL,
    fingerprint TEXT,
    approx      INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    UNIQUE (family_id, person_id)
);

CREATE INDEX IF NOT EXISTS people_surname_idx  ON people(source_id, norm_surname);
CREATE INDEX IF NOT EXISTS families_parent_idx ON families(source_id, husband_id, wife_id);
CREATE INDEX IF NOT EXISTS children_family_idx ON children(family_id);

PRAGMA user_version = 1;
";
