//! Embedded schema migrations for the SQLite store.
//!
//! Migrations are versioned and run automatically when the store is opened.
//! The schema version is tracked in the `_jotter_meta` table.

/// Current schema version. Increment when adding new migrations.
pub const SCHEMA_VERSION: i64 = 2;

/// A migration with version number and SQL statements.
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub statements: &'static [&'static str],
}

/// All migrations in order. Each statement must be idempotent.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "notes_collection",
        statements: &[
            // One JSON document per note. `updated_at` is duplicated out of
            // the document so listing can sort without parsing it.
            "CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                doc TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        ],
    },
    Migration {
        version: 2,
        name: "notes_updated_at_index",
        statements: &["CREATE INDEX IF NOT EXISTS idx_notes_updated_at ON notes(updated_at)"],
    },
];

/// Migrations that still need to be applied given the current version.
pub fn get_pending_migrations(current_version: i64) -> Vec<&'static Migration> {
    MIGRATIONS
        .iter()
        .filter(|m| m.version > current_version)
        .collect()
}
