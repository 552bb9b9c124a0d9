//! SQLite implementation of the jotter document store.
//!
//! Each note is kept as a JSON document in the `notes` table, keyed by its id.

mod migrations;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use jotter_core::{timestamp, Connector, Database, Error, Note, NoteId};
use rusqlite::{params, Connection, OptionalExtension};

pub use migrations::{get_pending_migrations, Migration, MIGRATIONS, SCHEMA_VERSION};

/// SQLite-backed document store.
pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Open a database at the given path and run any pending migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let conn = Connection::open(path).map_err(|e| Error::Connection(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database and run migrations.
    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Connection(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, Error> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("connection lock poisoned".into()))
    }

    /// Run any pending schema migrations.
    fn run_migrations(&self) -> Result<(), Error> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _jotter_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        let current_version: i64 = conn
            .query_row(
                "SELECT value FROM _jotter_meta WHERE key = 'schema_version'",
                [],
                |row| {
                    let val: String = row.get(0)?;
                    Ok(val.parse().unwrap_or(0))
                },
            )
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?
            .unwrap_or(0);

        if current_version >= SCHEMA_VERSION {
            return Ok(());
        }

        for migration in get_pending_migrations(current_version) {
            tracing::debug!(version = migration.version, name = migration.name, "Applying migration.");
            for statement in migration.statements {
                conn.execute(statement, []).map_err(|e| {
                    Error::Database(format!("Migration {} failed: {}", migration.name, e))
                })?;
            }
        }

        conn.execute(
            "INSERT OR REPLACE INTO _jotter_meta (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    fn encode(note: &Note) -> Result<String, Error> {
        serde_json::to_string(note).map_err(|e| Error::Database(format!("Failed to encode note: {}", e)))
    }

    fn decode(doc: &str) -> Result<Note, Error> {
        serde_json::from_str(doc).map_err(|e| Error::Database(format!("Failed to decode note: {}", e)))
    }
}

#[async_trait::async_trait]
impl Database for SqliteDatabase {
    async fn ping(&self) -> Result<(), Error> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| Error::Connection(e.to_string()))
    }

    async fn insert_note(&self, note: &Note) -> Result<(), Error> {
        let doc = Self::encode(note)?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO notes (id, doc, updated_at) VALUES (?1, ?2, ?3)",
            params![
                note.id.to_string(),
                doc,
                timestamp::format(&note.updated_at)
            ],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn get_note(&self, id: NoteId) -> Result<Option<Note>, Error> {
        let conn = self.conn()?;

        let doc: Option<String> = conn
            .query_row(
                "SELECT doc FROM notes WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        doc.as_deref().map(Self::decode).transpose()
    }

    async fn list_notes(&self) -> Result<Vec<Note>, Error> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT doc FROM notes ORDER BY updated_at DESC, id DESC")
            .map_err(|e| Error::Database(e.to_string()))?;

        let docs = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| Error::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::Database(e.to_string()))?;

        docs.iter().map(|doc| Self::decode(doc)).collect()
    }

    async fn replace_note(&self, note: &Note) -> Result<bool, Error> {
        let doc = Self::encode(note)?;
        let conn = self.conn()?;

        let rows = conn
            .execute(
                "UPDATE notes SET doc = ?1, updated_at = ?2 WHERE id = ?3",
                params![
                    doc,
                    timestamp::format(&note.updated_at),
                    note.id.to_string()
                ],
            )
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(rows > 0)
    }

    async fn delete_note(&self, id: NoteId) -> Result<bool, Error> {
        let conn = self.conn()?;

        let rows = conn
            .execute("DELETE FROM notes WHERE id = ?1", params![id.to_string()])
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(rows > 0)
    }
}

/// Where a [`SqliteConnector`] opens its database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqliteTarget {
    File(PathBuf),
    Memory,
}

/// Opens a [`SqliteDatabase`] from a `sqlite://<path>` or `sqlite::memory:` string.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    target: SqliteTarget,
}

impl SqliteConnector {
    pub fn new(target: SqliteTarget) -> Self {
        Self { target }
    }

    /// Parse a connection string. Returns `None` if it is not a SQLite URL.
    pub fn from_url(url: &str) -> Option<Result<Self, Error>> {
        if url == "sqlite::memory:" || url == "sqlite://:memory:" {
            return Some(Ok(Self::new(SqliteTarget::Memory)));
        }

        let path = url.strip_prefix("sqlite://")?;
        if path.is_empty() {
            return Some(Err(Error::Connection(
                "sqlite connection string has no path".into(),
            )));
        }
        Some(Ok(Self::new(SqliteTarget::File(PathBuf::from(path)))))
    }

    pub fn target(&self) -> &SqliteTarget {
        &self.target
    }
}

#[async_trait::async_trait]
impl Connector for SqliteConnector {
    type Db = SqliteDatabase;

    async fn connect(&self) -> Result<SqliteDatabase, Error> {
        match &self.target {
            SqliteTarget::File(path) => SqliteDatabase::open(path),
            SqliteTarget::Memory => SqliteDatabase::open_in_memory(),
        }
    }
}
