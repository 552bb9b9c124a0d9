use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

use crate::note::timestamp;
use crate::{Connector, Database, Error, Note, NoteId, NoteInput};

/// Default upper bound on title length, in characters.
pub const DEFAULT_MAX_TITLE_CHARS: usize = 100;

/// Limits applied by [`NotesService`].
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub max_title_chars: usize,
    /// Bound on establishing the store connection.
    pub connect_timeout: Duration,
    /// Bound on each store operation.
    pub op_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            max_title_chars: DEFAULT_MAX_TITLE_CHARS,
            connect_timeout: Duration::from_secs(5),
            op_timeout: Duration::from_secs(10),
        }
    }
}

/// The data-access layer: validation plus CRUD against a lazily connected store.
///
/// The store handle is opened on first use and reused for the lifetime of
/// the service. Concurrent first callers wait on a single connection attempt;
/// a failed attempt is not remembered, so the next call tries again.
pub struct NotesService<C: Connector> {
    connector: C,
    db: OnceCell<C::Db>,
    settings: ServiceSettings,
}

impl<C: Connector> NotesService<C> {
    pub fn new(connector: C) -> Self {
        Self::with_settings(connector, ServiceSettings::default())
    }

    pub fn with_settings(connector: C, settings: ServiceSettings) -> Self {
        Self {
            connector,
            db: OnceCell::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Whether a store handle has been established.
    pub fn is_connected(&self) -> bool {
        self.db.initialized()
    }

    /// Establish the store connection, or return the existing one.
    pub async fn connect(&self) -> Result<&C::Db, Error> {
        self.db
            .get_or_try_init(|| async {
                let limit = self.settings.connect_timeout;
                let db = tokio::time::timeout(limit, self.connector.connect())
                    .await
                    .map_err(|_| {
                        Error::Timeout(format!(
                            "connect did not finish within {}ms",
                            limit.as_millis()
                        ))
                    })??;
                tracing::info!("Database connected.");
                Ok::<_, Error>(db)
            })
            .await
    }

    /// Connect and round-trip to the store.
    pub async fn ping(&self) -> Result<(), Error> {
        let db = self.connect().await?;
        self.bounded("ping", db.ping()).await
    }

    /// Create a note from untrimmed input.
    pub async fn create(&self, input: NoteInput) -> Result<Note, Error> {
        let (title, content) = self.validate(input)?;
        let db = self.connect().await?;

        let now = timestamp::now();
        let note = Note {
            id: NoteId::generate(),
            title,
            content,
            created_at: now,
            updated_at: now,
        };
        self.bounded("insert", db.insert_note(&note)).await?;

        tracing::info!(note_id = %note.id, "Note created.");
        Ok(note)
    }

    /// All notes, most recently updated first.
    pub async fn find_all(&self) -> Result<Vec<Note>, Error> {
        let db = self.connect().await?;
        let notes = self.bounded("list", db.list_notes()).await?;
        tracing::debug!(count = notes.len(), "Listed notes.");
        Ok(notes)
    }

    /// Get a note by its raw id string.
    pub async fn find_by_id(&self, id: &str) -> Result<Note, Error> {
        let id = NoteId::parse(id)?;
        let db = self.connect().await?;
        self.bounded("get", db.get_note(id))
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Replace a note's title and content and refresh its update timestamp.
    pub async fn update(&self, id: &str, input: NoteInput) -> Result<Note, Error> {
        let id = NoteId::parse(id)?;
        let (title, content) = self.validate(input)?;
        let db = self.connect().await?;

        let existing = self
            .bounded("get", db.get_note(id))
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let note = Note {
            title,
            content,
            updated_at: next_updated_at(existing.updated_at),
            ..existing
        };

        // The document may have been deleted between the read and the write.
        if !self.bounded("replace", db.replace_note(&note)).await? {
            return Err(Error::NotFound(id.to_string()));
        }

        tracing::info!(note_id = %note.id, "Note updated.");
        Ok(note)
    }

    /// Permanently delete a note.
    pub async fn delete_by_id(&self, id: &str) -> Result<(), Error> {
        let id = NoteId::parse(id)?;
        let db = self.connect().await?;

        if !self.bounded("delete", db.delete_note(id)).await? {
            return Err(Error::NotFound(id.to_string()));
        }

        tracing::info!(note_id = %id, "Note deleted.");
        Ok(())
    }

    /// Trim and check a title/content pair.
    pub fn validate(&self, input: NoteInput) -> Result<(String, String), Error> {
        let title = input.title.trim().to_string();
        let content = input.content.trim().to_string();

        if title.is_empty() {
            return Err(Error::Validation("Title is required".into()));
        }
        if content.is_empty() {
            return Err(Error::Validation("Content is required".into()));
        }
        if title.chars().count() > self.settings.max_title_chars {
            return Err(Error::Validation(format!(
                "Title cannot be more than {} characters",
                self.settings.max_title_chars
            )));
        }

        Ok((title, content))
    }

    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        let limit = self.settings.op_timeout;
        tokio::time::timeout(limit, fut).await.map_err(|_| {
            Error::Timeout(format!("{} did not finish within {}ms", op, limit.as_millis()))
        })?
    }
}

/// A new update timestamp strictly after `previous`.
fn next_updated_at(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = timestamp::now();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::milliseconds(1)
    }
}
