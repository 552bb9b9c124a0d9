use crate::{Error, Note, NoteId};

/// A document collection holding one document per note.
///
/// Implementations serialize their own access; callers may share one handle
/// across tasks.
#[async_trait::async_trait]
pub trait Database: Send + Sync {
    /// Run a trivial round trip to prove the store is reachable.
    async fn ping(&self) -> Result<(), Error>;

    /// Insert a new note document.
    async fn insert_note(&self, note: &Note) -> Result<(), Error>;

    /// Get a note by ID.
    async fn get_note(&self, id: NoteId) -> Result<Option<Note>, Error>;

    /// List every note, most recently updated first.
    async fn list_notes(&self) -> Result<Vec<Note>, Error>;

    /// Overwrite the stored document with the same ID. Returns false if it does not exist.
    async fn replace_note(&self, note: &Note) -> Result<bool, Error>;

    /// Delete a note by ID. Returns true if deleted, false if not found.
    async fn delete_note(&self, id: NoteId) -> Result<bool, Error>;
}

/// Opens a [`Database`] handle. Called at most once per successful connection.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    type Db: Database;

    async fn connect(&self) -> Result<Self::Db, Error>;
}
