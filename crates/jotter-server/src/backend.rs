//! Connection-string dispatch to a concrete document store.

use jotter_core::{Connector, Database, Error, MemoryDatabase, Note, NoteId};
use jotter_files::{FilesConnector, FilesDatabase};
use jotter_sqlite::{SqliteConnector, SqliteDatabase};

/// A connected store of whichever kind the connection string selected.
pub enum Backend {
    Sqlite(SqliteDatabase),
    Files(FilesDatabase),
    Memory(MemoryDatabase),
}

impl Backend {
    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Sqlite(_) => "sqlite",
            Backend::Files(_) => "files",
            Backend::Memory(_) => "memory",
        }
    }

    fn inner(&self) -> &dyn Database {
        match self {
            Backend::Sqlite(db) => db,
            Backend::Files(db) => db,
            Backend::Memory(db) => db,
        }
    }
}

#[async_trait::async_trait]
impl Database for Backend {
    async fn ping(&self) -> Result<(), Error> {
        self.inner().ping().await
    }

    async fn insert_note(&self, note: &Note) -> Result<(), Error> {
        self.inner().insert_note(note).await
    }

    async fn get_note(&self, id: NoteId) -> Result<Option<Note>, Error> {
        self.inner().get_note(id).await
    }

    async fn list_notes(&self) -> Result<Vec<Note>, Error> {
        self.inner().list_notes().await
    }

    async fn replace_note(&self, note: &Note) -> Result<bool, Error> {
        self.inner().replace_note(note).await
    }

    async fn delete_note(&self, id: NoteId) -> Result<bool, Error> {
        self.inner().delete_note(id).await
    }
}

/// Picks a backend from the scheme of a connection string.
#[derive(Debug, Clone)]
pub struct UrlConnector {
    url: String,
}

impl UrlConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait::async_trait]
impl Connector for UrlConnector {
    type Db = Backend;

    async fn connect(&self) -> Result<Backend, Error> {
        let backend = if let Some(connector) = SqliteConnector::from_url(&self.url) {
            Backend::Sqlite(connector?.connect().await?)
        } else if let Some(connector) = FilesConnector::from_url(&self.url) {
            Backend::Files(connector?.connect().await?)
        } else if self.url == "memory://" {
            Backend::Memory(MemoryDatabase::new())
        } else {
            let scheme = self.url.split("://").next().unwrap_or_default();
            return Err(Error::Connection(format!(
                "unsupported connection string scheme {:?}",
                scheme
            )));
        };

        tracing::info!(backend = backend.kind(), "Opened document store.");
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connects_by_scheme() {
        let backend = UrlConnector::new("sqlite::memory:").connect().await.unwrap();
        assert_eq!(backend.kind(), "sqlite");

        let backend = UrlConnector::new("memory://").connect().await.unwrap();
        assert_eq!(backend.kind(), "memory");

        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("files://{}", dir.path().display());
        let backend = UrlConnector::new(url).connect().await.unwrap();
        assert_eq!(backend.kind(), "files");
        backend.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_scheme_is_connection_error() {
        let err = UrlConnector::new("mongodb://127.0.0.1:27017/notesapp")
            .connect()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Connection(ref m) if m.contains("mongodb")));

        assert!(matches!(
            UrlConnector::new("not a url").connect().await,
            Err(Error::Connection(_))
        ));
    }
}
