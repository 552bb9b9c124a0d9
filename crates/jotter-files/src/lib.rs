//! File-based document store for jotter.
//!
//! Stores each note as a JSON document named after its id:
//!
//! ```text
//! notes-dir/
//!   .lock                              # Lock file for atomic operations
//!   notes/
//!     65a1f0c2e4b0a1b2c3d4e5f6.json
//!     65a1f0c9e4b0a1b2c3d4e5f7.json
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use jotter_core::{sort_recent_first, Connector, Database, Error, Note, NoteId};

/// File-based document store.
pub struct FilesDatabase {
    root: PathBuf,
}

impl FilesDatabase {
    /// Open a store rooted at the given directory, creating it if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, Error> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("notes"))
            .map_err(|e| Error::Connection(format!("Failed to create notes dir: {}", e)))?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Acquire an exclusive lock on the store.
    fn lock(&self) -> Result<FileLock, Error> {
        let lock_path = self.root.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| Error::Database(format!("Failed to open lock file: {}", e)))?;

        file.lock_exclusive()
            .map_err(|e| Error::Database(format!("Failed to acquire lock: {}", e)))?;

        Ok(FileLock { file })
    }

    fn note_path(&self, id: NoteId) -> PathBuf {
        self.root.join("notes").join(format!("{}.json", id))
    }

    /// Read a note document from disk.
    fn read_note(&self, id: NoteId) -> Result<Option<Note>, Error> {
        self.read_document(id)?
            .map(|contents| {
                serde_json::from_str(&contents)
                    .map_err(|e| Error::Database(format!("Failed to parse note: {}", e)))
            })
            .transpose()
    }

    /// Raw contents of a note document, if it exists.
    fn read_document(&self, id: NoteId) -> Result<Option<String>, Error> {
        let path = self.note_path(id);

        if !path.exists() {
            return Ok(None);
        }

        let mut file = File::open(&path)
            .map_err(|e| Error::Database(format!("Failed to open note: {}", e)))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| Error::Database(format!("Failed to read note: {}", e)))?;

        Ok(Some(contents))
    }

    /// Write a note document to disk atomically.
    fn write_note(&self, note: &Note) -> Result<(), Error> {
        let path = self.note_path(note.id);
        let temp_path = self
            .root
            .join("notes")
            .join(format!("{}.json.tmp", note.id));

        let contents = serde_json::to_string_pretty(note)
            .map_err(|e| Error::Database(format!("Failed to serialize note: {}", e)))?;

        let mut file = File::create(&temp_path)
            .map_err(|e| Error::Database(format!("Failed to create temp file: {}", e)))?;

        file.write_all(contents.as_bytes())
            .map_err(|e| Error::Database(format!("Failed to write temp file: {}", e)))?;

        file.sync_all()
            .map_err(|e| Error::Database(format!("Failed to sync temp file: {}", e)))?;

        fs::rename(&temp_path, &path)
            .map_err(|e| Error::Database(format!("Failed to rename temp file: {}", e)))?;

        Ok(())
    }

    /// Ids of every stored document. Files that are not named after an id are skipped.
    fn list_note_ids(&self) -> Result<Vec<NoteId>, Error> {
        let notes_dir = self.root.join("notes");
        let entries = fs::read_dir(&notes_dir)
            .map_err(|e| Error::Database(format!("Failed to read notes dir: {}", e)))?;

        let mut ids = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                match NoteId::parse(stem) {
                    Ok(id) => ids.push(id),
                    Err(_) => tracing::warn!(path = %path.display(), "Skipping unrecognised file."),
                }
            }
        }
        Ok(ids)
    }
}

/// RAII guard for file locking.
struct FileLock {
    file: File,
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[async_trait::async_trait]
impl Database for FilesDatabase {
    async fn ping(&self) -> Result<(), Error> {
        fs::metadata(self.root.join("notes"))
            .map(|_| ())
            .map_err(|e| Error::Connection(format!("Notes dir unavailable: {}", e)))
    }

    async fn insert_note(&self, note: &Note) -> Result<(), Error> {
        let _lock = self.lock()?;

        if self.note_path(note.id).exists() {
            return Err(Error::Database(format!("duplicate note id {}", note.id)));
        }
        self.write_note(note)
    }

    async fn get_note(&self, id: NoteId) -> Result<Option<Note>, Error> {
        self.read_note(id)
    }

    async fn list_notes(&self) -> Result<Vec<Note>, Error> {
        let mut notes = Vec::new();
        for id in self.list_note_ids()? {
            // A concurrent delete may remove the file between listing and reading.
            let Some(contents) = self.read_document(id)? else {
                continue;
            };
            match serde_json::from_str::<Note>(&contents) {
                Ok(note) => notes.push(note),
                Err(err) => {
                    tracing::warn!(note_id = %id, error = %err, "Skipping undecodable note.");
                }
            }
        }

        sort_recent_first(&mut notes);
        Ok(notes)
    }

    async fn replace_note(&self, note: &Note) -> Result<bool, Error> {
        let _lock = self.lock()?;

        if !self.note_path(note.id).exists() {
            return Ok(false);
        }
        self.write_note(note)?;
        Ok(true)
    }

    async fn delete_note(&self, id: NoteId) -> Result<bool, Error> {
        let _lock = self.lock()?;

        let path = self.note_path(id);
        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path)
            .map_err(|e| Error::Database(format!("Failed to delete note: {}", e)))?;

        Ok(true)
    }
}

/// Opens a [`FilesDatabase`] from a `files://<dir>` connection string.
#[derive(Debug, Clone)]
pub struct FilesConnector {
    root: PathBuf,
}

impl FilesConnector {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Parse a connection string. Returns `None` if it is not a `files://` URL.
    pub fn from_url(url: &str) -> Option<Result<Self, Error>> {
        let dir = url.strip_prefix("files://")?;
        if dir.is_empty() {
            return Some(Err(Error::Connection(
                "files connection string has no directory".into(),
            )));
        }
        Some(Ok(Self::new(dir)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait::async_trait]
impl Connector for FilesConnector {
    type Db = FilesDatabase;

    async fn connect(&self) -> Result<FilesDatabase, Error> {
        FilesDatabase::open(&self.root)
    }
}
