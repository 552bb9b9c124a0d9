//! In-process store, used for tests and `memory://` connection strings.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::{sort_recent_first, Connector, Database, Error, Note, NoteId};

#[derive(Debug, Default)]
pub struct MemoryDatabase {
    notes: Mutex<HashMap<NoteId, Note>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<NoteId, Note>>, Error> {
        self.notes
            .lock()
            .map_err(|_| Error::Database("memory store lock poisoned".into()))
    }
}

#[async_trait::async_trait]
impl Database for MemoryDatabase {
    async fn ping(&self) -> Result<(), Error> {
        self.lock().map(|_| ())
    }

    async fn insert_note(&self, note: &Note) -> Result<(), Error> {
        let mut notes = self.lock()?;
        if notes.contains_key(&note.id) {
            return Err(Error::Database(format!("duplicate note id {}", note.id)));
        }
        notes.insert(note.id, note.clone());
        Ok(())
    }

    async fn get_note(&self, id: NoteId) -> Result<Option<Note>, Error> {
        Ok(self.lock()?.get(&id).cloned())
    }

    async fn list_notes(&self) -> Result<Vec<Note>, Error> {
        let mut notes: Vec<Note> = self.lock()?.values().cloned().collect();
        sort_recent_first(&mut notes);
        Ok(notes)
    }

    async fn replace_note(&self, note: &Note) -> Result<bool, Error> {
        let mut notes = self.lock()?;
        match notes.get_mut(&note.id) {
            Some(existing) => {
                *existing = note.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_note(&self, id: NoteId) -> Result<bool, Error> {
        Ok(self.lock()?.remove(&id).is_some())
    }
}

/// Connects to a fresh, empty [`MemoryDatabase`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryConnector;

#[async_trait::async_trait]
impl Connector for MemoryConnector {
    type Db = MemoryDatabase;

    async fn connect(&self) -> Result<MemoryDatabase, Error> {
        Ok(MemoryDatabase::new())
    }
}
