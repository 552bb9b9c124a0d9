//! Client-side notes state.
//!
//! [`NotesState`] holds the last fetched notes plus what the user is doing
//! with them. Every mutation goes through the server first; local state only
//! changes once the server has confirmed it. A failed request records the
//! server's message in [`NotesState::error`] and leaves everything else as it
//! was.

use jotter_core::{Note, NoteId, NoteInput};

use crate::view::{derive_view, SortOrder};
use crate::{ClientError, NotesApi, TransitionError};

/// What the user is currently doing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Editing {
    #[default]
    Browsing,
    Creating,
    Editing(Note),
}

impl Editing {
    fn name(&self) -> &'static str {
        match self {
            Editing::Browsing => "browsing",
            Editing::Creating => "creating a note",
            Editing::Editing(_) => "editing a note",
        }
    }
}

pub struct NotesState<A: NotesApi> {
    api: A,
    notes: Vec<Note>,
    search_query: String,
    sort_order: SortOrder,
    editing: Editing,
    is_loading: bool,
    error: Option<String>,
}

impl<A: NotesApi> NotesState<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            notes: Vec::new(),
            search_query: String::new(),
            sort_order: SortOrder::default(),
            editing: Editing::Browsing,
            is_loading: false,
            error: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.sort_order = order;
    }

    pub fn editing(&self) -> &Editing {
        &self.editing
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Notes matching the search query, in the selected order.
    pub fn visible(&self) -> Vec<Note> {
        derive_view(&self.notes, &self.search_query, self.sort_order)
    }

    /// Replace the local notes with the server's list.
    pub async fn fetch_all(&mut self) -> Result<(), ClientError> {
        self.error = None;
        self.is_loading = true;
        let result = self.api.list().await;
        self.is_loading = false;

        let notes = self.record(result)?;
        tracing::debug!(count = notes.len(), "Fetched notes.");
        self.notes = notes;
        Ok(())
    }

    /// Create a note and show it at the top of the list.
    pub async fn create(&mut self, input: NoteInput) -> Result<Note, ClientError> {
        self.error = None;
        let result = self.api.create(&input).await;
        let note = self.record(result)?;

        self.notes.insert(0, note.clone());
        self.editing = Editing::Browsing;
        Ok(note)
    }

    /// Save changes to a note, keeping its position in the list.
    pub async fn update(&mut self, id: &str, input: NoteInput) -> Result<Note, ClientError> {
        self.error = None;
        let result = self.api.update(id, &input).await;
        let note = self.record(result)?;

        if let Some(slot) = self.notes.iter_mut().find(|n| n.id == note.id) {
            *slot = note.clone();
        }
        self.editing = Editing::Browsing;
        Ok(note)
    }

    /// Delete a note once `confirm` agrees. Returns `Ok(false)` if it did not.
    pub async fn delete(
        &mut self,
        id: &str,
        confirm: impl FnOnce() -> bool,
    ) -> Result<bool, ClientError> {
        if !confirm() {
            return Ok(false);
        }

        self.error = None;
        let result = self.api.delete(id).await;
        self.record(result)?;

        // The server accepts ids in either case.
        if let Ok(id) = NoteId::parse(id) {
            self.notes.retain(|n| n.id != id);
        }
        Ok(true)
    }

    pub fn begin_create(&mut self) -> Result<(), TransitionError> {
        self.require_browsing("start a new note")?;
        self.editing = Editing::Creating;
        Ok(())
    }

    pub fn begin_edit(&mut self, note: Note) -> Result<(), TransitionError> {
        self.require_browsing("edit a note")?;
        self.editing = Editing::Editing(note);
        Ok(())
    }

    /// Abandon the note being created or edited.
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        if self.editing == Editing::Browsing {
            return Err(TransitionError {
                action: "cancel",
                current: self.editing.name(),
            });
        }
        self.editing = Editing::Browsing;
        Ok(())
    }

    fn require_browsing(&self, action: &'static str) -> Result<(), TransitionError> {
        match self.editing {
            Editing::Browsing => Ok(()),
            ref other => Err(TransitionError {
                action,
                current: other.name(),
            }),
        }
    }

    fn record<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        result.map_err(|err| {
            tracing::warn!(error = %err, "Request failed.");
            self.error = Some(err.to_string());
            err
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jotter_core::{timestamp, HealthStatus};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// In-process stand-in for the server. Requests fail with `fail_with` when set.
    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub notes: Mutex<Vec<Note>>,
        pub fail_with: Mutex<Option<ClientError>>,
        pub requests: Mutex<usize>,
        /// When set, `create` waits for this before answering.
        pub gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl FakeApi {
        pub fn with_notes(notes: Vec<Note>) -> Self {
            Self {
                notes: Mutex::new(notes),
                ..Default::default()
            }
        }

        pub fn fail(&self, err: ClientError) {
            *self.fail_with.lock().unwrap() = Some(err);
        }

        fn begin(&self) -> Result<(), ClientError> {
            *self.requests.lock().unwrap() += 1;
            match self.fail_with.lock().unwrap().clone() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        fn parse_id(id: &str) -> Result<NoteId, ClientError> {
            NoteId::parse(id).map_err(|_| ClientError::Api {
                status: 400,
                message: "Invalid note ID".to_string(),
            })
        }

        fn not_found() -> ClientError {
            ClientError::Api {
                status: 404,
                message: "Note not found".to_string(),
            }
        }
    }

    #[async_trait::async_trait]
    impl NotesApi for FakeApi {
        async fn list(&self) -> Result<Vec<Note>, ClientError> {
            self.begin()?;
            Ok(self.notes.lock().unwrap().clone())
        }

        async fn get(&self, id: &str) -> Result<Note, ClientError> {
            self.begin()?;
            let id = Self::parse_id(id)?;
            let notes = self.notes.lock().unwrap();
            notes
                .iter()
                .find(|n| n.id == id)
                .cloned()
                .ok_or_else(Self::not_found)
        }

        async fn create(&self, input: &NoteInput) -> Result<Note, ClientError> {
            self.begin()?;
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            let now = timestamp::now();
            let note = Note {
                id: NoteId::generate(),
                title: input.title.trim().to_string(),
                content: input.content.trim().to_string(),
                created_at: now,
                updated_at: now,
            };
            self.notes.lock().unwrap().insert(0, note.clone());
            Ok(note)
        }

        async fn update(&self, id: &str, input: &NoteInput) -> Result<Note, ClientError> {
            self.begin()?;
            let id = Self::parse_id(id)?;
            let mut notes = self.notes.lock().unwrap();
            let note = notes
                .iter_mut()
                .find(|n| n.id == id)
                .ok_or_else(Self::not_found)?;
            note.title = input.title.trim().to_string();
            note.content = input.content.trim().to_string();
            note.updated_at = note.updated_at + chrono::Duration::milliseconds(1);
            Ok(note.clone())
        }

        async fn delete(&self, id: &str) -> Result<(), ClientError> {
            self.begin()?;
            let id = Self::parse_id(id)?;
            let mut notes = self.notes.lock().unwrap();
            let before = notes.len();
            notes.retain(|n| n.id != id);
            if notes.len() == before {
                return Err(Self::not_found());
            }
            Ok(())
        }

        async fn health(&self) -> Result<HealthStatus, ClientError> {
            self.begin()?;
            Ok(HealthStatus {
                message: "Database connected successfully".to_string(),
                version: "test".to_string(),
            })
        }
    }

    pub(crate) fn sample(title: &str) -> Note {
        let now = timestamp::now();
        Note {
            id: NoteId::generate(),
            title: title.to_string(),
            content: format!("{} content", title),
            created_at: now,
            updated_at: now,
        }
    }

    fn server_error() -> ClientError {
        ClientError::Api {
            status: 500,
            message: "Failed to fetch notes".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_all_replaces_notes() {
        let mut state = NotesState::new(FakeApi::with_notes(vec![sample("a"), sample("b")]));

        state.fetch_all().await.unwrap();

        assert_eq!(state.notes().len(), 2);
        assert!(!state.is_loading());
        assert!(state.error().is_none());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_notes_and_records_message() {
        let mut state = NotesState::new(FakeApi::with_notes(vec![sample("a")]));
        state.fetch_all().await.unwrap();

        state.api().fail(server_error());
        let err = state.fetch_all().await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(state.error(), Some("Failed to fetch notes"));
        assert_eq!(state.notes().len(), 1);
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_create_prepends_and_returns_to_browsing() {
        let mut state = NotesState::new(FakeApi::with_notes(vec![sample("existing")]));
        state.fetch_all().await.unwrap();
        state.begin_create().unwrap();

        let note = state
            .create(NoteInput::new("Groceries", "milk"))
            .await
            .unwrap();

        assert_eq!(state.notes()[0], note);
        assert_eq!(state.notes().len(), 2);
        assert_eq!(state.editing(), &Editing::Browsing);
    }

    #[tokio::test]
    async fn test_failed_create_stays_in_creating() {
        let mut state = NotesState::new(FakeApi::default());
        state.begin_create().unwrap();
        state.api().fail(ClientError::Api {
            status: 400,
            message: "Title is required".to_string(),
        });

        assert!(state.create(NoteInput::new("", "body")).await.is_err());

        assert_eq!(state.error(), Some("Title is required"));
        assert!(state.notes().is_empty());
        assert_eq!(state.editing(), &Editing::Creating);
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let notes = vec![sample("first"), sample("second"), sample("third")];
        let target = notes[1].clone();
        let mut state = NotesState::new(FakeApi::with_notes(notes));
        state.fetch_all().await.unwrap();
        state.begin_edit(target.clone()).unwrap();

        let updated = state
            .update(&target.id.to_string(), NoteInput::new("renamed", "new body"))
            .await
            .unwrap();

        assert_eq!(state.notes()[1], updated);
        assert_eq!(state.notes()[1].title, "renamed");
        assert_eq!(state.editing(), &Editing::Browsing);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let note = sample("doomed");
        let id = note.id.to_string();
        let mut state = NotesState::new(FakeApi::with_notes(vec![note]));
        state.fetch_all().await.unwrap();

        assert!(!state.delete(&id, || false).await.unwrap());
        assert_eq!(state.notes().len(), 1);
        assert_eq!(*state.api().requests.lock().unwrap(), 1);

        assert!(state.delete(&id, || true).await.unwrap());
        assert!(state.notes().is_empty());
    }

    #[tokio::test]
    async fn test_delete_with_uppercase_id_removes_local_note() {
        let mut state = NotesState::new(FakeApi::default());
        let note = state.create(NoteInput::new("Groceries", "milk")).await.unwrap();

        let id = note.id.to_string().to_uppercase();
        assert!(state.delete(&id, || true).await.unwrap());

        assert!(state.api().list().await.unwrap().is_empty());
        assert!(state.notes().is_empty());
    }

    #[tokio::test]
    async fn test_update_with_uppercase_id_replaces_local_note() {
        let mut state = NotesState::new(FakeApi::default());
        let note = state.create(NoteInput::new("before", "body")).await.unwrap();

        let id = note.id.to_string().to_uppercase();
        state.update(&id, NoteInput::new("after", "body")).await.unwrap();

        assert_eq!(state.notes().len(), 1);
        assert_eq!(state.notes()[0].title, "after");
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_note() {
        let note = sample("kept");
        let mut state = NotesState::new(FakeApi::with_notes(vec![note.clone()]));
        state.fetch_all().await.unwrap();
        state.api().fail(ClientError::Timeout);

        assert!(state.delete(&note.id.to_string(), || true).await.is_err());

        assert_eq!(state.error(), Some("Request timed out"));
        assert_eq!(state.notes(), &[note]);
    }

    #[tokio::test]
    async fn test_error_is_cleared_by_next_operation() {
        let mut state = NotesState::new(FakeApi::default());
        state.api().fail(server_error());
        assert!(state.fetch_all().await.is_err());
        assert!(state.error().is_some());

        *state.api().fail_with.lock().unwrap() = None;
        state.fetch_all().await.unwrap();
        assert!(state.error().is_none());
    }

    #[test]
    fn test_editing_transitions() {
        let mut state = NotesState::new(FakeApi::default());
        let note = sample("n");

        assert!(state.cancel().is_err());

        state.begin_create().unwrap();
        assert!(state.begin_create().is_err());
        assert!(state.begin_edit(note.clone()).is_err());
        state.cancel().unwrap();

        state.begin_edit(note.clone()).unwrap();
        assert_eq!(state.editing(), &Editing::Editing(note.clone()));
        let err = state.begin_create().unwrap_err();
        assert_eq!(err.to_string(), "cannot start a new note while editing a note");
        state.cancel().unwrap();
        assert_eq!(state.editing(), &Editing::Browsing);
    }

    #[tokio::test]
    async fn test_visible_applies_query_and_order() {
        let mut state = NotesState::new(FakeApi::with_notes(vec![
            sample("beta"),
            sample("Alpha"),
            sample("gamma"),
        ]));
        state.fetch_all().await.unwrap();

        state.set_sort_order(SortOrder::Title);
        let titles: Vec<String> = state.visible().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["Alpha", "beta", "gamma"]);

        state.set_search_query("MM");
        let visible = state.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "gamma");
        assert_eq!(state.notes().len(), 3);
    }
}
