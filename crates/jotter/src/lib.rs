//! Jotter client - talks to a jotter server and keeps the front-end state.

pub mod api;
pub mod components;
mod error;
pub mod state;
pub mod view;

pub use api::{HttpNotesApi, NotesApi};
pub use components::{FormMode, NoteForm, NoteItem};
pub use error::{ClientError, TransitionError};
pub use state::{Editing, NotesState};
pub use view::{derive_view, SortOrder};
