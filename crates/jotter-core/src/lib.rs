//! Jotter core library - note types, store traits, and the data-access layer.
//!
//! Storage backends live in their own crates and plug in through
//! [`Database`] and [`Connector`].

mod db;
mod envelope;
mod error;
mod memory;
mod note;
mod service;

pub use db::{Connector, Database};
pub use envelope::{ApiResponse, DeleteAck, HealthStatus};
pub use error::Error;
pub use memory::{MemoryConnector, MemoryDatabase};
pub use note::{sort_recent_first, timestamp, Note, NoteId, NoteInput};
pub use service::{NotesService, ServiceSettings, DEFAULT_MAX_TITLE_CHARS};
