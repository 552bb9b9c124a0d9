//! View models for the note form and a single note in the list.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};
use jotter_core::{Note, NoteId, NoteInput, DEFAULT_MAX_TITLE_CHARS};

use crate::{ClientError, NotesApi, NotesState};

const DATE_FORMAT: &str = "%b %d, %Y %H:%M";

/// Whether a form creates a new note or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(NoteId),
}

/// Draft title and content for creating or editing a note.
#[derive(Debug, Clone)]
pub struct NoteForm {
    mode: FormMode,
    title: String,
    content: String,
    max_title_chars: usize,
    busy: bool,
    error: Option<String>,
}

impl NoteForm {
    /// A form seeded from `note`, or an empty create form.
    pub fn new(note: Option<&Note>) -> Self {
        Self::with_max_title(note, DEFAULT_MAX_TITLE_CHARS)
    }

    pub fn with_max_title(note: Option<&Note>, max_title_chars: usize) -> Self {
        let mut form = Self {
            mode: note.map_or(FormMode::Create, |n| FormMode::Edit(n.id)),
            title: String::new(),
            content: String::new(),
            max_title_chars,
            busy: false,
            error: None,
        };
        if let Some(note) = note {
            form.set_title(&note.title);
            form.set_content(&note.content);
        }
        form
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Label of the submit action.
    pub fn submit_label(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "Create Note",
            FormMode::Edit(_) => "Update Note",
        }
    }

    /// Set the draft title. Input past the length limit is dropped.
    pub fn set_title(&mut self, value: &str) {
        self.title = value.chars().take(self.max_title_chars).collect();
    }

    pub fn set_content(&mut self, value: &str) {
        self.content = value.to_string();
    }

    /// Send the draft through `state`. Returns the saved note on success.
    pub async fn submit<A: NotesApi>(&mut self, state: &mut NotesState<A>) -> Option<Note> {
        let input = self.begin_submit()?;
        let result = match self.mode {
            FormMode::Create => state.create(input).await,
            FormMode::Edit(id) => state.update(&id.to_string(), input).await,
        };
        self.finish(result)
    }

    /// Check the draft and mark the form busy. Returns the request body, or
    /// `None` if a field is blank (no request should be sent).
    pub fn begin_submit(&mut self) -> Option<NoteInput> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            self.error = Some("Please fill in all fields".to_string());
            return None;
        }

        self.error = None;
        self.busy = true;
        Some(NoteInput::new(self.title.clone(), self.content.clone()))
    }

    /// Record the outcome of a request started with [`NoteForm::begin_submit`].
    ///
    /// A create form clears its draft once saved; an edit form and any failed
    /// submit keep it.
    pub fn finish(&mut self, result: Result<Note, ClientError>) -> Option<Note> {
        self.busy = false;
        match result {
            Ok(note) => {
                if self.mode == FormMode::Create {
                    self.title.clear();
                    self.content.clear();
                }
                Some(note)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        }
    }
}

/// One note as shown in the list.
#[derive(Debug, Clone, Copy)]
pub struct NoteItem<'a> {
    note: &'a Note,
}

impl<'a> NoteItem<'a> {
    pub fn new(note: &'a Note) -> Self {
        Self { note }
    }

    pub fn title(&self) -> &'a str {
        &self.note.title
    }

    pub fn content(&self) -> &'a str {
        &self.note.content
    }

    /// `Created: ...`, plus `• Updated: ...` once the note has been edited.
    pub fn dates_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut line = format!("Created: {}", format_date(&self.note.created_at, tz));
        if self.note.was_updated() {
            line.push_str(" \u{2022} Updated: ");
            line.push_str(&format_date(&self.note.updated_at, tz));
        }
        line
    }

    /// Dates in the local time zone.
    pub fn dates(&self) -> String {
        self.dates_in(&Local)
    }

    /// Title, content and dates as printable lines.
    pub fn render_in<Tz>(&self, tz: &Tz) -> Vec<String>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut lines = vec![self.title().to_string()];
        lines.extend(self.content().lines().map(str::to_string));
        lines.push(self.dates_in(tz));
        lines
    }

    pub fn render(&self) -> Vec<String> {
        self.render_in(&Local)
    }

    /// The note to open in an edit form.
    pub fn edit(&self) -> Note {
        self.note.clone()
    }

    /// The id to delete.
    pub fn delete(&self) -> NoteId {
        self.note.id
    }
}

fn format_date<Tz>(at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(tz).format(DATE_FORMAT).to_string()
}
