use std::fmt;
use std::str::FromStr;

use jotter_core::Note;

/// How the visible list is ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Most recently updated first.
    #[default]
    Newest,
    /// Least recently updated first.
    Oldest,
    /// By title, case-sensitive.
    Title,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::Title => "title",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "title" => Ok(SortOrder::Title),
            other => Err(format!(
                "unknown sort order {:?} (expected newest, oldest or title)",
                other
            )),
        }
    }
}

/// The notes to display: those whose title or content contains `query`
/// (case-insensitive), in the requested order. An empty query matches everything.
pub fn derive_view(notes: &[Note], query: &str, order: SortOrder) -> Vec<Note> {
    let needle = query.to_lowercase();
    let mut visible: Vec<Note> = notes
        .iter()
        .filter(|note| {
            needle.is_empty()
                || note.title.to_lowercase().contains(&needle)
                || note.content.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();

    // `sort_by` is stable, so equal keys keep their relative order.
    match order {
        SortOrder::Newest => visible.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        SortOrder::Oldest => visible.sort_by(|a, b| a.updated_at.cmp(&b.updated_at)),
        SortOrder::Title => visible.sort_by(|a, b| a.title.cmp(&b.title)),
    }
    visible
}
