//! List view model.
//!
//! Derives the displayed note list from the full collection, an optional
//! category filter, and a free-text search string.

use crate::Note;

/// Filter inputs for the derived note list.
#[derive(Debug, Clone, Default)]
pub struct NoteQuery {
    /// Restrict to notes assigned to this category id
    pub category: Option<String>,
    /// Case-insensitive substring matched against title, body, and tags
    pub search: String,
}

/// Returns the notes matching `query`, sorted for display: pinned notes
/// first, each group ordered by descending update time. The sort is stable,
/// so notes with equal pin state and timestamp keep their store order.
pub fn visible_notes<'a>(notes: &'a [Note], query: &NoteQuery) -> Vec<&'a Note> {
    let needle = query.search.trim().to_lowercase();

    let mut visible: Vec<&Note> = notes
        .iter()
        .filter(|note| match query.category.as_deref() {
            Some(category) => note.category.as_deref() == Some(category),
            None => true,
        })
        .filter(|note| needle.is_empty() || matches_search(note, &needle))
        .collect();

    visible.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then(b.updated_at.cmp(&a.updated_at))
    });
    visible
}

fn matches_search(note: &Note, needle: &str) -> bool {
    note.title.to_lowercase().contains(needle)
        || note.content.to_lowercase().contains(needle)
        || note.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
}
