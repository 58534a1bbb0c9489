//! Shared auxiliary types for the quillbox library.

use serde::{Deserialize, Serialize};

use crate::QbError;

/// A specialized Result type for quillbox operations.
pub type Result<T> = std::result::Result<T, QbError>;

/// A partial-field update applied to an existing note.
///
/// Fields left as `None` keep their current value; the store refreshes the
/// note's `updated_at` timestamp whenever a non-empty patch is applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotePatch {
    /// New title, if changed
    pub title: Option<String>,
    /// New body content, if changed
    pub content: Option<String>,
    /// New tag list, if changed
    pub tags: Option<Vec<String>>,
    /// New category assignment; `Some(None)` clears the category
    pub category: Option<Option<String>>,
    /// New pinned state, if changed
    pub pinned: Option<bool>,
    /// New embedded image list, if changed
    pub images: Option<Vec<String>>,
}

impl NotePatch {
    /// Returns true if the patch would not change any field.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.category.is_none()
            && self.pinned.is_none()
            && self.images.is_none()
    }
}

/// Change notifications emitted by the store after each mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    NoteCreated { id: String },
    NoteUpdated { id: String },
    NoteDeleted { id: String },
    CategoryCreated { id: String },
    CategoryDeleted { id: String },
}
