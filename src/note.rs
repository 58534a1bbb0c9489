//! Core data structures for the quillbox library.
//!
//! This module contains the primary entities of the note model, the `Note`
//! and `Category` structures, along with their constructors.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Fixed palette a new category's color label is drawn from at random.
pub const CATEGORY_COLORS: [&str; 10] = [
    "amber", "rose", "blue", "green", "purple", "orange", "teal", "pink", "indigo", "cyan",
];

/// Represents a single note in our system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier for the note, immutable after creation
    pub id: String,
    /// Note title
    pub title: String,
    /// Note content in Markdown format
    pub content: String,
    /// Tags for organization
    #[serde(default)]
    pub tags: Vec<String>,
    /// When the note was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
    /// Weak reference to a category id; the category may no longer exist
    #[serde(default)]
    pub category: Option<String>,
    /// Pinned notes sort ahead of all others regardless of recency
    #[serde(default)]
    pub pinned: bool,
    /// Embedded images as data URIs, in insertion order
    #[serde(default)]
    pub images: Vec<String>,
    /// Collaborator identifiers (declared, currently unused)
    #[serde(default)]
    pub collaborators: Vec<String>,
    /// Transient UI flag driven by the editor's debounced save indicator
    #[serde(skip)]
    pub saving: bool,
}

impl Note {
    /// Creates a new note with the given title and content
    pub fn new(title: String, content: String, tags: Vec<String>) -> Self {
        let now = Utc::now();
        // Generate a unique ID using timestamp and title
        let id = format!(
            "{}-{}",
            now.timestamp_millis(),
            title.to_lowercase().replace(' ', "-")
        );

        Note {
            id,
            title,
            content,
            tags,
            created_at: now,
            updated_at: now,
            category: None,
            pinned: false,
            images: Vec::new(),
            collaborators: Vec::new(),
            saving: false,
        }
    }
}

/// A named, colored grouping label assignable to notes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier for the category
    pub id: String,
    /// Display name
    pub name: String,
    /// Color label drawn from [`CATEGORY_COLORS`] on creation
    pub color: String,
}

impl Category {
    /// Creates a new category with a randomly assigned palette color
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        let id = format!(
            "{}-{}",
            now.timestamp_millis(),
            name.to_lowercase().replace(' ', "-")
        );
        let color = CATEGORY_COLORS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("amber")
            .to_string();

        Category { id, name, color }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_note_has_matching_timestamps_and_defaults() {
        let note = Note::new("Groceries".to_string(), "- milk".to_string(), vec![]);
        assert_eq!(note.created_at, note.updated_at);
        assert!(!note.pinned);
        assert!(!note.saving);
        assert!(note.category.is_none());
        assert!(note.images.is_empty());
        assert!(note.id.ends_with("-groceries"));
    }

    #[test]
    fn category_color_comes_from_palette() {
        let category = Category::new("Work".to_string());
        assert!(CATEGORY_COLORS.contains(&category.color.as_str()));
    }

    #[test]
    fn saving_flag_is_not_persisted() {
        let mut note = Note::new("t".to_string(), "c".to_string(), vec![]);
        note.saving = true;
        let json = serde_json::to_string(&note).unwrap();
        let back: Note = serde_json::from_str(&json).unwrap();
        assert!(!back.saving);
    }
}
