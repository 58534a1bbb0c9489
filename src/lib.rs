//! Headless core of a local-first note-taking application.
//!
//! This library provides the note and category store (persisted as JSON
//! collections in a profile-local key-value store), a markdown preview
//! renderer, a filtered and sorted list view model, an editor surface with
//! formatting commands and a debounced saving indicator, and a command
//! palette mapping named actions onto the editor.

mod config;
mod editor;
mod errors;
mod helper;
mod markdown;
mod note;
mod palette;
mod storage;
mod types;
mod view;

// Re-export key components
pub use config::*;
pub use editor::*;
pub use errors::*;
pub use helper::*;
pub use markdown::*;
pub use note::*;
pub use palette::*;
pub use storage::*;
pub use types::*;
pub use view::*;
