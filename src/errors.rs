//! Error types for the quillbox library.
//!
//! This module defines custom error types that categorize different failures
//! that can occur during note management operations.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the quillbox library.
#[derive(Error, Debug)]
pub enum QbError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Note was not found when performing an operation.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// Category was not found when performing an operation.
    #[error("Category not found: {id}")]
    CategoryNotFound { id: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// An attached file could not be embedded as an image.
    #[error("Invalid image {path}: {message}")]
    InvalidImage { path: PathBuf, message: String },

    /// No note is currently open in the editor.
    #[error("No note is open in the editor")]
    NoOpenNote,
}
