use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Directory holding the persisted key-value store files
    pub data_dir: PathBuf,

    /// Quiet period for the editor's saving indicator, in milliseconds
    pub autosave_quiet_ms: u64,

    /// Maximum size of a file embedded as an image data URI, in bytes
    pub max_image_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = ProjectDirs::from("", "", "quillbox")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            data_dir,
            autosave_quiet_ms: 1000,
            max_image_bytes: 8 * 1024 * 1024,
        }
    }
}
