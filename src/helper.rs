use std::path::Path;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use log::debug;

use crate::{QbError, Result};

// Helper method for parsing tag input
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Encodes raw file bytes as an image data URI, inferring the content type
/// from the file extension. Non-image content types are rejected.
pub fn image_data_uri(path: &Path, bytes: &[u8]) -> Result<String> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let essence = mime.essence_str().to_string();

    if !essence.starts_with("image/") {
        return Err(QbError::InvalidImage {
            path: path.to_path_buf(),
            message: format!("unsupported content type {}", essence),
        });
    }

    debug!(
        "Encoding {} ({} bytes) as {} data URI",
        path.display(),
        bytes.len(),
        essence
    );
    let encoded = BASE64_STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", essence, encoded))
}

/// Alt text for an embedded image: the file stem, falling back to "image".
pub fn image_alt_text(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string())
}
