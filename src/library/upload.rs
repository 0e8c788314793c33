//! File-to-URI conversion for uploads.
//!
//! Uploaded audio and cover art are inlined into the catalog as base64
//! `data:` URIs. Oversized files are rejected before any bytes are read.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;
use tracing::debug;

use crate::config::UploadSettings;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UploadKind {
    Audio,
    Image,
}

impl UploadKind {
    fn max_bytes(self, settings: &UploadSettings) -> u64 {
        match self {
            Self::Audio => settings.max_audio_bytes,
            Self::Image => settings.max_image_bytes,
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{} size must be less than {}", kind_label(.kind), size_label(.max))]
    TooLarge { kind: UploadKind, size: u64, max: u64 },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn kind_label(kind: &UploadKind) -> &'static str {
    match kind {
        UploadKind::Audio => "Audio file",
        UploadKind::Image => "Image",
    }
}

fn size_label(bytes: &u64) -> String {
    const MIB: u64 = 1024 * 1024;
    let bytes = *bytes;
    if bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}

/// Guess a MIME type from the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" | "mp4" | "aac" => "audio/mp4",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Encode raw bytes as a base64 `data:` URI.
pub fn bytes_to_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Reject `size` when it exceeds the configured cap for `kind`.
pub fn check_size(size: u64, kind: UploadKind, settings: &UploadSettings) -> Result<(), UploadError> {
    let max = kind.max_bytes(settings);
    if size > max {
        return Err(UploadError::TooLarge { kind, size, max });
    }
    Ok(())
}

/// Convert a local file into a `data:` URI.
pub fn file_to_data_uri(
    path: &Path,
    kind: UploadKind,
    settings: &UploadSettings,
) -> Result<String, UploadError> {
    let io_err = |source: std::io::Error| UploadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let size = fs::metadata(path).map_err(io_err)?.len();
    check_size(size, kind, settings)?;

    let bytes = fs::read(path).map_err(io_err)?;
    debug!(path = %path.display(), size, "file converted to data uri");
    Ok(bytes_to_data_uri(&bytes, mime_for_path(path)))
}

/// True for references that can be stored as-is (no upload needed).
pub fn is_uri(reference: &str) -> bool {
    ["data:", "http://", "https://", "file://"]
        .iter()
        .any(|scheme| reference.starts_with(scheme))
}

/// Keep URIs untouched; convert anything else as a local file path.
///
/// A blank reference resolves to an empty string so draft validation can
/// report the missing field.
pub fn resolve_reference(
    reference: &str,
    kind: UploadKind,
    settings: &UploadSettings,
) -> Result<String, UploadError> {
    let reference = reference.trim();
    if reference.is_empty() {
        Ok(String::new())
    } else if is_uri(reference) {
        Ok(reference.to_string())
    } else {
        file_to_data_uri(Path::new(reference), kind, settings)
    }
}
