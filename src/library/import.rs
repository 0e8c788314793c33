use std::path::{Path, PathBuf};

use lofty::picture::PictureType;
use lofty::prelude::*;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::{LibrarySettings, UploadSettings};

use super::catalog::{Catalog, CatalogError};
use super::model::{TrackDraft, TrackId};
use super::upload::{self, UploadError, UploadKind};

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_GENRE: &str = "Unknown";

/// Outcome of a folder import.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<TrackId>,
    /// Files that were found but not published, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Collect audio files below `dir`, sorted by path.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.is_file() && (settings.include_hidden || !is_hidden(path)) && is_audio_file(path, settings)
        })
        .collect();

    files.sort();
    files
}

/// Sniff the image MIME type from its magic bytes.
fn image_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() > 11 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

fn non_empty(value: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build a publishable draft from one audio file: tags where present,
/// fallbacks otherwise. The audio itself goes through the upload size cap.
pub fn draft_from_file(path: &Path, settings: &UploadSettings) -> Result<TrackDraft, UploadError> {
    let url = upload::file_to_data_uri(path, UploadKind::Audio, settings)?;

    let mut title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let mut artist = UNKNOWN_ARTIST.to_string();
    let mut genre = UNKNOWN_GENRE.to_string();
    let mut cover_art = settings.fallback_cover.clone();

    if let Ok(tagged) = lofty::read_from_path(path) {
        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            if let Some(v) = non_empty(tag.title()) {
                title = v;
            }
            if let Some(v) = non_empty(tag.artist()) {
                artist = v;
            }
            if let Some(v) = non_empty(tag.genre()) {
                genre = v;
            }

            let front = tag
                .pictures()
                .iter()
                .find(|p| p.pic_type() == PictureType::CoverFront)
                .or_else(|| tag.pictures().first());
            if let Some(picture) = front {
                let data = picture.data();
                match upload::check_size(data.len() as u64, UploadKind::Image, settings) {
                    Ok(()) => cover_art = upload::bytes_to_data_uri(data, image_mime(data)),
                    Err(e) => warn!(path = %path.display(), "embedded cover skipped: {e}"),
                }
            }
        }
    }

    Ok(TrackDraft {
        title,
        artist,
        genre,
        url,
        cover_art,
    })
}

/// Publish every audio file below `dir` into `catalog`.
///
/// Upload rejections are collected in the report; a catalog failure aborts the import.
pub fn import_dir<C: Catalog + ?Sized>(
    dir: &Path,
    catalog: &mut C,
    library: &LibrarySettings,
    uploads: &UploadSettings,
) -> Result<ImportReport, CatalogError> {
    let mut report = ImportReport::default();

    for path in scan(dir, library) {
        match draft_from_file(&path, uploads) {
            Ok(draft) => {
                let id = catalog.create(draft)?;
                info!(path = %path.display(), track = %id, "imported");
                report.imported.push(id);
            }
            Err(e) => {
                warn!(path = %path.display(), "skipped: {e}");
                report.skipped.push((path, e.to_string()));
            }
        }
    }

    Ok(report)
}
