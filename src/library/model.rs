use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable catalog identifier. Generated once per published track and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub genre: String,
    /// Audio source reference: `data:` URI, remote URL, `file://` URI or plain path.
    pub url: String,
    /// Cover art reference, same URI forms as `url`.
    pub cover_art: String,
}

impl Track {
    pub fn from_draft(id: TrackId, draft: TrackDraft) -> Self {
        Self {
            id,
            title: draft.title,
            artist: draft.artist,
            genre: draft.genre,
            url: draft.url,
            cover_art: draft.cover_art,
        }
    }

    /// The editable part of the record.
    pub fn to_draft(&self) -> TrackDraft {
        TrackDraft {
            title: self.title.clone(),
            artist: self.artist.clone(),
            genre: self.genre.clone(),
            url: self.url.clone(),
            cover_art: self.cover_art.clone(),
        }
    }

    /// `Artist - Title`, the line shown in lists and the player bar.
    pub fn display(&self) -> String {
        format!("{} - {}", self.artist.trim(), self.title.trim())
    }
}

/// A track record without its identifier: the payload of the upload/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDraft {
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub url: String,
    pub cover_art: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Please provide all track details and files.")]
pub struct DraftError {
    /// Names of the fields left empty.
    pub missing: Vec<&'static str>,
}

impl TrackDraft {
    /// Every field must be non-empty before a track can be published.
    pub fn validate(&self) -> Result<(), DraftError> {
        let missing: Vec<&'static str> = [
            ("title", &self.title),
            ("artist", &self.artist),
            ("genre", &self.genre),
            ("audio", &self.url),
            ("cover", &self.cover_art),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DraftError { missing })
        }
    }
}
