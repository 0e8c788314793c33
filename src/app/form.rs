//! The add/edit popup state.

use crate::config::UploadSettings;
use crate::library::upload::{self, UploadError, UploadKind};
use crate::library::{Track, TrackDraft, TrackId};

pub const FORM_LABELS: [&str; 5] = ["Title", "Artist", "Genre", "Audio", "Cover"];

const AUDIO: usize = 3;
const COVER: usize = 4;

/// Text fields of the upload/edit popup. Audio and cover accept a URI or a local file path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackForm {
    /// `Some` when editing an existing track.
    pub editing: Option<TrackId>,
    pub values: [String; 5],
    pub focus: usize,
}

impl TrackForm {
    pub fn create() -> Self {
        Self::default()
    }

    pub fn edit(track: &Track) -> Self {
        Self {
            editing: Some(track.id.clone()),
            values: [
                track.title.clone(),
                track.artist.clone(),
                track.genre.clone(),
                track.url.clone(),
                track.cover_art.clone(),
            ],
            focus: 0,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.values.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.values.len() - 1) % self.values.len();
    }

    pub fn push(&mut self, c: char) {
        self.values[self.focus].push(c);
    }

    pub fn pop(&mut self) {
        self.values[self.focus].pop();
    }

    /// Build the draft, inlining local files as `data:` URIs.
    pub fn to_draft(&self, uploads: &UploadSettings) -> Result<TrackDraft, UploadError> {
        Ok(TrackDraft {
            title: self.values[0].clone(),
            artist: self.values[1].clone(),
            genre: self.values[2].clone(),
            url: upload::resolve_reference(&self.values[AUDIO], UploadKind::Audio, uploads)?,
            cover_art: upload::resolve_reference(&self.values[COVER], UploadKind::Image, uploads)?,
        })
    }
}
