use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/sonicloud/config.toml` or `~/.config/sonicloud/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SONICLOUD__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub ui: UiSettings,
    pub controls: ControlsSettings,
    pub session: SessionSettings,
    pub upload: UploadSettings,
    pub library: LibrarySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Volume of a fresh session, 0.0 to 1.0.
    pub initial_volume: f32,
    /// Volume change per key press.
    pub volume_step: f32,
    /// How often the event loop lets the audio resource report progress (milliseconds).
    pub tick_ms: u64,
    /// Give up on a remote source after this many seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            initial_volume: 0.75,
            volume_step: 0.05,
            tick_ms: 200,
            fetch_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,

    /// Which track fields to show in the player bar, and in what order.
    ///
    /// Example: ["artist", "title", "genre"]
    pub now_playing_track_fields: Vec<TrackDisplayField>,

    /// Separator used to join `now_playing_track_fields`.
    pub now_playing_track_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " SONICLOUD ".to_string(),
            now_playing_track_fields: vec![TrackDisplayField::Title, TrackDisplayField::Artist],
            now_playing_track_separator: " - ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing the seek keys.
    pub scrub_seconds: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self { scrub_seconds: 5 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Reload the audio resource when only the metadata of the playing track
    /// was edited. A changed audio source always reloads.
    pub reload_on_metadata_edit: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Largest accepted audio upload, in bytes.
    pub max_audio_bytes: u64,
    /// Largest accepted cover art upload, in bytes.
    pub max_image_bytes: u64,
    /// Cover art used by folder import when a file has no embedded picture.
    pub fallback_cover: String,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_audio_bytes: 5_242_880,
            max_image_bytes: 5_242_880,
            fallback_cover: "https://picsum.photos/seed/sonicloud/300/300".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Catalog file. Defaults to `$XDG_DATA_HOME/sonicloud/catalog.toml`.
    pub catalog_path: Option<PathBuf>,
    /// File extensions picked up by folder import (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during import.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            catalog_path: None,
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    Title,
    Artist,
    Genre,
}
