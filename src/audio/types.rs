//! Audio-related small types.
//!
//! This module defines the error classes, the raw events an audio resource
//! reports and the events the playback engine republishes to the session.

use std::fmt;

use crate::library::{Track, TrackId};

/// Failure class of an audio resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlaybackErrorKind {
    /// Fetching was aborted.
    Aborted,
    /// The source could not be read or downloaded.
    Network,
    /// The bytes were read but could not be decoded.
    Decode,
    /// The source scheme or format is not playable.
    SourceUnsupported,
    /// The output refused to start.
    NotAllowed,
    Unknown,
}

impl PlaybackErrorKind {
    /// Banner text for this class.
    pub fn message(self) -> &'static str {
        match self {
            Self::Aborted => "Aborted",
            Self::Network => "Network error",
            Self::Decode => "Decoding failed",
            Self::SourceUnsupported => "Source not supported",
            Self::NotAllowed => "Playback not allowed",
            Self::Unknown => "An unknown error occurred",
        }
    }
}

/// A playback failure retained by the session until dismissed or the next load.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackError {
    pub kind: PlaybackErrorKind,
    pub message: String,
}

impl PlaybackError {
    pub fn new(kind: PlaybackErrorKind) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
        }
    }

    pub fn with_message(kind: PlaybackErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Why a requested start did not happen.
#[derive(Debug, Clone, PartialEq)]
pub enum StartFailure {
    /// The source cannot be played at all.
    NotSupported(String),
    /// The output refused to start.
    NotAllowed(String),
    /// The source already failed with this error.
    SourceFailed(PlaybackError),
    /// A pause or teardown overtook the start. Not an error.
    Interrupted,
}

/// Raw notifications posted by an audio resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    /// Decoding is set up; `duration` is `None` when the stream length is unknown.
    LoadedMetadata { duration: Option<f64> },
    TimeUpdate(f64),
    Ended,
    Failed(PlaybackError),
    /// Outcome of the latest `request_play`.
    StartResolved(Result<(), StartFailure>),
}

/// Identifies the resource instance an event came from.
///
/// Every load gets a fresh generation, so reloading the same track still
/// produces a distinct origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOrigin {
    pub track: TrackId,
    pub generation: u64,
}

/// Events the engine publishes after applying them to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Progress(f64),
    MetadataReady(Option<f64>),
    Ended,
    Error(PlaybackError),
}

/// Playback session state owned by the engine.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub current: Option<Track>,
    pub playing: bool,
    /// Elapsed seconds.
    pub position: f64,
    /// Total seconds, unknown until metadata arrives.
    pub duration: Option<f64>,
    /// 0.0 to 1.0, kept across loads.
    pub volume: f32,
    pub error: Option<PlaybackError>,
}

impl PlaybackState {
    pub fn new(volume: f32) -> Self {
        Self {
            current: None,
            playing: false,
            position: 0.0,
            duration: None,
            volume,
            error: None,
        }
    }

    pub fn current_id(&self) -> Option<&TrackId> {
        self.current.as_ref().map(|t| &t.id)
    }
}
