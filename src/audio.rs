//! Playback engine and audio backends.
//!
//! The engine owns one resource per load and turns the resource's raw events
//! into session state. `RodioBackend` renders through the default output
//! device.

mod backend;
mod engine;
mod sink;
pub mod source;
mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use backend::{AudioBackend, AudioResource, EventSink};
pub use engine::PlaybackEngine;
pub use sink::RodioBackend;
pub use types::{
    EngineEvent, EventOrigin, PlaybackError, PlaybackErrorKind, PlaybackState, ResourceEvent,
    StartFailure,
};

#[cfg(test)]
mod tests;
