use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, info, warn};

use crate::library::Track;

use super::backend::{AudioBackend, AudioResource, EventSink};
use super::types::{
    EngineEvent, EventOrigin, PlaybackError, PlaybackErrorKind, PlaybackState, ResourceEvent,
    StartFailure,
};

/// Drives exactly one audio resource bound to the current track.
///
/// Resources report through an `EventSink`; `dispatch` drains those reports,
/// drops anything not coming from the currently bound resource, applies the
/// rest to the session state and republishes them to subscribers.
pub struct PlaybackEngine<B: AudioBackend> {
    backend: B,
    resource: Option<Box<dyn AudioResource>>,
    origin: Option<EventOrigin>,
    generation: u64,
    tx: Sender<(EventOrigin, ResourceEvent)>,
    rx: Receiver<(EventOrigin, ResourceEvent)>,
    subscribers: Vec<Sender<EngineEvent>>,
    state: PlaybackState,
}

impl<B: AudioBackend> PlaybackEngine<B> {
    pub fn new(backend: B, volume: f32) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend,
            resource: None,
            origin: None,
            generation: 0,
            tx,
            rx,
            subscribers: Vec::new(),
            state: PlaybackState::new(clamp_volume(volume).unwrap_or(0.0)),
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Receive every event `dispatch` applies, in order.
    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Bind a fresh resource to `track`.
    ///
    /// Position, duration and error are reset; volume and the playing flag are kept.
    pub fn load(&mut self, track: Track) {
        self.teardown();

        self.generation += 1;
        let origin = EventOrigin {
            track: track.id.clone(),
            generation: self.generation,
        };
        info!(track = %track.id, generation = self.generation, "load");

        let sink = EventSink::new(origin.clone(), self.tx.clone());
        let mut resource = self.backend.open(&track, sink);
        resource.set_volume(self.state.volume);

        self.origin = Some(origin);
        self.state.current = Some(track);
        self.state.position = 0.0;
        self.state.duration = None;
        self.state.error = None;

        if self.state.playing {
            resource.request_play();
        }
        self.resource = Some(resource);
    }

    /// Tear down the resource and forget the current track.
    pub fn unload(&mut self) {
        self.teardown();
        self.state.current = None;
        self.state.playing = false;
        self.state.position = 0.0;
        self.state.duration = None;
        self.state.error = None;
    }

    pub fn set_playing(&mut self, playing: bool) {
        let Some(resource) = self.resource.as_mut() else {
            if playing {
                debug!("play requested with no track loaded");
            }
            self.state.playing = false;
            return;
        };

        self.state.playing = playing;
        if playing {
            resource.request_play();
        } else {
            resource.pause();
        }
    }

    /// Move the playhead. The target is not clamped.
    pub fn seek(&mut self, seconds: f64) {
        if let Some(resource) = self.resource.as_mut() {
            resource.seek(seconds);
            self.state.position = seconds;
        }
    }

    /// Set the session volume; non-finite values are ignored.
    pub fn set_volume(&mut self, level: f32) {
        let Some(level) = clamp_volume(level) else {
            return;
        };
        self.state.volume = level;
        if let Some(resource) = self.resource.as_mut() {
            resource.set_volume(level);
        }
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    /// Swap the displayed metadata of the loaded track without touching its resource.
    pub fn replace_track_metadata(&mut self, track: Track) {
        match self.state.current.as_mut() {
            Some(current) if current.id == track.id => *current = track,
            _ => debug!(track = %track.id, "metadata replacement for a track that is not loaded"),
        }
    }

    pub fn tick(&mut self) {
        if let Some(resource) = self.resource.as_mut() {
            resource.tick();
        }
    }

    /// Apply every queued resource event and return what was applied.
    pub fn dispatch(&mut self) -> Vec<EngineEvent> {
        let mut applied = Vec::new();

        while let Ok((origin, event)) = self.rx.try_recv() {
            if self.origin.as_ref() != Some(&origin) {
                debug!(
                    track = %origin.track,
                    generation = origin.generation,
                    "discarding event from a stale resource"
                );
                continue;
            }
            if let Some(event) = self.apply(event) {
                applied.push(event);
            }
        }

        if !applied.is_empty() {
            self.subscribers
                .retain(|tx| applied.iter().all(|e| tx.send(e.clone()).is_ok()));
        }
        applied
    }

    fn apply(&mut self, event: ResourceEvent) -> Option<EngineEvent> {
        match event {
            ResourceEvent::LoadedMetadata { duration } => {
                self.state.duration = duration;
                self.state.error = None;
                Some(EngineEvent::MetadataReady(duration))
            }
            ResourceEvent::TimeUpdate(seconds) => {
                self.state.position = seconds;
                Some(EngineEvent::Progress(seconds))
            }
            ResourceEvent::Ended => {
                self.state.playing = false;
                Some(EngineEvent::Ended)
            }
            ResourceEvent::Failed(error) => Some(self.fail(error)),
            ResourceEvent::StartResolved(Ok(())) => None,
            ResourceEvent::StartResolved(Err(failure)) => match failure {
                StartFailure::NotSupported(reason) => Some(self.fail(PlaybackError::with_message(
                    PlaybackErrorKind::SourceUnsupported,
                    format!("Playback failed: {reason}"),
                ))),
                StartFailure::NotAllowed(reason) => Some(self.fail(PlaybackError::with_message(
                    PlaybackErrorKind::NotAllowed,
                    format!("Playback failed: {reason}"),
                ))),
                // Already on the banner unless it was dismissed since.
                StartFailure::SourceFailed(error) if self.state.error.as_ref() == Some(&error) => {
                    self.state.playing = false;
                    None
                }
                StartFailure::SourceFailed(error) => Some(self.fail(error)),
                StartFailure::Interrupted => {
                    debug!("start interrupted");
                    None
                }
            },
        }
    }

    fn fail(&mut self, error: PlaybackError) -> EngineEvent {
        warn!(kind = ?error.kind, "playback error: {}", error.message);
        self.state.playing = false;
        self.state.error = Some(error.clone());
        EngineEvent::Error(error)
    }

    fn teardown(&mut self) {
        self.resource = None;
        self.origin = None;
    }
}

fn clamp_volume(level: f32) -> Option<f32> {
    level.is_finite().then(|| level.clamp(0.0, 1.0))
}
