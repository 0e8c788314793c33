use std::sync::mpsc::Sender;

use crate::library::Track;

use super::types::{EventOrigin, ResourceEvent};

/// Handle a resource uses to report events.
///
/// Every event is stamped with the origin of the load that created the
/// resource. Sending never fails from the resource's point of view; events
/// posted after the engine is gone are dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    origin: EventOrigin,
    tx: Sender<(EventOrigin, ResourceEvent)>,
}

impl EventSink {
    pub(super) fn new(origin: EventOrigin, tx: Sender<(EventOrigin, ResourceEvent)>) -> Self {
        Self { origin, tx }
    }

    pub fn emit(&self, event: ResourceEvent) {
        let _ = self.tx.send((self.origin.clone(), event));
    }

    pub fn origin(&self) -> &EventOrigin {
        &self.origin
    }
}

/// One native rendering resource bound to a single track source.
///
/// Dropping the resource tears it down.
pub trait AudioResource {
    /// Ask for playback to start. The outcome is reported as
    /// `ResourceEvent::StartResolved`.
    fn request_play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
    fn set_volume(&mut self, level: f32);
    /// Called regularly from the event loop to let the resource report progress.
    fn tick(&mut self) {}
}

/// Opens audio resources.
pub trait AudioBackend {
    /// Open a resource for `track`. Failures are reported through `events`.
    fn open(&mut self, track: &Track, events: EventSink) -> Box<dyn AudioResource>;
}
