//! Scripted backend for engine and session tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::library::{Track, TrackId};

use super::backend::{AudioBackend, AudioResource, EventSink};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Play,
    Pause,
    Seek(f64),
    Volume(f32),
    Tick,
}

struct Opened {
    track: TrackId,
    events: EventSink,
    calls: Vec<Call>,
    dropped: bool,
}

/// Records every opened resource; clones share the record.
#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    opened: Rc<RefCell<Vec<Opened>>>,
}

impl FakeBackend {
    pub(crate) fn opened(&self) -> usize {
        self.opened.borrow().len()
    }

    pub(crate) fn track(&self, n: usize) -> TrackId {
        self.opened.borrow()[n].track.clone()
    }

    /// Event handle of the `n`th opened resource.
    pub(crate) fn events(&self, n: usize) -> EventSink {
        self.opened.borrow()[n].events.clone()
    }

    pub(crate) fn latest(&self) -> EventSink {
        let n = self.opened() - 1;
        self.events(n)
    }

    pub(crate) fn calls(&self, n: usize) -> Vec<Call> {
        self.opened.borrow()[n].calls.clone()
    }

    pub(crate) fn is_dropped(&self, n: usize) -> bool {
        self.opened.borrow()[n].dropped
    }
}

impl AudioBackend for FakeBackend {
    fn open(&mut self, track: &Track, events: EventSink) -> Box<dyn AudioResource> {
        let mut opened = self.opened.borrow_mut();
        opened.push(Opened {
            track: track.id.clone(),
            events,
            calls: Vec::new(),
            dropped: false,
        });
        Box::new(FakeResource {
            index: opened.len() - 1,
            opened: Rc::clone(&self.opened),
        })
    }
}

struct FakeResource {
    index: usize,
    opened: Rc<RefCell<Vec<Opened>>>,
}

impl FakeResource {
    fn record(&self, call: Call) {
        self.opened.borrow_mut()[self.index].calls.push(call);
    }
}

impl AudioResource for FakeResource {
    fn request_play(&mut self) {
        self.record(Call::Play);
    }

    fn pause(&mut self) {
        self.record(Call::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.record(Call::Seek(seconds));
    }

    fn set_volume(&mut self, level: f32) {
        self.record(Call::Volume(level));
    }

    fn tick(&mut self) {
        self.record(Call::Tick);
    }
}

impl Drop for FakeResource {
    fn drop(&mut self) {
        self.opened.borrow_mut()[self.index].dropped = true;
    }
}
