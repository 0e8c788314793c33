//! `rodio` implementation of the audio backend.
//!
//! Each opened resource owns one paused `Sink` on the shared output stream.
//! Remote sources are downloaded one at a time by a fetch worker thread;
//! `tick` picks up the result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use crate::config::AudioSettings;
use crate::library::Track;

use super::backend::{AudioBackend, AudioResource, EventSink};
use super::source::{self, Payload, Resolved, SourceError};
use super::types::{PlaybackError, ResourceEvent, StartFailure};

type FetchResult = Result<Payload, SourceError>;

pub struct RodioBackend {
    stream: OutputStream,
    fetcher: Sender<FetchJob>,
}

impl RodioBackend {
    /// Open the default output device and start the fetch worker.
    pub fn open_default(settings: &AudioSettings) -> Result<Self, Box<dyn std::error::Error>> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.fetch_timeout_secs))
            .build()?;
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);
        Ok(Self {
            stream,
            fetcher: spawn_fetcher(client),
        })
    }
}

impl AudioBackend for RodioBackend {
    fn open(&mut self, track: &Track, events: EventSink) -> Box<dyn AudioResource> {
        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        let mut resource = RodioResource::new(sink, events);

        match source::resolve(&track.url) {
            Ok(Resolved::Ready(payload)) => resource.attach(payload),
            Ok(Resolved::Remote(url)) => {
                debug!(track = %track.id, "fetching remote source");
                let (reply, rx) = mpsc::channel();
                // A dead worker drops the job; `tick` then reports the fetch as aborted.
                let _ = self.fetcher.send(FetchJob {
                    url,
                    cancelled: Arc::clone(&resource.cancelled),
                    reply,
                });
                resource.state = SourceState::Fetching(rx);
            }
            Err(e) => resource.fail(&e),
        }

        Box::new(resource)
    }
}

struct FetchJob {
    url: String,
    /// Set once the requesting resource is dropped.
    cancelled: Arc<AtomicBool>,
    reply: Sender<FetchResult>,
}

/// Serve downloads in order on one thread. The worker exits with the backend.
fn spawn_fetcher(client: Client) -> Sender<FetchJob> {
    let (tx, rx) = mpsc::channel::<FetchJob>();
    thread::spawn(move || {
        for job in rx {
            run_fetch(&client, job);
        }
    });
    tx
}

fn run_fetch(client: &Client, job: FetchJob) {
    let result = if job.cancelled.load(Ordering::Relaxed) {
        debug!(url = %job.url, "skipping abandoned fetch");
        Err(SourceError::Aborted)
    } else {
        source::fetch(client, &job.url, &job.cancelled)
    };
    // The resource may be gone by now; then nobody cares.
    let _ = job.reply.send(result);
}

enum SourceState {
    /// Nothing attached yet.
    Idle,
    Fetching(Receiver<FetchResult>),
    Ready(Payload),
    /// The error already reported through `ResourceEvent::Failed`.
    Failed(PlaybackError),
}

struct RodioResource {
    sink: Sink,
    events: EventSink,
    state: SourceState,
    want_play: bool,
    pending_seek: Option<f64>,
    last_pos: Option<f64>,
    ended: bool,
    cancelled: Arc<AtomicBool>,
}

impl RodioResource {
    fn new(sink: Sink, events: EventSink) -> Self {
        Self {
            sink,
            events,
            state: SourceState::Idle,
            want_play: false,
            pending_seek: None,
            last_pos: None,
            ended: false,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    fn attach(&mut self, payload: Payload) {
        match source::append_to(&self.sink, &payload) {
            Ok(duration) => {
                self.state = SourceState::Ready(payload);
                self.events.emit(ResourceEvent::LoadedMetadata {
                    duration: duration.map(|d| d.as_secs_f64()),
                });
                if let Some(seconds) = self.pending_seek.take() {
                    self.seek(seconds);
                }
                if self.want_play {
                    self.start();
                }
            }
            Err(e) => self.fail(&e),
        }
    }

    /// Report `e` once. A start that was waiting on the source is dropped with it;
    /// the engine pauses on the failure itself.
    fn fail(&mut self, e: &SourceError) {
        warn!(
            track = %self.events.origin().track,
            "audio source failed: {e}"
        );
        let error = e.to_playback_error();
        self.want_play = false;
        self.pending_seek = None;
        self.events.emit(ResourceEvent::Failed(error.clone()));
        self.state = SourceState::Failed(error);
    }

    fn start(&mut self) {
        if self.ended && !self.rewind() {
            return;
        }
        self.sink.play();
        self.events.emit(ResourceEvent::StartResolved(Ok(())));
    }

    /// Queue the payload again after the stream ran out.
    fn rewind(&mut self) -> bool {
        let SourceState::Ready(payload) = &self.state else {
            return false;
        };
        match source::append_to(&self.sink, payload) {
            Ok(_) => {
                self.ended = false;
                self.last_pos = None;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    fn report_progress(&mut self) {
        let pos = self.sink.get_pos().as_secs_f64();
        if self.last_pos != Some(pos) {
            self.last_pos = Some(pos);
            self.events.emit(ResourceEvent::TimeUpdate(pos));
        }

        if !self.ended && !self.sink.is_paused() && self.sink.empty() {
            self.ended = true;
            self.want_play = false;
            self.sink.pause();
            self.events.emit(ResourceEvent::Ended);
        }
    }
}

impl AudioResource for RodioResource {
    fn request_play(&mut self) {
        self.want_play = true;
        match &self.state {
            SourceState::Ready(_) => self.start(),
            SourceState::Idle | SourceState::Fetching(_) => {}
            SourceState::Failed(error) => {
                let error = error.clone();
                self.want_play = false;
                self.events
                    .emit(ResourceEvent::StartResolved(Err(StartFailure::SourceFailed(error))));
            }
        }
    }

    fn pause(&mut self) {
        if self.want_play && matches!(self.state, SourceState::Fetching(_)) {
            self.events
                .emit(ResourceEvent::StartResolved(Err(StartFailure::Interrupted)));
        }
        self.want_play = false;
        self.sink.pause();
    }

    fn seek(&mut self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        match &self.state {
            SourceState::Ready(_) => {
                if self.ended && !self.rewind() {
                    return;
                }
                let target = Duration::from_secs_f64(seconds.max(0.0));
                if let Err(e) = self.sink.try_seek(target) {
                    warn!("seek failed: {e}");
                }
            }
            SourceState::Idle | SourceState::Fetching(_) => self.pending_seek = Some(seconds),
            SourceState::Failed(_) => {}
        }
    }

    fn set_volume(&mut self, level: f32) {
        self.sink.set_volume(level);
    }

    fn tick(&mut self) {
        let fetched = match &self.state {
            SourceState::Fetching(rx) => match rx.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err(SourceError::Aborted)),
            },
            SourceState::Ready(_) => {
                self.report_progress();
                None
            }
            SourceState::Idle | SourceState::Failed(_) => None,
        };

        match fetched {
            Some(Ok(payload)) => self.attach(payload),
            Some(Err(e)) => self.fail(&e),
            None => {}
        }
    }
}

impl Drop for RodioResource {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        self.sink.stop();
    }
}
