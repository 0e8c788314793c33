//! Application model: `App`.
//!
//! The `App` struct glues the catalog, the filtered view, the playback engine
//! and navigation together, and holds the UI-facing flags (search mode,
//! popups, cursor).

use std::sync::mpsc::Receiver;

use tracing::{debug, info, warn};

use crate::audio::{AudioBackend, EngineEvent, PlaybackEngine, PlaybackState};
use crate::config::{Settings, UploadSettings};
use crate::library::{
    Catalog, CatalogError, GenreFilter, Track, TrackDraft, TrackFilter, TrackId, genre_options,
};
use crate::navigation;

use super::form::TrackForm;

pub const SAVE_FAILED: &str = "Failed to save song.";
pub const DELETE_FAILED: &str = "Failed to delete song.";

/// The main application model.
pub struct App<C: Catalog, B: AudioBackend> {
    catalog: C,
    snapshots: Receiver<Vec<Track>>,
    engine: PlaybackEngine<B>,

    /// Latest catalog snapshot, in catalog order.
    pub tracks: Vec<Track>,
    pub filter: TrackFilter,
    view: Vec<Track>,

    /// Cursor into the filtered view.
    pub selected: usize,
    pub search_mode: bool,

    /// Blocking alert; any key dismisses it.
    pub alert: Option<String>,
    pub form: Option<TrackForm>,
    pub confirm_delete: Option<TrackId>,

    reload_on_metadata_edit: bool,
}

impl<C: Catalog, B: AudioBackend> App<C, B> {
    pub fn new(mut catalog: C, backend: B, settings: &Settings) -> Self {
        let snapshots = catalog.subscribe();
        let mut app = Self {
            catalog,
            snapshots,
            engine: PlaybackEngine::new(backend, settings.audio.initial_volume),
            tracks: Vec::new(),
            filter: TrackFilter::default(),
            view: Vec::new(),
            selected: 0,
            search_mode: false,
            alert: None,
            form: None,
            confirm_delete: None,
            reload_on_metadata_edit: settings.session.reload_on_metadata_edit,
        };
        app.apply_snapshots();
        app
    }

    pub fn playback(&self) -> &PlaybackState {
        self.engine.state()
    }

    pub fn current(&self) -> Option<&Track> {
        self.engine.state().current.as_ref()
    }

    /// Receive every playback event the session applies.
    pub fn subscribe_playback(&mut self) -> Receiver<EngineEvent> {
        self.engine.subscribe()
    }

    /// The filtered view, in catalog order.
    pub fn view(&self) -> &[Track] {
        &self.view
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.view.get(self.selected)
    }

    pub fn genres(&self) -> Vec<GenreFilter> {
        genre_options(&self.tracks)
    }

    /// Drive the session once: catalog snapshots, resource progress, engine events.
    ///
    /// Returns the playback events applied during this call.
    pub fn pump(&mut self) -> Vec<EngineEvent> {
        self.apply_snapshots();
        self.engine.tick();
        let events = self.engine.dispatch();
        if events.contains(&EngineEvent::Ended) {
            self.on_ended();
        }
        events
    }

    fn apply_snapshots(&mut self) {
        let mut latest = None;
        while let Ok(snapshot) = self.snapshots.try_recv() {
            latest = Some(snapshot);
        }
        let Some(tracks) = latest else {
            return;
        };

        self.tracks = tracks;
        self.refresh_view();

        let edited = self
            .current()
            .and_then(|current| self.tracks.iter().find(|t| t.id == current.id))
            .cloned();
        if let Some(record) = edited {
            self.apply_edit(record);
        }
    }

    /// Bring the loaded track in line with its catalog record.
    ///
    /// A changed audio source always reloads (keeping the playing flag);
    /// metadata-only changes reload only when configured to.
    fn apply_edit(&mut self, record: Track) {
        let Some(current) = self.current() else {
            return;
        };
        if current.id != record.id || *current == record {
            return;
        }

        let source_changed = current.url != record.url;
        if source_changed || self.reload_on_metadata_edit {
            info!(track = %record.id, source_changed, "reloading edited track");
            self.engine.load(record);
        } else {
            self.engine.replace_track_metadata(record);
        }
    }

    fn refresh_view(&mut self) {
        self.view = self.filter.apply(&self.tracks);
        if self.view.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.view.len() {
            self.selected = self.view.len() - 1;
        }
    }

    /// Load `track` and start it from the beginning, even when it is already loaded.
    pub fn select(&mut self, track: Track) {
        info!(track = %track.id, "select");
        if let Some(i) = self.view.iter().position(|t| t.id == track.id) {
            self.selected = i;
        }
        self.engine.load(track);
        // `load` already asked for a start when the session was playing.
        if !self.engine.state().playing {
            self.engine.set_playing(true);
        }
    }

    pub fn select_cursor(&mut self) {
        if let Some(track) = self.selected_track().cloned() {
            self.select(track);
        }
    }

    pub fn next(&mut self) {
        let target = self
            .current()
            .and_then(|current| navigation::next(&current.id, &self.view))
            .cloned();
        match target {
            Some(track) => self.select(track),
            None => debug!("next: nothing to move to"),
        }
    }

    pub fn previous(&mut self) {
        let target = self
            .current()
            .and_then(|current| navigation::previous(&current.id, &self.view))
            .cloned();
        match target {
            Some(track) => self.select(track),
            None => debug!("previous: nothing to move to"),
        }
    }

    /// Advance once after the current track ended. Without a neighbour playback stays stopped.
    fn on_ended(&mut self) {
        let target = self
            .current()
            .and_then(|current| navigation::next(&current.id, &self.view))
            .cloned();
        if let Some(track) = target {
            self.select(track);
        }
    }

    pub fn toggle_playing(&mut self) {
        let playing = self.engine.state().playing;
        self.engine.set_playing(!playing);
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.engine.set_playing(playing);
    }

    /// Pause and rewind; the track stays loaded.
    pub fn stop(&mut self) {
        self.engine.set_playing(false);
        if self.current().is_some() {
            self.engine.seek(0.0);
        }
    }

    /// Seek relative to the current position, kept within `[0, duration]`.
    pub fn seek_by(&mut self, delta: f64) {
        let state = self.engine.state();
        if state.current.is_none() {
            return;
        }
        let mut target = (state.position + delta).max(0.0);
        if let Some(duration) = state.duration {
            target = target.min(duration);
        }
        self.engine.seek(target);
    }

    pub fn volume_by(&mut self, delta: f32) {
        let volume = self.engine.state().volume;
        self.engine.set_volume(volume + delta);
    }

    pub fn dismiss_error(&mut self) {
        self.engine.clear_error();
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Publish a new track or update an existing one.
    ///
    /// Failures raise the blocking alert; nothing is rolled back.
    pub fn save_track(
        &mut self,
        editing: Option<&TrackId>,
        draft: TrackDraft,
    ) -> Result<TrackId, CatalogError> {
        if let Err(e) = draft.validate() {
            self.alert = Some(e.to_string());
            return Err(e.into());
        }

        let result = match editing {
            Some(id) => self.catalog.update(id, draft).map(|()| id.clone()),
            None => self.catalog.create(draft),
        };

        match result {
            Ok(id) => {
                self.apply_snapshots();
                Ok(id)
            }
            Err(e) => {
                warn!("save failed: {e}");
                self.alert = Some(SAVE_FAILED.to_string());
                Err(e)
            }
        }
    }

    /// Delete a track. Deleting the loaded track stops and unloads it first.
    pub fn delete_track(&mut self, id: &TrackId) -> Result<(), CatalogError> {
        if self.current().is_some_and(|t| &t.id == id) {
            self.engine.set_playing(false);
            self.engine.unload();
        }

        match self.catalog.delete(id) {
            Ok(()) => {
                self.apply_snapshots();
                Ok(())
            }
            Err(e) => {
                warn!(track = %id, "delete failed: {e}");
                self.alert = Some(DELETE_FAILED.to_string());
                Err(e)
            }
        }
    }

    pub fn open_create_form(&mut self) {
        self.form = Some(TrackForm::create());
    }

    pub fn open_edit_form(&mut self) {
        if let Some(track) = self.selected_track() {
            self.form = Some(TrackForm::edit(track));
        }
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    /// Save the open form. The form stays open when anything fails.
    pub fn submit_form(&mut self, uploads: &UploadSettings) {
        let Some(form) = self.form.clone() else {
            return;
        };

        let draft = match form.to_draft(uploads) {
            Ok(draft) => draft,
            Err(e) => {
                warn!("upload rejected: {e}");
                self.alert = Some(e.to_string());
                return;
            }
        };

        if self.save_track(form.editing.as_ref(), draft).is_ok() {
            self.form = None;
        }
    }

    /// Ask for confirmation before deleting the track under the cursor.
    pub fn request_delete(&mut self) {
        self.confirm_delete = self.selected_track().map(|t| t.id.clone());
    }

    pub fn confirm_delete(&mut self) {
        if let Some(id) = self.confirm_delete.take() {
            let _ = self.delete_track(&id);
        }
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_delete = None;
    }

    pub fn enter_search_mode(&mut self) {
        self.search_mode = true;
    }

    pub fn exit_search_mode(&mut self) {
        self.search_mode = false;
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.filter.search = text.into();
        self.refresh_view();
    }

    pub fn push_search_char(&mut self, c: char) {
        self.filter.search.push(c);
        self.refresh_view();
    }

    pub fn pop_search_char(&mut self) {
        self.filter.search.pop();
        self.refresh_view();
    }

    /// Clear the search text and leave search mode.
    pub fn clear_search(&mut self) {
        self.search_mode = false;
        self.set_search(String::new());
    }

    pub fn set_genre(&mut self, genre: GenreFilter) {
        self.filter.genre = genre;
        self.refresh_view();
    }

    /// Move the genre selector to the next option, wrapping to `all`.
    pub fn cycle_genre(&mut self) {
        let options = self.genres();
        let next = options
            .iter()
            .position(|g| *g == self.filter.genre)
            .map(|i| options[(i + 1) % options.len()].clone())
            .unwrap_or_default();
        self.set_genre(next);
    }

    /// Move the cursor down, wrapping to the top.
    pub fn cursor_down(&mut self) {
        if !self.view.is_empty() {
            self.selected = (self.selected + 1) % self.view.len();
        }
    }

    /// Move the cursor up, wrapping to the bottom.
    pub fn cursor_up(&mut self) {
        if !self.view.is_empty() {
            self.selected = (self.selected + self.view.len() - 1) % self.view.len();
        }
    }
}
