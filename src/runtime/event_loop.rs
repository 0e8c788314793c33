use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::App;
use crate::audio::{AudioBackend, EngineEvent};
use crate::config;
use crate::library::{Catalog, Track};
use crate::mpris::{ControlCmd, MprisHandle, PlaybackStatus};
use crate::runtime::mpris_sync::update_mpris;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Every playback event the session applied.
    playback_events: Receiver<EngineEvent>,
    /// Last-known track as emitted to MPRIS.
    pub last_mpris_track: Option<Track>,
    /// Last-known playback status as emitted to MPRIS.
    pub last_mpris_status: PlaybackStatus,
}

impl EventLoopState {
    /// Construct a new `EventLoopState` seeded from `app`.
    pub fn new<C: Catalog, B: AudioBackend>(
        app: &App<C, B>,
        playback_events: Receiver<EngineEvent>,
    ) -> Self {
        Self {
            playback_events,
            last_mpris_track: app.current().cloned(),
            last_mpris_status: PlaybackStatus::from_state(app.playback()),
        }
    }

    /// Whether MPRIS needs a refresh after this iteration's events.
    pub(super) fn mpris_stale<C: Catalog, B: AudioBackend>(&mut self, app: &App<C, B>) -> bool {
        let mut stale = false;
        while let Ok(event) = self.playback_events.try_recv() {
            if let EngineEvent::MetadataReady(_) = event {
                stale = true;
            }
        }

        let status = PlaybackStatus::from_state(app.playback());
        if status != self.last_mpris_status || app.current() != self.last_mpris_track.as_ref() {
            stale = true;
        }
        self.last_mpris_status = status;
        self.last_mpris_track = app.current().cloned();
        stale
    }
}

/// Main terminal event loop: pumps the session, handles input, draws the UI
/// and keeps MPRIS in sync. Returns `Ok(())` when shutdown is requested.
pub fn run<C: Catalog, B: AudioBackend>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App<C, B>,
    mpris: &MprisHandle,
    control_rx: &Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick = Duration::from_millis(settings.audio.tick_ms);

    loop {
        app.pump();

        // Keep MPRIS in sync even when playback changes come from media keys or auto-advance.
        if state.mpris_stale(app) {
            update_mpris(mpris, app);
        }

        terminal.draw(|f| ui::draw(f, app, settings))?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, app) {
                return Ok(());
            }
        }

        if event::poll(tick)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Apply a transport command. Returns `true` when the app should quit.
pub(super) fn handle_control_cmd<C: Catalog, B: AudioBackend>(
    cmd: ControlCmd,
    app: &mut App<C, B>,
) -> bool {
    debug!(?cmd, "control command");
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => {
            if app.current().is_none() {
                app.select_cursor();
            } else {
                app.set_playing(true);
            }
        }
        ControlCmd::Pause => app.set_playing(false),
        ControlCmd::PlayPause => {
            if app.current().is_none() {
                app.select_cursor();
            } else {
                app.toggle_playing();
            }
        }
        ControlCmd::Stop => app.stop(),
        ControlCmd::Next => app.next(),
        ControlCmd::Prev => app.previous(),
    }

    false
}

/// Apply a key press. Returns `true` when the app should quit.
pub(super) fn handle_key_event<C: Catalog, B: AudioBackend>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App<C, B>,
) -> bool {
    // Any key closes the alert.
    if app.alert.is_some() {
        app.dismiss_alert();
        return false;
    }

    if app.confirm_delete.is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
            _ => app.cancel_delete(),
        }
        return false;
    }

    if let Some(form) = app.form.as_mut() {
        match key.code {
            KeyCode::Esc => app.close_form(),
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
            KeyCode::Backspace => form.pop(),
            KeyCode::Char(c) if !c.is_control() => form.push(c),
            KeyCode::Enter => app.submit_form(&settings.upload),
            _ => {}
        }
        return false;
    }

    if app.search_mode {
        match key.code {
            KeyCode::Esc => app.clear_search(),
            KeyCode::Enter => app.exit_search_mode(),
            KeyCode::Backspace => app.pop_search_char(),
            KeyCode::Down => app.cursor_down(),
            KeyCode::Up => app.cursor_up(),
            KeyCode::Char(c) if !c.is_control() => app.push_search_char(c),
            _ => {}
        }
        return false;
    }

    let scrub = settings.controls.scrub_seconds as f64;
    let step = settings.audio.volume_step;

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('/') => app.enter_search_mode(),
        KeyCode::Char('g') => app.cycle_genre(),
        KeyCode::Char('j') | KeyCode::Down => app.cursor_down(),
        KeyCode::Char('k') | KeyCode::Up => app.cursor_up(),
        KeyCode::Enter => app.select_cursor(),
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            return handle_control_cmd(ControlCmd::PlayPause, app);
        }
        KeyCode::Char('l') | KeyCode::Char('n') => app.next(),
        KeyCode::Char('h') | KeyCode::Char('b') => app.previous(),
        KeyCode::Char('L') | KeyCode::Right => app.seek_by(scrub),
        KeyCode::Char('H') | KeyCode::Left => app.seek_by(-scrub),
        KeyCode::Char('+') | KeyCode::Char('=') => app.volume_by(step),
        KeyCode::Char('-') => app.volume_by(-step),
        KeyCode::Char('a') => app.open_create_form(),
        KeyCode::Char('e') => app.open_edit_form(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('x') => app.dismiss_error(),
        KeyCode::Esc => app.clear_search(),
        _ => {}
    }

    false
}
