use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::app::App;
use crate::audio::RodioBackend;
use crate::config::Settings;
use crate::library::Catalog;
use crate::mpris::ControlCmd;

mod event_loop;
mod mpris_sync;
mod settings;

pub use settings::load_settings;

/// Run the terminal player against `catalog` until the user quits.
pub fn run<C: Catalog>(settings: &Settings, catalog: C) -> Result<(), Box<dyn std::error::Error>> {
    let backend = RodioBackend::open_default(&settings.audio)?;
    let mut app = App::new(catalog, backend, settings);
    let playback_events = app.subscribe_playback();
    info!(tracks = app.tracks.len(), "session started");

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);

    mpris_sync::update_mpris(&mpris, &app);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::new(&app, playback_events);
        event_loop::run(
            &mut terminal,
            settings,
            &mut app,
            &mpris,
            &control_rx,
            &mut state,
        )
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("session ended");
    run_result
}
