use crate::app::App;
use crate::audio::AudioBackend;
use crate::library::Catalog;
use crate::mpris::{MprisHandle, PlaybackStatus};

pub fn update_mpris<C: Catalog, B: AudioBackend>(mpris: &MprisHandle, app: &App<C, B>) {
    let state = app.playback();
    mpris.set_track_metadata(state.current.as_ref(), state.duration);
    mpris.set_playback(PlaybackStatus::from_state(state));
}
