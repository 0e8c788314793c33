//! Next/previous over the filtered view.
//!
//! Both moves wrap around. A current track that is not part of the view has
//! no neighbours, so the move is a no-op (`None`).

use tracing::debug;

use crate::library::{Track, TrackId};

/// The track after `current` in `view`, wrapping to the first.
pub fn next<'a>(current: &TrackId, view: &'a [Track]) -> Option<&'a Track> {
    let index = position(current, view)?;
    view.get((index + 1) % view.len())
}

/// The track before `current` in `view`, wrapping to the last.
pub fn previous<'a>(current: &TrackId, view: &'a [Track]) -> Option<&'a Track> {
    let index = position(current, view)?;
    view.get((index + view.len() - 1) % view.len())
}

fn position(current: &TrackId, view: &[Track]) -> Option<usize> {
    let found = view.iter().position(|t| &t.id == current);
    if found.is_none() {
        debug!(track = %current, "current track is not in the view");
    }
    found
}
