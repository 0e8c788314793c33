//! The catalog collaborator contract and an in-memory implementation.
//!
//! A catalog keeps tracks in arrival order and pushes a full snapshot to
//! every subscriber after each mutation.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;
use tracing::info;

use super::model::{DraftError, Track, TrackDraft, TrackId};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("track not found: {0}")]
    NotFound(TrackId),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error("failed to read catalog {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse catalog {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to write catalog {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode catalog: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Source of truth for track records.
pub trait Catalog {
    /// Current ordered snapshot.
    fn tracks(&self) -> Vec<Track>;

    /// Register for push updates. The current snapshot is delivered immediately.
    fn subscribe(&mut self) -> Receiver<Vec<Track>>;

    fn create(&mut self, draft: TrackDraft) -> Result<TrackId, CatalogError>;

    fn update(&mut self, id: &TrackId, draft: TrackDraft) -> Result<(), CatalogError>;

    fn delete(&mut self, id: &TrackId) -> Result<(), CatalogError>;

    fn get(&self, id: &TrackId) -> Option<Track> {
        self.tracks().into_iter().find(|t| &t.id == id)
    }
}

/// Snapshot fan-out shared by the catalog implementations.
#[derive(Default)]
pub(super) struct Subscribers {
    senders: Vec<Sender<Vec<Track>>>,
}

impl Subscribers {
    pub(super) fn add(&mut self, snapshot: Vec<Track>) -> Receiver<Vec<Track>> {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(snapshot);
        self.senders.push(tx);
        rx
    }

    /// Push `snapshot` to every live subscriber, dropping the ones that hung up.
    pub(super) fn publish(&mut self, snapshot: &[Track]) {
        self.senders.retain(|tx| tx.send(snapshot.to_vec()).is_ok());
    }
}

/// Apply a create to `tracks`, returning the new identifier.
pub(super) fn apply_create(tracks: &mut Vec<Track>, draft: TrackDraft) -> Result<TrackId, CatalogError> {
    draft.validate()?;
    let id = TrackId::generate();
    tracks.push(Track::from_draft(id.clone(), draft));
    Ok(id)
}

/// Apply an in-place update to `tracks`; the position in the catalog is kept.
pub(super) fn apply_update(
    tracks: &mut [Track],
    id: &TrackId,
    draft: TrackDraft,
) -> Result<(), CatalogError> {
    draft.validate()?;
    let slot = tracks
        .iter_mut()
        .find(|t| &t.id == id)
        .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
    *slot = Track::from_draft(id.clone(), draft);
    Ok(())
}

pub(super) fn apply_delete(tracks: &mut Vec<Track>, id: &TrackId) -> Result<(), CatalogError> {
    let before = tracks.len();
    tracks.retain(|t| &t.id != id);
    if tracks.len() == before {
        return Err(CatalogError::NotFound(id.clone()));
    }
    Ok(())
}

/// Volatile catalog, used by tests and as the base for demo sessions.
#[derive(Default)]
pub struct MemoryCatalog {
    tracks: Vec<Track>,
    subscribers: Subscribers,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing records (identifiers are kept as given).
    pub fn with_tracks(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            subscribers: Subscribers::default(),
        }
    }
}

impl Catalog for MemoryCatalog {
    fn tracks(&self) -> Vec<Track> {
        self.tracks.clone()
    }

    fn subscribe(&mut self) -> Receiver<Vec<Track>> {
        self.subscribers.add(self.tracks.clone())
    }

    fn create(&mut self, draft: TrackDraft) -> Result<TrackId, CatalogError> {
        let id = apply_create(&mut self.tracks, draft)?;
        info!(track = %id, "track created");
        self.subscribers.publish(&self.tracks);
        Ok(id)
    }

    fn update(&mut self, id: &TrackId, draft: TrackDraft) -> Result<(), CatalogError> {
        apply_update(&mut self.tracks, id, draft)?;
        info!(track = %id, "track updated");
        self.subscribers.publish(&self.tracks);
        Ok(())
    }

    fn delete(&mut self, id: &TrackId) -> Result<(), CatalogError> {
        apply_delete(&mut self.tracks, id)?;
        info!(track = %id, "track deleted");
        self.subscribers.publish(&self.tracks);
        Ok(())
    }
}
