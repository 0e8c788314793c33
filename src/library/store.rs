//! TOML-file backed catalog.
//!
//! The whole catalog lives in one file of `[[tracks]]` tables. Every
//! mutation rewrites the file through a temp file + rename; the in-memory
//! state only changes once the write succeeded.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::catalog::{
    Catalog, CatalogError, Subscribers, apply_create, apply_delete, apply_update,
};
use super::model::{Track, TrackDraft, TrackId};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tracks: Vec<Track>,
}

pub struct FileCatalog {
    path: PathBuf,
    tracks: Vec<Track>,
    subscribers: Subscribers,
}

impl FileCatalog {
    /// Open the catalog at `path`. A missing file is an empty catalog.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let tracks = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|source| CatalogError::Read {
                path: path.clone(),
                source,
            })?;
            let file: CatalogFile = toml::from_str(&text).map_err(|source| CatalogError::Parse {
                path: path.clone(),
                source,
            })?;
            file.tracks
        } else {
            debug!(path = %path.display(), "catalog file missing, starting empty");
            Vec::new()
        };

        info!(path = %path.display(), tracks = tracks.len(), "catalog opened");
        Ok(Self {
            path,
            tracks,
            subscribers: Subscribers::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, tracks: &[Track]) -> Result<(), CatalogError> {
        let text = toml::to_string_pretty(&CatalogFile {
            tracks: tracks.to_vec(),
        })?;

        let write_err = |source: std::io::Error| CatalogError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, text).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }

    /// Run `op` on a copy, persist it, then commit and publish.
    fn commit<T>(
        &mut self,
        op: impl FnOnce(&mut Vec<Track>) -> Result<T, CatalogError>,
    ) -> Result<T, CatalogError> {
        let mut next = self.tracks.clone();
        let out = op(&mut next)?;
        self.persist(&next)?;
        self.tracks = next;
        self.subscribers.publish(&self.tracks);
        Ok(out)
    }
}

impl Catalog for FileCatalog {
    fn tracks(&self) -> Vec<Track> {
        self.tracks.clone()
    }

    fn subscribe(&mut self) -> Receiver<Vec<Track>> {
        self.subscribers.add(self.tracks.clone())
    }

    fn create(&mut self, draft: TrackDraft) -> Result<TrackId, CatalogError> {
        let id = self.commit(|tracks| apply_create(tracks, draft))?;
        info!(track = %id, "track created");
        Ok(id)
    }

    fn update(&mut self, id: &TrackId, draft: TrackDraft) -> Result<(), CatalogError> {
        self.commit(|tracks| apply_update(tracks, id, draft))?;
        info!(track = %id, "track updated");
        Ok(())
    }

    fn delete(&mut self, id: &TrackId) -> Result<(), CatalogError> {
        self.commit(|tracks| apply_delete(tracks, id))?;
        info!(track = %id, "track deleted");
        Ok(())
    }
}
