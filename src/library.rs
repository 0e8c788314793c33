//! Track catalog: the track model, filtered views, catalog collaborators,
//! uploads and folder import.

mod catalog;
mod display;
mod filter;
mod import;
mod model;
mod store;
pub mod upload;

pub use catalog::{Catalog, CatalogError, MemoryCatalog};
pub use display::{display_from_fields, format_time, genre_label, reference_kind};
pub use filter::{GenreFilter, TrackFilter, genre_options};
pub use import::{ImportReport, import_dir};
pub use model::{DraftError, Track, TrackDraft, TrackId};
pub use store::FileCatalog;

#[cfg(test)]
mod tests;
