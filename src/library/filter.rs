//! Filtered views over the catalog.
//!
//! The view is never stored: it is recomputed from the catalog snapshot
//! whenever the snapshot, the search text or the genre filter changes.

use super::model::Track;

/// The genre selector value. `All` disables genre filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GenreFilter {
    #[default]
    All,
    Only(String),
}

impl GenreFilter {
    /// Parse the selector value used by the CLI (`all` means no filter).
    pub fn parse(value: &str) -> Self {
        if value == "all" {
            Self::All
        } else {
            Self::Only(value.to_string())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackFilter {
    /// Case-insensitive substring matched against title or artist.
    pub search: String,
    pub genre: GenreFilter,
}

impl TrackFilter {
    pub fn matches(&self, track: &Track) -> bool {
        let query = self.search.to_lowercase();
        let matches_search = track.title.to_lowercase().contains(&query)
            || track.artist.to_lowercase().contains(&query);
        let matches_genre = match &self.genre {
            GenreFilter::All => true,
            GenreFilter::Only(genre) => &track.genre == genre,
        };
        matches_search && matches_genre
    }

    /// Apply the filter, keeping catalog order.
    pub fn apply(&self, tracks: &[Track]) -> Vec<Track> {
        tracks.iter().filter(|t| self.matches(t)).cloned().collect()
    }
}

/// Genre selector options: `all` first, then each distinct genre in first-seen order.
pub fn genre_options(tracks: &[Track]) -> Vec<GenreFilter> {
    let mut options = vec![GenreFilter::All];
    for track in tracks {
        let candidate = GenreFilter::Only(track.genre.clone());
        if !options.contains(&candidate) {
            options.push(candidate);
        }
    }
    options
}
