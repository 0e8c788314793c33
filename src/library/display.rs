use crate::config::TrackDisplayField;

use super::filter::GenreFilter;
use super::model::Track;

/// Build a display string for a track according to the provided `fields` and separator.
///
/// Empty fields are skipped; when nothing is produced the title is used.
pub fn display_from_fields(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        let value = match f {
            TrackDisplayField::Title => track.title.trim(),
            TrackDisplayField::Artist => track.artist.trim(),
            TrackDisplayField::Genre => track.genre.trim(),
        };
        if !value.is_empty() {
            parts.push(value.to_string());
        }
    }

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(sep)
    }
}

/// Label for the genre selector: `All Genres`, or the genre with its first letter capitalised.
pub fn genre_label(genre: &GenreFilter) -> String {
    match genre {
        GenreFilter::All => "All Genres".to_string(),
        GenreFilter::Only(g) => {
            let mut chars = g.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

/// Format seconds as `m:ss`. Unknown or invalid values render as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Short description of a cover/audio reference for places where it cannot be rendered.
pub fn reference_kind(uri: &str) -> &'static str {
    if uri.starts_with("data:") {
        "embedded"
    } else if uri.starts_with("http://") || uri.starts_with("https://") {
        "remote"
    } else {
        "local"
    }
}
