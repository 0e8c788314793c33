//! Command line: the terminal player by default, plus catalog maintenance
//! subcommands that work without a terminal UI.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::Settings;
use crate::library::upload::{self, UploadKind};
use crate::library::{
    Catalog, CatalogError, GenreFilter, TrackDraft, TrackFilter, TrackId, genre_label, import_dir,
    reference_kind,
};

#[derive(Parser, Debug)]
#[command(name = "sonicloud")]
#[command(about = "Terminal music catalog and player")]
#[command(version)]
pub struct Cli {
    /// Catalog file (defaults to the configured data path)
    #[arg(long, global = true, env = "SONICLOUD_CATALOG")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Open the terminal player (default)
    Play,
    /// Print the catalog, optionally filtered
    List {
        /// Case-insensitive text matched against title and artist
        #[arg(short, long, default_value = "")]
        search: String,
        /// Genre to keep, or `all`
        #[arg(short, long, default_value = "all")]
        genre: String,
    },
    /// Publish a new track
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: String,
        #[arg(long)]
        genre: String,
        /// Audio file path or URI
        #[arg(long)]
        audio: String,
        /// Cover image path or URI
        #[arg(long)]
        cover: String,
    },
    /// Change fields of an existing track
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        audio: Option<String>,
        #[arg(long)]
        cover: Option<String>,
    },
    /// Delete a track
    Remove { id: String },
    /// Publish every audio file below a directory
    Import { dir: PathBuf },
}

impl Cli {
    /// Catalog location: `--catalog`, then the configured path.
    pub fn catalog_path(&self, settings: &Settings) -> Option<PathBuf> {
        self.catalog.clone().or_else(|| settings.catalog_path())
    }
}

/// Run a catalog subcommand, writing human-readable output to `out`.
///
/// `Play` is handled by the caller.
pub fn run_command<C: Catalog>(
    command: Command,
    catalog: &mut C,
    settings: &Settings,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Play => {}
        Command::List { search, genre } => {
            let filter = TrackFilter {
                search,
                genre: GenreFilter::parse(&genre),
            };
            let tracks = filter.apply(&catalog.tracks());
            for track in &tracks {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}",
                    track.id,
                    track.display(),
                    track.genre,
                    reference_kind(&track.url)
                )?;
            }
            writeln!(
                out,
                "{} songs ({})",
                tracks.len(),
                genre_label(&filter.genre)
            )?;
        }
        Command::Add {
            title,
            artist,
            genre,
            audio,
            cover,
        } => {
            let draft = TrackDraft {
                title,
                artist,
                genre,
                url: upload::resolve_reference(&audio, UploadKind::Audio, &settings.upload)?,
                cover_art: upload::resolve_reference(&cover, UploadKind::Image, &settings.upload)?,
            };
            let id = catalog.create(draft)?;
            info!(track = %id, "added");
            writeln!(out, "{id}")?;
        }
        Command::Edit {
            id,
            title,
            artist,
            genre,
            audio,
            cover,
        } => {
            let id = TrackId::new(id);
            let existing = catalog
                .get(&id)
                .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

            let mut draft = existing.to_draft();
            if let Some(v) = title {
                draft.title = v;
            }
            if let Some(v) = artist {
                draft.artist = v;
            }
            if let Some(v) = genre {
                draft.genre = v;
            }
            if let Some(v) = audio {
                draft.url = upload::resolve_reference(&v, UploadKind::Audio, &settings.upload)?;
            }
            if let Some(v) = cover {
                draft.cover_art = upload::resolve_reference(&v, UploadKind::Image, &settings.upload)?;
            }

            catalog.update(&id, draft)?;
            info!(track = %id, "edited");
            writeln!(out, "updated {id}")?;
        }
        Command::Remove { id } => {
            let id = TrackId::new(id);
            catalog.delete(&id)?;
            info!(track = %id, "removed");
            writeln!(out, "removed {id}")?;
        }
        Command::Import { dir } => import(&dir, catalog, settings, out)?,
    }

    Ok(())
}

fn import<C: Catalog>(
    dir: &Path,
    catalog: &mut C,
    settings: &Settings,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    if !dir.is_dir() {
        return Err(format!("not a directory: {}", dir.display()).into());
    }

    let report = import_dir(dir, catalog, &settings.library, &settings.upload)?;
    for (path, reason) in &report.skipped {
        writeln!(out, "skipped {}: {reason}", path.display())?;
    }
    writeln!(
        out,
        "imported {} songs, skipped {}",
        report.imported.len(),
        report.skipped.len()
    )?;
    Ok(())
}
