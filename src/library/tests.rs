use super::upload::{self, UploadError, UploadKind};
use super::*;
use crate::config::{TrackDisplayField, UploadSettings};
use std::fs;

fn t(id: &str, title: &str, artist: &str, genre: &str) -> Track {
    Track {
        id: TrackId::new(id),
        title: title.into(),
        artist: artist.into(),
        genre: genre.into(),
        url: format!("https://example.com/{id}.mp3"),
        cover_art: format!("https://example.com/{id}.jpg"),
    }
}

fn draft(title: &str) -> TrackDraft {
    TrackDraft {
        title: title.into(),
        artist: "Artist".into(),
        genre: "Rock".into(),
        url: "https://example.com/a.mp3".into(),
        cover_art: "https://example.com/a.jpg".into(),
    }
}

fn ids(tracks: &[Track]) -> Vec<&str> {
    tracks.iter().map(|t| t.id.as_str()).collect()
}

#[test]
fn display_from_fields_can_format_artist_title() {
    let track = t("1", "Song", "  Artist  ", "Rock");
    assert_eq!(
        display_from_fields(
            &track,
            &[TrackDisplayField::Artist, TrackDisplayField::Title],
            " - "
        ),
        "Artist - Song"
    );

    let no_artist = t("2", "Song", "", "Rock");
    assert_eq!(
        display_from_fields(
            &no_artist,
            &[TrackDisplayField::Artist, TrackDisplayField::Title],
            " - "
        ),
        "Song"
    );
    assert_eq!(display_from_fields(&no_artist, &[], " - "), "Song");
}

#[test]
fn genre_label_capitalises_first_letter() {
    assert_eq!(genre_label(&GenreFilter::All), "All Genres");
    assert_eq!(genre_label(&GenreFilter::Only("lo-fi".into())), "Lo-fi");
    assert_eq!(genre_label(&GenreFilter::Only("Jazz".into())), "Jazz");
}

#[test]
fn format_time_renders_minutes_and_padded_seconds() {
    assert_eq!(format_time(0.0), "0:00");
    assert_eq!(format_time(9.9), "0:09");
    assert_eq!(format_time(61.0), "1:01");
    assert_eq!(format_time(f64::NAN), "0:00");
}

#[test]
fn search_matches_title_or_artist_case_insensitively() {
    let tracks = vec![
        t("1", "Summer Dreams", "Sonic J", "Pop"),
        t("2", "Rock Anthem", "SoundHelix", "Rock"),
        t("3", "Night", "summer band", "Jazz"),
    ];

    let filter = TrackFilter {
        search: "SUMMER".into(),
        genre: GenreFilter::All,
    };
    assert_eq!(ids(&filter.apply(&tracks)), vec!["1", "3"]);

    let empty = TrackFilter::default();
    assert_eq!(ids(&empty.apply(&tracks)), vec!["1", "2", "3"]);
}

#[test]
fn genre_filter_is_exact_and_combines_with_search() {
    let tracks = vec![
        t("1", "A", "X", "Rock"),
        t("2", "B", "X", "Jazz"),
        t("3", "C", "Y", "Jazz"),
        t("4", "D", "X", "jazz"),
    ];

    let jazz = TrackFilter {
        search: String::new(),
        genre: GenreFilter::Only("Jazz".into()),
    };
    assert_eq!(ids(&jazz.apply(&tracks)), vec!["2", "3"]);

    let jazz_x = TrackFilter {
        search: "x".into(),
        genre: GenreFilter::Only("Jazz".into()),
    };
    assert_eq!(ids(&jazz_x.apply(&tracks)), vec!["2"]);
}

#[test]
fn genre_options_start_with_all_and_keep_first_seen_order() {
    let tracks = vec![
        t("1", "A", "X", "Rock"),
        t("2", "B", "X", "Jazz"),
        t("3", "C", "Y", "Rock"),
    ];
    assert_eq!(
        genre_options(&tracks),
        vec![
            GenreFilter::All,
            GenreFilter::Only("Rock".into()),
            GenreFilter::Only("Jazz".into()),
        ]
    );
    assert_eq!(GenreFilter::parse("all"), GenreFilter::All);
    assert_eq!(GenreFilter::parse("Rock"), GenreFilter::Only("Rock".into()));
}

#[test]
fn draft_validation_lists_missing_fields() {
    let mut d = draft("Song");
    assert!(d.validate().is_ok());

    d.genre = "   ".into();
    d.cover_art.clear();
    let err = d.validate().unwrap_err();
    assert_eq!(err.missing, vec!["genre", "cover"]);
    assert_eq!(err.to_string(), "Please provide all track details and files.");
}

#[test]
fn memory_catalog_pushes_snapshots_in_arrival_order() {
    let mut catalog = MemoryCatalog::new();
    let rx = catalog.subscribe();
    assert!(rx.try_recv().unwrap().is_empty());

    let a = catalog.create(draft("A")).unwrap();
    let b = catalog.create(draft("B")).unwrap();
    assert_ne!(a, b);

    let _ = rx.try_recv().unwrap();
    let snapshot = rx.try_recv().unwrap();
    let titles: Vec<&str> = snapshot.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B"]);

    catalog.update(&a, draft("A2")).unwrap();
    let snapshot = rx.try_recv().unwrap();
    assert_eq!(snapshot[0].id, a);
    assert_eq!(snapshot[0].title, "A2");

    catalog.delete(&a).unwrap();
    let snapshot = rx.try_recv().unwrap();
    assert_eq!(ids(&snapshot), vec![b.as_str()]);
}

#[test]
fn memory_catalog_rejects_unknown_ids_and_incomplete_drafts() {
    let mut catalog = MemoryCatalog::new();
    let missing = TrackId::new("nope");
    assert!(matches!(
        catalog.update(&missing, draft("A")),
        Err(CatalogError::NotFound(_))
    ));
    assert!(matches!(catalog.delete(&missing), Err(CatalogError::NotFound(_))));
    assert!(matches!(
        catalog.create(TrackDraft::default()),
        Err(CatalogError::Draft(_))
    ));
}

#[test]
fn file_catalog_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("catalog.toml");

    let id = {
        let mut catalog = FileCatalog::open(&path).unwrap();
        assert!(catalog.tracks().is_empty());
        let id = catalog.create(draft("Persisted")).unwrap();
        catalog.create(draft("Second")).unwrap();
        id
    };

    let reopened = FileCatalog::open(&path).unwrap();
    let tracks = reopened.tracks();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].id, id);
    assert_eq!(tracks[0].title, "Persisted");
    assert!(!path.with_extension("toml.tmp").exists());
}

#[test]
fn file_catalog_reports_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.toml");
    fs::write(&path, "tracks = 5").unwrap();

    assert!(matches!(
        FileCatalog::open(&path),
        Err(CatalogError::Parse { .. })
    ));
}

#[test]
fn upload_rejects_oversized_files_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cover.png");
    fs::write(&path, vec![7u8; 10]).unwrap();

    let settings = UploadSettings {
        max_image_bytes: 5,
        ..UploadSettings::default()
    };
    let err = upload::file_to_data_uri(&path, UploadKind::Image, &settings).unwrap_err();
    assert!(matches!(err, UploadError::TooLarge { size: 10, max: 5, .. }));

    let defaults = UploadSettings::default();
    let err = upload::check_size(defaults.max_audio_bytes + 1, UploadKind::Audio, &defaults)
        .unwrap_err();
    assert_eq!(err.to_string(), "Audio file size must be less than 5MB");
}

#[test]
fn upload_encodes_files_as_data_uris() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cover.PNG");
    fs::write(&path, b"abc").unwrap();

    let uri = upload::file_to_data_uri(&path, UploadKind::Image, &UploadSettings::default()).unwrap();
    assert_eq!(uri, "data:image/png;base64,YWJj");
}

#[test]
fn resolve_reference_passes_uris_through() {
    let settings = UploadSettings::default();
    for uri in [
        "https://example.com/a.mp3",
        "http://example.com/a.mp3",
        "data:audio/mpeg;base64,AAAA",
        "file:///music/a.mp3",
    ] {
        assert_eq!(
            upload::resolve_reference(uri, UploadKind::Audio, &settings).unwrap(),
            uri
        );
    }

    assert!(matches!(
        upload::resolve_reference("/definitely/missing.mp3", UploadKind::Audio, &settings),
        Err(UploadError::Io { .. })
    ));
    assert_eq!(
        upload::resolve_reference("  ", UploadKind::Image, &settings).unwrap(),
        ""
    );
}
