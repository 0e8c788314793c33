use super::fake::{Call, FakeBackend};
use super::source::{self, Payload, Resolved, SourceError};
use super::*;
use crate::library::{Track, TrackId};

fn track(id: &str) -> Track {
    Track {
        id: TrackId::new(id),
        title: format!("Title {id}"),
        artist: "Artist".into(),
        genre: "Rock".into(),
        url: format!("https://example.com/{id}.mp3"),
        cover_art: format!("https://example.com/{id}.jpg"),
    }
}

fn engine() -> (PlaybackEngine<FakeBackend>, FakeBackend) {
    let backend = FakeBackend::default();
    (PlaybackEngine::new(backend.clone(), 0.75), backend)
}

#[test]
fn volume_persists_across_loads() {
    let (mut engine, backend) = engine();
    engine.set_volume(0.3);
    engine.load(track("a"));
    engine.load(track("b"));

    assert_eq!(engine.state().volume, 0.3);
    assert_eq!(backend.calls(0), vec![Call::Volume(0.3)]);
    assert_eq!(backend.calls(1), vec![Call::Volume(0.3)]);
}

#[test]
fn set_volume_clamps_and_ignores_non_finite_levels() {
    let (mut engine, backend) = engine();
    engine.load(track("a"));

    engine.set_volume(1.7);
    assert_eq!(engine.state().volume, 1.0);
    engine.set_volume(-0.2);
    assert_eq!(engine.state().volume, 0.0);
    engine.set_volume(f32::NAN);
    assert_eq!(engine.state().volume, 0.0);

    assert_eq!(
        backend.calls(0),
        vec![Call::Volume(0.75), Call::Volume(1.0), Call::Volume(0.0)]
    );
}

#[test]
fn load_resets_position_duration_and_error() {
    let (mut engine, backend) = engine();
    engine.load(track("a"));
    let events = backend.latest();
    events.emit(ResourceEvent::LoadedMetadata {
        duration: Some(120.0),
    });
    events.emit(ResourceEvent::TimeUpdate(30.0));
    events.emit(ResourceEvent::Failed(PlaybackError::new(
        PlaybackErrorKind::Decode,
    )));
    engine.dispatch();

    assert_eq!(engine.state().position, 30.0);
    assert_eq!(engine.state().duration, Some(120.0));
    assert!(engine.state().error.is_some());

    engine.load(track("a"));
    assert_eq!(backend.opened(), 2);
    assert!(backend.is_dropped(0));
    assert_eq!(engine.state().position, 0.0);
    assert_eq!(engine.state().duration, None);
    assert_eq!(engine.state().error, None);
}

#[test]
fn events_from_a_previous_resource_are_discarded() {
    let (mut engine, backend) = engine();
    engine.load(track("a"));
    engine.set_playing(true);
    let old = backend.latest();

    // Same identifier, new resource.
    engine.load(track("a"));
    old.emit(ResourceEvent::Ended);
    old.emit(ResourceEvent::TimeUpdate(99.0));
    old.emit(ResourceEvent::Failed(PlaybackError::new(
        PlaybackErrorKind::Network,
    )));

    assert!(engine.dispatch().is_empty());
    assert!(engine.state().playing);
    assert_eq!(engine.state().position, 0.0);
    assert_eq!(engine.state().error, None);

    backend.latest().emit(ResourceEvent::TimeUpdate(1.5));
    assert_eq!(engine.dispatch(), vec![EngineEvent::Progress(1.5)]);
}

#[test]
fn load_while_playing_requests_a_start_on_the_new_resource() {
    let (mut engine, backend) = engine();
    engine.load(track("a"));
    engine.set_playing(true);
    engine.load(track("b"));

    assert_eq!(backend.calls(0), vec![Call::Volume(0.75), Call::Play]);
    assert_eq!(backend.calls(1), vec![Call::Volume(0.75), Call::Play]);
    assert_eq!(backend.track(1), TrackId::new("b"));
}

#[test]
fn play_without_a_track_is_ignored() {
    let (mut engine, backend) = engine();
    engine.set_playing(true);
    assert!(!engine.state().playing);
    assert_eq!(backend.opened(), 0);
}

#[test]
fn unsupported_start_forces_pause_and_records_the_reason() {
    let (mut engine, backend) = engine();
    engine.load(track("a"));
    engine.set_playing(true);
    backend
        .latest()
        .emit(ResourceEvent::StartResolved(Err(StartFailure::NotSupported(
            "no supported source".into(),
        ))));

    let events = engine.dispatch();
    let expected = PlaybackError::with_message(
        PlaybackErrorKind::SourceUnsupported,
        "Playback failed: no supported source",
    );
    assert_eq!(events, vec![EngineEvent::Error(expected.clone())]);
    assert!(!engine.state().playing);
    assert_eq!(engine.state().error, Some(expected));
}

#[test]
fn not_allowed_start_is_an_error_and_interrupted_start_is_not() {
    let (mut engine, backend) = engine();
    engine.load(track("a"));
    engine.set_playing(true);
    backend
        .latest()
        .emit(ResourceEvent::StartResolved(Err(StartFailure::Interrupted)));
    assert!(engine.dispatch().is_empty());
    assert!(engine.state().playing);
    assert_eq!(engine.state().error, None);

    backend
        .latest()
        .emit(ResourceEvent::StartResolved(Err(StartFailure::NotAllowed(
            "output refused".into(),
        ))));
    engine.dispatch();
    assert!(!engine.state().playing);
    let error = engine.state().error.clone().unwrap();
    assert_eq!(error.kind, PlaybackErrorKind::NotAllowed);
    assert_eq!(error.to_string(), "Playback failed: output refused");
}

#[test]
fn source_failure_before_start_keeps_its_kind_and_reports_once() {
    let (mut engine, backend) = engine();
    engine.load(track("a"));
    engine.set_playing(true);
    let network = PlaybackError::new(PlaybackErrorKind::Network);
    let events = backend.latest();
    events.emit(ResourceEvent::Failed(network.clone()));
    events.emit(ResourceEvent::StartResolved(Err(StartFailure::SourceFailed(
        network.clone(),
    ))));

    assert_eq!(engine.dispatch(), vec![EngineEvent::Error(network.clone())]);
    assert!(!engine.state().playing);
    assert_eq!(engine.state().error, Some(network.clone()));

    // Once dismissed, a new start reports the same failure again.
    engine.clear_error();
    engine.set_playing(true);
    events.emit(ResourceEvent::StartResolved(Err(StartFailure::SourceFailed(
        network.clone(),
    ))));
    assert_eq!(engine.dispatch(), vec![EngineEvent::Error(network.clone())]);
    assert!(!engine.state().playing);
    assert_eq!(
        engine.state().error.as_ref().map(|e| e.kind),
        Some(PlaybackErrorKind::Network)
    );
}

#[test]
fn errors_while_paused_are_still_recorded() {
    let (mut engine, backend) = engine();
    engine.load(track("a"));
    assert!(!engine.state().playing);

    backend
        .latest()
        .emit(ResourceEvent::Failed(PlaybackError::new(
            PlaybackErrorKind::SourceUnsupported,
        )));
    engine.dispatch();

    let error = engine.state().error.clone().unwrap();
    assert_eq!(error.message, "Source not supported");
    assert!(!engine.state().playing);

    engine.clear_error();
    assert_eq!(engine.state().error, None);
}

#[test]
fn metadata_clears_error_and_ended_stops_playing() {
    let (mut engine, backend) = engine();
    engine.load(track("a"));
    engine.set_playing(true);
    let events = backend.latest();

    events.emit(ResourceEvent::Failed(PlaybackError::new(
        PlaybackErrorKind::Network,
    )));
    events.emit(ResourceEvent::LoadedMetadata { duration: None });
    engine.dispatch();
    assert_eq!(engine.state().error, None);
    assert_eq!(engine.state().duration, None);

    engine.set_playing(true);
    events.emit(ResourceEvent::Ended);
    assert_eq!(engine.dispatch(), vec![EngineEvent::Ended]);
    assert!(!engine.state().playing);
}

#[test]
fn seek_is_not_clamped_and_updates_position_immediately() {
    let (mut engine, backend) = engine();
    engine.seek(10.0);
    assert_eq!(engine.state().position, 0.0);

    engine.load(track("a"));
    backend.latest().emit(ResourceEvent::LoadedMetadata {
        duration: Some(60.0),
    });
    engine.dispatch();

    engine.seek(500.0);
    assert_eq!(engine.state().position, 500.0);
    assert_eq!(backend.calls(0).last(), Some(&Call::Seek(500.0)));
}

#[test]
fn unload_tears_down_and_clears_the_session() {
    let (mut engine, backend) = engine();
    engine.load(track("a"));
    engine.set_playing(true);
    engine.unload();

    assert!(backend.is_dropped(0));
    assert!(engine.state().current.is_none());
    assert!(!engine.state().playing);
    assert_eq!(engine.state().volume, 0.75);
}

#[test]
fn metadata_replacement_keeps_the_resource() {
    let (mut engine, backend) = engine();
    engine.load(track("a"));

    let mut edited = track("a");
    edited.title = "Renamed".into();
    engine.replace_track_metadata(edited);
    engine.replace_track_metadata(track("other"));

    assert_eq!(backend.opened(), 1);
    assert!(!backend.is_dropped(0));
    let current = engine.state().current.clone().unwrap();
    assert_eq!(current.id, TrackId::new("a"));
    assert_eq!(current.title, "Renamed");
}

#[test]
fn subscribers_receive_applied_events_in_order() {
    let (mut engine, backend) = engine();
    let rx = engine.subscribe();
    engine.load(track("a"));
    engine.tick();

    let events = backend.latest();
    events.emit(ResourceEvent::LoadedMetadata {
        duration: Some(10.0),
    });
    events.emit(ResourceEvent::TimeUpdate(1.0));
    events.emit(ResourceEvent::StartResolved(Ok(())));
    engine.dispatch();

    assert_eq!(backend.calls(0), vec![Call::Volume(0.75), Call::Tick]);
    assert_eq!(rx.try_recv().unwrap(), EngineEvent::MetadataReady(Some(10.0)));
    assert_eq!(rx.try_recv().unwrap(), EngineEvent::Progress(1.0));
    assert!(rx.try_recv().is_err());
}

#[test]
fn error_kinds_have_stable_messages() {
    assert_eq!(PlaybackErrorKind::Aborted.message(), "Aborted");
    assert_eq!(PlaybackErrorKind::Network.message(), "Network error");
    assert_eq!(PlaybackErrorKind::Decode.message(), "Decoding failed");
    assert_eq!(
        PlaybackErrorKind::SourceUnsupported.message(),
        "Source not supported"
    );
    assert_eq!(
        PlaybackErrorKind::Unknown.message(),
        "An unknown error occurred"
    );
}

#[test]
fn resolve_classifies_references() {
    match source::resolve("data:audio/mpeg;base64,YWJj").unwrap() {
        Resolved::Ready(Payload::Bytes(bytes)) => assert_eq!(&bytes[..], b"abc"),
        other => panic!("unexpected {other:?}"),
    }
    match source::resolve("data:text/plain,hi").unwrap() {
        Resolved::Ready(Payload::Bytes(bytes)) => assert_eq!(&bytes[..], b"hi"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        source::resolve("https://example.com/a.mp3").unwrap(),
        Resolved::Remote(url) if url == "https://example.com/a.mp3"
    ));
    assert!(matches!(
        source::resolve("file:///music/a.mp3").unwrap(),
        Resolved::Ready(Payload::File(p)) if p == std::path::Path::new("/music/a.mp3")
    ));
    assert!(matches!(
        source::resolve("music/a.mp3").unwrap(),
        Resolved::Ready(Payload::File(_))
    ));
}

#[test]
fn source_errors_map_to_playback_error_kinds() {
    let unsupported = source::resolve("ftp://example.com/a.mp3").unwrap_err();
    assert!(matches!(unsupported, SourceError::UnsupportedScheme(_)));
    assert_eq!(unsupported.kind(), PlaybackErrorKind::SourceUnsupported);

    let bad_base64 = source::resolve("data:audio/mpeg;base64,@@@").unwrap_err();
    assert_eq!(bad_base64.kind(), PlaybackErrorKind::Decode);

    let no_comma = source::decode_data_uri("data:audio/mpeg;base64").unwrap_err();
    assert!(matches!(no_comma, SourceError::MalformedDataUri));

    assert_eq!(
        SourceError::Aborted.to_playback_error(),
        PlaybackError::new(PlaybackErrorKind::Aborted)
    );
    assert_eq!(
        SourceError::UnrecognizedFormat.to_playback_error().message,
        "Source not supported"
    );
}
