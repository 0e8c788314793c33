use super::*;
use crate::library::TrackId;
use std::sync::mpsc;

fn make_track(url: &str) -> Track {
    Track {
        id: TrackId::new("3f2b-77aa"),
        title: "Test Title".to_string(),
        artist: "Test Artist".to_string(),
        genre: "Jazz".to_string(),
        url: url.to_string(),
        cover_art: "data:image/png;base64,AAAA".to_string(),
    }
}

#[test]
fn set_track_metadata_sets_and_clears_shared_state() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let handle = MprisHandle {
        state: state.clone(),
    };

    handle.set_playback(PlaybackStatus::Playing);
    let track = make_track("https://example.com/a.mp3");
    handle.set_track_metadata(Some(&track), Some(1.234_567));

    {
        let s = state.lock().unwrap();
        assert_eq!(s.title.as_deref(), Some("Test Title"));
        assert_eq!(s.artist, vec!["Test Artist".to_string()]);
        assert_eq!(s.genre, vec!["Jazz".to_string()]);
        assert_eq!(s.url.as_deref(), Some("https://example.com/a.mp3"));
        assert_eq!(s.art_url, None);
        assert_eq!(s.length_micros, Some(1_234_567));
        assert_eq!(
            s.track_id.as_deref(),
            Some("/org/mpris/MediaPlayer2/track/t3f2b_77aa")
        );
    }

    handle.set_track_metadata(None, None);
    {
        let s = state.lock().unwrap();
        assert_eq!(s.title, None);
        assert!(s.artist.is_empty());
        assert_eq!(s.url, None);
        assert_eq!(s.length_micros, None);
        assert!(s.track_id.is_none());
        assert_eq!(s.playback, PlaybackStatus::Playing);
    }
}

#[test]
fn playback_status_maps_state_to_mpris_strings() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (tx, _rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface {
        tx,
        state: state.clone(),
    };

    assert_eq!(iface.playback_status(), "Stopped");

    state.lock().unwrap().playback = PlaybackStatus::Playing;
    assert_eq!(iface.playback_status(), "Playing");

    state.lock().unwrap().playback = PlaybackStatus::Paused;
    assert_eq!(iface.playback_status(), "Paused");
}

#[test]
fn status_follows_the_session() {
    let mut session = PlaybackState::new(0.5);
    assert_eq!(PlaybackStatus::from_state(&session), PlaybackStatus::Stopped);

    session.current = Some(make_track("https://example.com/a.mp3"));
    assert_eq!(PlaybackStatus::from_state(&session), PlaybackStatus::Paused);

    session.playing = true;
    assert_eq!(PlaybackStatus::from_state(&session), PlaybackStatus::Playing);
}

#[test]
fn metadata_includes_expected_keys_when_present() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (tx, _rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface {
        tx,
        state: state.clone(),
    };
    let handle = MprisHandle {
        state: state.clone(),
    };

    let mut track = make_track("file:///tmp/test.mp3");
    track.cover_art = "https://example.com/cover.jpg".into();
    handle.set_track_metadata(Some(&track), Some(42.0));

    let map = iface.metadata();
    for k in [
        "mpris:trackid",
        "xesam:title",
        "xesam:artist",
        "xesam:genre",
        "xesam:url",
        "mpris:artUrl",
        "mpris:length",
    ] {
        assert!(map.contains_key(k), "missing key: {k}");
    }
}

#[test]
fn control_methods_forward_commands() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (tx, rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface { tx, state };

    iface.play_pause();
    iface.next();
    iface.previous();

    assert!(matches!(rx.try_recv(), Ok(ControlCmd::PlayPause)));
    assert!(matches!(rx.try_recv(), Ok(ControlCmd::Next)));
    assert!(matches!(rx.try_recv(), Ok(ControlCmd::Prev)));
}
