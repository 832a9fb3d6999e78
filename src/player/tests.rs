use std::collections::HashMap;

use zbus::zvariant::{ObjectPath, OwnedValue, Value};

use super::*;
use crate::lrc::LyricLine;

fn owned(v: Value<'_>) -> OwnedValue {
    OwnedValue::try_from(v).unwrap()
}

fn metadata() -> HashMap<String, OwnedValue> {
    HashMap::from([
        (
            "mpris:trackid".to_owned(),
            owned(Value::ObjectPath(ObjectPath::from_static_str_unchecked(
                "/org/musicfox/track/42",
            ))),
        ),
        ("xesam:title".to_owned(), owned(Value::from("Song"))),
        (
            "xesam:artist".to_owned(),
            owned(Value::from(vec!["Band", "Guest"])),
        ),
        ("mpris:length".to_owned(), owned(Value::I64(215_000_000))),
        (
            "xesam:asText".to_owned(),
            owned(Value::from("[00:00.00]first\n[00:03.00]second")),
        ),
        ("xesam:album".to_owned(), owned(Value::from("Ignored"))),
    ])
}

#[test]
fn playback_status_parsing() {
    assert_eq!("Playing".parse::<PlaybackStatus>().unwrap(), PlaybackStatus::Playing);
    assert_eq!("paused".parse::<PlaybackStatus>().unwrap(), PlaybackStatus::Paused);
    assert_eq!("Stopped".parse::<PlaybackStatus>().unwrap(), PlaybackStatus::Stopped);
    assert!("Buffering".parse::<PlaybackStatus>().is_err());
    assert!(PlaybackStatus::Playing.is_playing());
    assert!(!PlaybackStatus::Stopped.is_playing());
}

#[test]
fn full_player_state() {
    let change = TrackChange::from_player_state(&metadata(), Some("Playing"));
    assert_eq!(
        change,
        TrackChange {
            playing: Some(true),
            track_id: Some("/org/musicfox/track/42".to_owned()),
            title: Some("Song".to_owned()),
            artist: Some("Band".to_owned()),
            duration_us: Some(215_000_000),
            lyrics: Some("[00:00.00]first\n[00:03.00]second".to_owned()),
        }
    );
}

#[test]
fn unknown_status_is_ignored() {
    let change = TrackChange::from_player_state(&HashMap::new(), Some("Buffering"));
    assert_eq!(change.playing, None);
}

#[test]
fn metadata_without_lyrics_clears_them() {
    let mut metadata = metadata();
    metadata.remove("xesam:asText");
    let change = TrackChange::from_player_state(&metadata, None);
    assert_eq!(change.lyrics.as_deref(), Some(""));
    assert_eq!(change.playing, None);
}

#[test]
fn no_track_has_no_identity() {
    let metadata = HashMap::from([(
        "mpris:trackid".to_owned(),
        owned(Value::ObjectPath(ObjectPath::from_static_str_unchecked(NO_TRACK))),
    )]);
    let change = TrackChange::from_player_state(&metadata, None);
    assert_eq!(change.track_id.as_deref(), Some(""));
}

#[test]
fn string_track_id_and_unsigned_length() {
    let metadata = HashMap::from([
        ("mpris:trackid".to_owned(), owned(Value::from("track-7"))),
        ("mpris:length".to_owned(), owned(Value::U64(1_000))),
        ("xesam:artist".to_owned(), owned(Value::from("Solo"))),
    ]);
    let change = TrackChange::from_player_state(&metadata, None);
    assert_eq!(change.track_id.as_deref(), Some("track-7"));
    assert_eq!(change.duration_us, Some(1_000));
    assert_eq!(change.artist.as_deref(), Some("Solo"));
}

#[test]
fn concatenated_lyrics_are_split() {
    let metadata = HashMap::from([(
        "xesam:asText".to_owned(),
        owned(Value::from("[00:01.00]one [00:02.00]two")),
    )]);
    let change = TrackChange::from_player_state(&metadata, None);
    let lyrics = crate::lrc::parse(change.lyrics.as_deref().unwrap());
    assert_eq!(
        lyrics,
        vec![LyricLine::new(1_000_000, "one"), LyricLine::new(2_000_000, "two")]
    );
}

#[test]
fn status_only_properties_change() {
    let changed = HashMap::from([("PlaybackStatus", Value::from("Paused"))]);
    let change = TrackChange::from_changed_properties(&changed);
    assert_eq!(
        change,
        TrackChange {
            playing: Some(false),
            ..TrackChange::default()
        }
    );
}

#[test]
fn unrelated_properties_change() {
    let changed = HashMap::from([("Volume", Value::F64(0.5))]);
    assert!(TrackChange::from_changed_properties(&changed).is_empty());
}

#[test]
fn metadata_properties_change() {
    let metadata = metadata()
        .into_iter()
        .map(|(k, v)| (k, Value::from(v)))
        .collect::<HashMap<String, Value<'static>>>();
    let changed = HashMap::from([
        ("Metadata", Value::from(metadata)),
        ("PlaybackStatus", Value::from("Playing")),
    ]);
    let change = TrackChange::from_changed_properties(&changed);
    assert_eq!(change.playing, Some(true));
    assert_eq!(change.track_id.as_deref(), Some("/org/musicfox/track/42"));
    assert_eq!(change.title.as_deref(), Some("Song"));
    assert_eq!(change.artist.as_deref(), Some("Band"));
    assert_eq!(change.duration_us, Some(215_000_000));
    assert!(change.lyrics.is_some_and(|l| l.contains("second")));
}
