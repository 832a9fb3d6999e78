//! Translation of MPRIS player properties into [`TrackChange`]s.

#[cfg(test)]
mod tests;

use std::{collections::HashMap, ops::Deref as _, str::FromStr, time::Instant};

use anyhow::{anyhow, Context as _, Result};
use futures_lite::{stream::Fuse, StreamExt as _};
use tokio::{
    select,
    time::{interval, Duration, Interval, MissedTickBehavior},
};
use zbus::{
    fdo::{PropertiesChangedStream, PropertiesProxy},
    zvariant::{OwnedValue, Value},
};

use crate::{
    dbus::{
        player::{PlayerProxy, SeekedStream},
        PLAYER_INTERFACE,
    },
    lrc,
    track::TrackChange,
    utils::{extract_first_str, extract_i64, extract_str, extract_text},
};

/// Track id MPRIS players report when nothing is loaded.
const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";

/// Current playback status of a MPRIS-compliant player
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
}
impl FromStr for PlaybackStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "playing" => Ok(Self::Playing),
            "paused" => Ok(Self::Paused),
            "stopped" => Ok(Self::Stopped),
            _ => Err(anyhow!("Unknown PlaybackStatus {s}")),
        }
    }
}
impl PlaybackStatus {
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl TrackChange {
    /// Build a change out of the `Metadata` and `PlaybackStatus` the player currently exposes.
    pub fn from_player_state(metadata: &HashMap<String, OwnedValue>, status: Option<&str>) -> Self {
        let mut change = Self::default();
        for (key, value) in metadata {
            change.set_metadata_entry(key, value.deref());
        }
        change.finish_metadata();
        change.set_playback_status(status);
        change
    }

    /// Build a change out of the `changed_properties` of a `PropertiesChanged` signal.
    pub fn from_changed_properties(changed: &HashMap<&str, Value<'_>>) -> Self {
        let mut change = Self::default();
        if let Some(metadata) = changed.get("Metadata") {
            match crate::utils::peel(metadata) {
                Value::Dict(entries) => {
                    for (key, value) in entries.iter() {
                        let Some(key) = extract_str(key) else { continue };
                        change.set_metadata_entry(key.as_str(), value);
                    }
                    change.finish_metadata();
                }
                v => tracing::warn!(?v, "Metadata is not a dictionary"),
            }
        }
        change.set_playback_status(
            changed
                .get("PlaybackStatus")
                .and_then(extract_str)
                .map(|s| s.as_str()),
        );
        change
    }

    /// `Metadata` always carries the whole map, so a missing `xesam:asText` means the track has
    /// no lyrics rather than "unchanged".
    fn finish_metadata(&mut self) {
        self.lyrics.get_or_insert_with(String::new);
    }

    fn set_playback_status(&mut self, status: Option<&str>) {
        let Some(status) = status else { return };
        match status.parse::<PlaybackStatus>() {
            Ok(status) => self.playing = Some(status.is_playing()),
            Err(e) => tracing::warn!(?e, "Ignoring playback status"),
        }
    }

    fn set_metadata_entry(&mut self, key: &str, value: &Value<'_>) {
        match key {
            "mpris:trackid" => {
                self.track_id = extract_text(value)
                    .map(|id| if id == NO_TRACK { "" } else { id })
                    .map(ToOwned::to_owned);
            }
            "xesam:title" => self.title = extract_str(value).map(|s| s.to_string()),
            "xesam:artist" => self.artist = extract_first_str(value).map(ToOwned::to_owned),
            "mpris:length" => self.duration_us = extract_i64(value),
            "xesam:asText" => {
                self.lyrics = extract_str(value).map(|text| {
                    lrc::split_concatenated(text).unwrap_or_else(|| text.to_string())
                });
            }
            _ => {}
        }
    }
}

/// Something the followed player told us.
#[derive(Debug)]
pub enum PlayerUpdate {
    Change(TrackChange),
    /// An authoritative position and the moment it was received.
    Position(i64, Instant),
}

/// Waits for the next [`PlayerUpdate`] of a single player.
pub struct PlayerUpdateListener<'a> {
    player: PlayerProxy<'a>,
    properties_stream: Fuse<PropertiesChangedStream>,
    seeked: Fuse<SeekedStream>,
    position_refresh_stream: Interval,
}

impl<'a> PlayerUpdateListener<'a> {
    pub async fn new(
        player: PlayerProxy<'a>,
        properties: &PropertiesProxy<'_>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let mut position_refresh_stream = interval(poll_interval);
        position_refresh_stream.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes at once and the caller already holds a fresh position
        position_refresh_stream.reset();
        Ok(Self {
            properties_stream: properties
                .receive_properties_changed()
                .await
                .context("Failed to listen for PropertiesChanged signal")?
                .fuse(),
            seeked: player
                .receive_seeked()
                .await
                .context("Failed to receive seek signal")?
                .fuse(),
            position_refresh_stream,
            player,
        })
    }

    /// Returns `Ok(None)` once the player stops sending signals.
    pub async fn update(&mut self) -> Result<Option<PlayerUpdate>> {
        loop {
            select! {
                changed = self.properties_stream.next() => {
                    let Some(changed) = changed else { return Ok(None) };
                    let args = changed.args().context("Failed to parse PropertiesChanged arguments")?;
                    if args.interface_name().as_str() != PLAYER_INTERFACE {
                        continue;
                    }
                    let change = TrackChange::from_changed_properties(args.changed_properties());
                    if change.is_empty() {
                        // Volume, rate, capabilities...
                        continue;
                    }
                    return Ok(Some(PlayerUpdate::Change(change)));
                }
                seek = self.seeked.next() => {
                    let Some(seek) = seek else { return Ok(None) };
                    return seek.args().context("Failed to get player seeked position").map(|p| Some(PlayerUpdate::Position(p.position, Instant::now())));
                }
                _ = self.position_refresh_stream.tick() => {
                    return self.player.position().await.context("Failed to get player position").map(|p| Some(PlayerUpdate::Position(p, Instant::now())));
                }
            }
        }
    }
}
