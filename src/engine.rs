//! Playback position prediction and lyric line resolution.
//!
//! The player only tells us its position now and then (on a poll, a seek, or a state change). In
//! between, the position is extrapolated linearly from the last authoritative reading while the
//! track is playing, and frozen while it is not.


use std::{sync::Arc, time::Instant};

use crate::{
    lrc::LyricLine,
    track::{ChangeOutcome, TrackChange, TrackSnapshot},
};

/// The last position reported by the player and when it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionAnchor {
    pub position_us: i64,
    pub anchored_at: Instant,
}

/// The outcome of a display tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLyricState {
    pub predicted_position_us: i64,
    /// Index into the track's lyrics, [`None`] before the first line or without lyrics.
    pub active_line: Option<usize>,
}

impl ResolvedLyricState {
    /// The active line index, `-1` meaning no line.
    #[must_use]
    pub fn active_line_index(&self) -> i64 {
        self.active_line
            .and_then(|i| i64::try_from(i).ok())
            .unwrap_or(-1)
    }

    #[must_use]
    pub fn current_line<'a>(&self, track: &'a TrackSnapshot) -> Option<&'a LyricLine> {
        track.lyrics.get(self.active_line?)
    }

    #[must_use]
    pub fn next_line<'a>(&self, track: &'a TrackSnapshot) -> Option<&'a LyricLine> {
        track.lyrics.get(self.active_line.map_or(0, |i| i + 1))
    }
}

/// Index of the last line starting at or before `position_us`.
///
/// `lyrics` must be sorted by timestamp.
#[must_use]
pub fn resolve(position_us: i64, lyrics: &[LyricLine]) -> Option<usize> {
    let mut active = None;
    for (i, line) in lyrics.iter().enumerate() {
        if line.timestamp_us > position_us {
            break;
        }
        active = Some(i);
    }
    active
}

/// Owns the current track and position anchor of the followed player.
#[derive(Debug, Default)]
pub struct Engine {
    track: Arc<TrackSnapshot>,
    anchor: Option<PositionAnchor>,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A read-only view of the current track.
    #[must_use]
    pub fn track(&self) -> Arc<TrackSnapshot> {
        Arc::clone(&self.track)
    }

    #[cfg(test)]
    #[must_use]
    pub const fn anchor(&self) -> Option<PositionAnchor> {
        self.anchor
    }

    /// Merge a player notification into the current track.
    ///
    /// When the returned outcome [needs a resync](ChangeOutcome::needs_resync), the caller should
    /// ask the player for its position and call [`Engine::resync`] straight away.
    pub fn apply_change(&mut self, change: TrackChange) -> ChangeOutcome {
        let (track, outcome) = self.track.apply_change(change);
        if outcome.is_new_track {
            tracing::info!(
                track_id = %track.track_id,
                title = %track.title,
                artist = %track.artist,
                lyrics = track.lyrics.len(),
                "New track loaded"
            );
            // Positions of the previous track mean nothing for this one
            self.anchor = None;
        }
        if outcome.playback_transitioned {
            tracing::debug!(is_playing = track.is_playing, "Playback state changed");
        }
        self.track = Arc::new(track);
        outcome
    }

    /// Replace the anchor with a fresh reading from the player.
    ///
    /// `now` must be taken when `position_us` was received.
    pub fn resync(&mut self, position_us: i64, now: Instant) {
        if self.anchor.is_some() {
            let drift_us = position_us.saturating_sub(self.predict(now));
            tracing::trace!(position_us, drift_us, "Position resynced");
        }
        self.anchor = Some(PositionAnchor {
            position_us,
            anchored_at: now,
        });
    }

    /// Estimated playback position at `now`, in microseconds. Never clamped to the track.
    #[must_use]
    pub fn predict(&self, now: Instant) -> i64 {
        let Some(anchor) = self.anchor else {
            return 0;
        };
        if !self.track.is_playing {
            return anchor.position_us;
        }
        let elapsed = now.saturating_duration_since(anchor.anchored_at).as_micros();
        anchor
            .position_us
            .saturating_add(i64::try_from(elapsed).unwrap_or(i64::MAX))
    }

    #[must_use]
    pub fn tick(&self, now: Instant) -> ResolvedLyricState {
        let predicted_position_us = self.predict(now);
        ResolvedLyricState {
            predicted_position_us,
            active_line: resolve(predicted_position_us, &self.track.lyrics),
        }
    }

    /// Forget everything, as if no player had ever been seen.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
