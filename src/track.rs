//! What the followed player is playing right now.


use std::sync::Arc;

use crate::lrc::{self, LyricLine};

/// An immutable view of the current track.
///
/// Snapshots are never edited in place: every change builds a new one from the previous
/// snapshot and swaps it in whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSnapshot {
    pub track_id: String,
    pub artist: String,
    pub title: String,
    pub duration_us: i64,
    pub is_playing: bool,
    pub lyrics: Arc<[LyricLine]>,
}

impl Default for TrackSnapshot {
    fn default() -> Self {
        Self {
            track_id: String::new(),
            artist: String::new(),
            title: String::new(),
            duration_us: 0,
            is_playing: false,
            lyrics: Arc::from([]),
        }
    }
}

/// The fields a single player notification carries. Absent fields keep their previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackChange {
    pub playing: Option<bool>,
    pub track_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub duration_us: Option<i64>,
    /// Raw LRC text
    pub lyrics: Option<String>,
}

impl TrackChange {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// What a merge changed, as far as position tracking is concerned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeOutcome {
    pub is_new_track: bool,
    pub playback_transitioned: bool,
}

impl ChangeOutcome {
    /// The position anchor must be refreshed right away instead of on the next poll.
    #[must_use]
    pub const fn needs_resync(self) -> bool {
        self.is_new_track || self.playback_transitioned
    }
}

impl TrackSnapshot {
    /// Build the snapshot that follows `self` once `change` is applied.
    #[must_use]
    pub fn apply_change(&self, change: TrackChange) -> (Self, ChangeOutcome) {
        let is_new_track = change
            .track_id
            .as_deref()
            .is_some_and(|id| !id.is_empty() && id != self.track_id);
        let is_playing = change.playing.unwrap_or(self.is_playing);
        let lyrics = change
            .lyrics
            .as_deref()
            .map_or_else(|| Arc::clone(&self.lyrics), |text| lrc::parse(text).into());

        let snapshot = Self {
            track_id: change.track_id.unwrap_or_else(|| self.track_id.clone()),
            artist: change.artist.unwrap_or_else(|| self.artist.clone()),
            title: change.title.unwrap_or_else(|| self.title.clone()),
            duration_us: change.duration_us.unwrap_or(self.duration_us),
            is_playing,
            lyrics,
        };
        let outcome = ChangeOutcome {
            is_new_track,
            playback_transitioned: is_playing != self.is_playing,
        };
        (snapshot, outcome)
    }
}
