use std::io::{self, Write};

use anyhow::{Context as _, Result};
use serde::Serialize;

use crate::{engine::ResolvedLyricState, track::TrackSnapshot};

use super::display_position_us;

/// The state of the followed player, as printed on stdout.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LyricReport {
    is_playing: bool,
    current_lyric: String,
    next_lyric: String,
    song_title: String,
    artist: String,
    progress_ms: i64,
    duration_ms: i64,
    /// `-1` when no line is active
    line_index: i64,
}

impl LyricReport {
    pub fn new(state: &ResolvedLyricState, track: &TrackSnapshot) -> Self {
        Self {
            is_playing: track.is_playing,
            current_lyric: state
                .current_line(track)
                .map(|l| l.text.clone())
                .unwrap_or_default(),
            next_lyric: state
                .next_line(track)
                .map(|l| l.text.clone())
                .unwrap_or_default(),
            song_title: track.title.clone(),
            artist: track.artist.clone(),
            progress_ms: display_position_us(state, track) / 1000,
            duration_ms: track.duration_us / 1000,
            line_index: state.active_line_index(),
        }
    }

    /// A report for when no player is followed.
    pub fn empty() -> Self {
        Self {
            is_playing: false,
            current_lyric: String::new(),
            next_lyric: String::new(),
            song_title: String::new(),
            artist: String::new(),
            progress_ms: 0,
            duration_ms: 0,
            line_index: -1,
        }
    }

    /// Whether both reports show the same thing, disregarding progress.
    fn same_line(&self, other: &Self) -> bool {
        Self {
            progress_ms: other.progress_ms,
            ..self.clone()
        } == *other
    }

    /// Format the report as JSON and write it to the given writer.
    ///
    /// # Errors
    ///
    /// This function will return an error if writing to the given writer fails.
    pub fn format<T: Write>(&self, mut f: &mut T) -> io::Result<()> {
        serde_json::to_writer(&mut f, self)?;
        f.write_all(b"\n")?;
        f.flush()
    }
}

/// Prints a [`LyricReport`] whenever the track, playback state or lyric line changes.
#[derive(Debug, Default)]
pub struct JsonOutput {
    last: Option<LyricReport>,
}

impl JsonOutput {
    pub fn emit(&mut self, state: &ResolvedLyricState, track: &TrackSnapshot) -> Result<()> {
        let report = LyricReport::new(state, track);
        if self.last.as_ref().is_some_and(|l| l.same_line(&report)) {
            return Ok(());
        }
        report
            .format(&mut io::stdout().lock())
            .context("Failed to write lyric report")?;
        self.last = Some(report);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        let report = LyricReport::empty();
        report
            .format(&mut io::stdout().lock())
            .context("Failed to write lyric report")?;
        self.last = Some(report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::lrc::LyricLine;

    fn track() -> TrackSnapshot {
        TrackSnapshot {
            track_id: "t1".to_owned(),
            artist: "Band".to_owned(),
            title: "Song".to_owned(),
            duration_us: 10_000_000,
            is_playing: true,
            lyrics: Arc::from([LyricLine::new(0, "first"), LyricLine::new(3_000_000, "second")]),
        }
    }

    #[test]
    fn test_format() {
        let state = ResolvedLyricState {
            predicted_position_us: 1_234_567,
            active_line: Some(0),
        };
        let mut buf = Vec::new();
        LyricReport::new(&state, &track()).format(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\"is_playing\":true,\"current_lyric\":\"first\",\"next_lyric\":\"second\",\"song_title\":\"Song\",\"artist\":\"Band\",\"progress_ms\":1234,\"duration_ms\":10000,\"line_index\":0}\n"
        );
    }

    #[test]
    fn test_empty() {
        let mut buf = Vec::new();
        LyricReport::empty().format(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\"is_playing\":false,\"current_lyric\":\"\",\"next_lyric\":\"\",\"song_title\":\"\",\"artist\":\"\",\"progress_ms\":0,\"duration_ms\":0,\"line_index\":-1}\n"
        );
    }

    #[test]
    fn progress_alone_is_not_a_change() {
        let track = track();
        let a = LyricReport::new(
            &ResolvedLyricState {
                predicted_position_us: 100_000,
                active_line: Some(0),
            },
            &track,
        );
        let b = LyricReport::new(
            &ResolvedLyricState {
                predicted_position_us: 200_000,
                active_line: Some(0),
            },
            &track,
        );
        let c = LyricReport::new(
            &ResolvedLyricState {
                predicted_position_us: 3_100_000,
                active_line: Some(1),
            },
            &track,
        );
        assert!(a.same_line(&b));
        assert!(!a.same_line(&c));
    }
}
