use std::io::{self, Write};

use anyhow::{Context as _, Result};

use crate::{engine::ResolvedLyricState, track::TrackSnapshot};

use super::display_position_us;

/// Moves to the start of the line and erases it.
const CLEAR_LINE: &str = "\r\x1b[K";

/// Rewrites a single status line on stdout every tick.
#[derive(Debug, Default)]
pub struct TerminalOutput;

/// `⏸ artist - title [12s / 215s]   ♪ lyric`
pub fn render(state: &ResolvedLyricState, track: &TrackSnapshot) -> String {
    let icon = if track.is_playing { '⏸' } else { '▶' };
    let position = display_position_us(state, track) / 1_000_000;
    let duration = track.duration_us.max(0) / 1_000_000;
    let mut line = format!(
        "{icon} {} - {} [{position}s / {duration}s]",
        track.artist, track.title
    );
    if let Some(lyric) = state.current_line(track) {
        line.push_str("   ♪ ");
        line.push_str(&lyric.text);
    }
    line
}

impl TerminalOutput {
    pub fn emit(&mut self, state: &ResolvedLyricState, track: &TrackSnapshot) -> Result<()> {
        Self::write(&format!("{CLEAR_LINE}{}", render(state, track)))
    }

    pub fn clear(&mut self) -> Result<()> {
        Self::write(CLEAR_LINE)
    }

    pub fn finish(&mut self) -> Result<()> {
        Self::write("\n")
    }

    fn write(s: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(s.as_bytes())
            .and_then(|()| stdout.flush())
            .context("Failed to write status line")
    }
}
