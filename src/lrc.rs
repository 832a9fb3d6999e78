//! A small parser for time-synced LRC lyrics.

#[cfg(test)]
mod tests;

use std::sync::LazyLock;

use regex::Regex;

/// `[mm:ss.xx]text` or `[mm:ss.xxx]text`, nothing else.
static LINE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d{2}):(\d{2})\.(\d{2,3})\](.*)$").expect("LRC line pattern is valid")
});

/// A time tag following a space, where players join consecutive lines.
static JOINED_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r" (\[\d{2}:\d{2}\.\d{2,3}\])").expect("joined LRC tag pattern is valid")
});

/// A single line of lyrics and the moment it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    /// Microseconds from the start of the track.
    pub timestamp_us: i64,
    /// Trimmed, never empty.
    pub text: String,
}

impl LyricLine {
    pub fn new(timestamp_us: i64, text: impl Into<String>) -> Self {
        Self {
            timestamp_us,
            text: text.into(),
        }
    }

    fn from_str(line: &str) -> Option<Self> {
        let captures = LINE_TAG.captures(line)?;
        let minutes = captures[1].parse::<i64>().ok()?;
        let seconds = captures[2].parse::<i64>().ok()?;
        let fraction = &captures[3];
        let millis = match fraction.len() {
            // Centiseconds
            2 => fraction.parse::<i64>().ok()? * 10,
            _ => fraction.parse::<i64>().ok()?,
        };
        let text = captures[4].trim();
        if text.is_empty() {
            return None;
        }
        Some(Self::new(
            (minutes * 60 + seconds) * 1_000_000 + millis * 1000,
            text,
        ))
    }
}

/// Parse raw LRC text into lines sorted by timestamp.
///
/// Lines that are not a single time tag followed by text (metadata tags, blank lines, garbage)
/// are skipped. Lines sharing a timestamp keep the order they had in the input.
#[must_use]
pub fn parse(text: &str) -> Vec<LyricLine> {
    let mut lines = text
        .lines()
        .filter_map(LyricLine::from_str)
        .collect::<Vec<_>>();
    // `sort_by_key` is stable
    lines.sort_by_key(|l| l.timestamp_us);
    lines
}

/// Undo players joining every lyric line into a single physical line.
///
/// Only a space followed by a full time tag starts a new line, so brackets inside the lyric text
/// are kept. Returns [`None`] when the text already spans several lines or has nothing to split.
#[must_use]
pub fn split_concatenated(text: &str) -> Option<String> {
    if text.lines().count() != 1 || !JOINED_TAG.is_match(text) {
        return None;
    }
    Some(JOINED_TAG.replace_all(text, "\n${1}").into_owned())
}
