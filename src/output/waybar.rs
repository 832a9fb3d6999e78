use std::io::{self, Write};

use anyhow::{Context as _, Result};
use serde::Serialize;

use crate::{engine::ResolvedLyricState, track::TrackSnapshot};

use super::display_position_us;

/// A structure that can be serialized to JSON and parsed by Waybar.
#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct WaybarCustomModule {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tooltip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    percentage: Option<usize>,
}

impl WaybarCustomModule {
    /// Create a new module with the given contents.
    pub fn new(
        text: Option<&str>,
        alt: Option<&str>,
        tooltip: Option<&str>,
        class: Option<&str>,
        percentage: Option<usize>,
    ) -> Self {
        Self {
            text: text.map(html_escape::encode_text).map(String::from),
            alt: alt.map(html_escape::encode_text).map(String::from),
            tooltip: tooltip.map(html_escape::encode_text).map(String::from),
            class: class.map(html_escape::encode_text).map(String::from),
            percentage,
        }
    }

    /// A module with nothing to show, which makes Waybar hide it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The module for one display tick: the current line as text, the track as tooltip.
    pub fn from_state(state: &ResolvedLyricState, track: &TrackSnapshot) -> Self {
        let text = state.current_line(track).map_or("", |l| l.text.as_str());
        let tooltip = match (track.artist.is_empty(), track.title.is_empty()) {
            (true, true) => None,
            (false, true) => Some(track.artist.clone()),
            (true, false) => Some(track.title.clone()),
            (false, false) => Some(format!("{} - {}", track.artist, track.title)),
        };
        let class = if track.is_playing { "playing" } else { "paused" };
        let percentage = (track.duration_us > 0).then(|| {
            let position = i128::from(display_position_us(state, track));
            let percentage = position * 100 / i128::from(track.duration_us);
            usize::try_from(percentage).unwrap_or_default()
        });
        Self::new(
            Some(text),
            Some(class),
            tooltip.as_deref(),
            Some(class),
            percentage,
        )
    }

    /// Whether both modules show the same thing, disregarding the percentage.
    fn same_content(&self, other: &Self) -> bool {
        self.text == other.text && self.tooltip == other.tooltip && self.class == other.class
    }

    /// Format the module as JSON and write it to the given writer.
    ///
    /// # Errors
    ///
    /// This function will return an error if writing to the given writer fails.
    pub fn format<T: Write>(&self, mut f: &mut T) -> io::Result<()> {
        serde_json::to_writer(&mut f, self)?;
        f.write_all(b"\n")?;
        f.flush()
    }

    /// Print the module to stdout.
    ///
    /// # Errors
    ///
    /// This function will return an error if writing to stdout fails.
    pub fn print(&self) -> io::Result<()> {
        self.format(&mut io::stdout().lock())
    }
}

/// Prints a [`WaybarCustomModule`] whenever what it shows changes.
#[derive(Debug, Default)]
pub struct WaybarOutput {
    last: Option<WaybarCustomModule>,
}

impl WaybarOutput {
    pub fn emit(&mut self, state: &ResolvedLyricState, track: &TrackSnapshot) -> Result<()> {
        let module = WaybarCustomModule::from_state(state, track);
        if self.last.as_ref().is_some_and(|l| l.same_content(&module)) {
            return Ok(());
        }
        module.print().context("Failed to write Waybar module")?;
        self.last = Some(module);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        let module = WaybarCustomModule::empty();
        module.print().context("Failed to write Waybar module")?;
        self.last = Some(module);
        Ok(())
    }
}
