//! Renderings of each display tick.

mod dbus;
mod json;
mod terminal;
mod waybar;

use anyhow::Result;
use clap::ValueEnum;
use zbus::Connection;

use crate::{engine::ResolvedLyricState, track::TrackSnapshot};

pub use dbus::DbusOutput;
pub use json::JsonOutput;
pub use terminal::TerminalOutput;
pub use waybar::WaybarOutput;

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON object per line whenever the lyric line or track changes
    Json,
    /// Waybar custom module JSON
    Waybar,
    /// A single status line rewritten on every tick
    Terminal,
    /// Republish the state as a D-Bus service
    Dbus,
}

pub enum Output {
    Json(JsonOutput),
    Waybar(WaybarOutput),
    Terminal(TerminalOutput),
    Dbus(DbusOutput),
}

impl Output {
    pub async fn new(format: OutputFormat, conn: &Connection) -> Result<Self> {
        Ok(match format {
            OutputFormat::Json => Self::Json(JsonOutput::default()),
            OutputFormat::Waybar => Self::Waybar(WaybarOutput::default()),
            OutputFormat::Terminal => Self::Terminal(TerminalOutput),
            OutputFormat::Dbus => Self::Dbus(DbusOutput::new(conn).await?),
        })
    }

    /// Render one display tick.
    pub async fn emit(&mut self, state: &ResolvedLyricState, track: &TrackSnapshot) -> Result<()> {
        match self {
            Self::Json(o) => o.emit(state, track),
            Self::Waybar(o) => o.emit(state, track),
            Self::Terminal(o) => o.emit(state, track),
            Self::Dbus(o) => o.emit(state, track).await,
        }
    }

    /// Show that no player is being followed.
    pub async fn clear(&mut self) -> Result<()> {
        match self {
            Self::Json(o) => o.clear(),
            Self::Waybar(o) => o.clear(),
            Self::Terminal(o) => o.clear(),
            Self::Dbus(o) => o.clear().await,
        }
    }

    /// Leave the output in a clean state before exiting.
    pub fn finish(&mut self) -> Result<()> {
        match self {
            Self::Terminal(o) => o.finish(),
            Self::Json(_) | Self::Waybar(_) | Self::Dbus(_) => Ok(()),
        }
    }
}

/// The predicted position, kept within the track for presentation.
fn display_position_us(state: &ResolvedLyricState, track: &TrackSnapshot) -> i64 {
    let position = state.predicted_position_us.max(0);
    if track.duration_us > 0 {
        position.min(track.duration_us)
    } else {
        position
    }
}
