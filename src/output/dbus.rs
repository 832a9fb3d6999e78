//! Republishes the resolved lyric state as a D-Bus service.

use anyhow::{Context as _, Result};
use zbus::{
    interface,
    object_server::{InterfaceRef, SignalEmitter},
    Connection,
};

use crate::{engine::ResolvedLyricState, track::TrackSnapshot};

use super::display_position_us;

pub const SERVICE_NAME: &str = "org.synclrc.LyricService";
pub const OBJECT_PATH: &str = "/org/synclrc/LyricService/Player";

/// Everything the service exposes. Durations and positions are in seconds.
#[derive(Debug, Clone, Default, PartialEq)]
struct Published {
    artist: String,
    title: String,
    is_playing: bool,
    current_lyric: String,
    duration: f64,
    position: f64,
}

impl Published {
    #[allow(clippy::cast_precision_loss)]
    fn new(state: &ResolvedLyricState, track: &TrackSnapshot) -> Self {
        Self {
            artist: track.artist.clone(),
            title: track.title.clone(),
            is_playing: track.is_playing,
            current_lyric: state
                .current_line(track)
                .map(|l| l.text.clone())
                .unwrap_or_default(),
            duration: track.duration_us as f64 / 1_000_000.0,
            position: display_position_us(state, track) as f64 / 1_000_000.0,
        }
    }
}

#[derive(Debug, Default)]
struct LyricService {
    published: Published,
}

#[interface(name = "org.synclrc.LyricService.Player")]
impl LyricService {
    #[zbus(property)]
    fn artist(&self) -> &str {
        &self.published.artist
    }

    #[zbus(property)]
    fn title(&self) -> &str {
        &self.published.title
    }

    #[zbus(property)]
    fn is_playing(&self) -> bool {
        self.published.is_playing
    }

    #[zbus(property)]
    fn current_lyric(&self) -> &str {
        &self.published.current_lyric
    }

    #[zbus(property)]
    fn duration(&self) -> f64 {
        self.published.duration
    }

    #[zbus(property)]
    fn position(&self) -> f64 {
        self.published.position
    }

    /// Sent on every display tick with the whole state.
    #[zbus(signal)]
    async fn state_changed(
        emitter: &SignalEmitter<'_>,
        artist: &str,
        title: &str,
        is_playing: bool,
        current_lyric: &str,
        duration: f64,
        position: f64,
    ) -> zbus::Result<()>;
}

/// The exported service on the session bus.
pub struct DbusOutput {
    service: InterfaceRef<LyricService>,
}

impl DbusOutput {
    pub async fn new(conn: &Connection) -> Result<Self> {
        let object_server = conn.object_server();
        object_server
            .at(OBJECT_PATH, LyricService::default())
            .await
            .context("Failed to export lyric service")?;
        let service = object_server
            .interface::<_, LyricService>(OBJECT_PATH)
            .await
            .context("Failed to look up exported lyric service")?;
        conn.request_name(SERVICE_NAME)
            .await
            .with_context(|| format!("Failed to acquire {SERVICE_NAME}"))?;
        tracing::info!(name = SERVICE_NAME, path = OBJECT_PATH, "Lyric service exported");
        Ok(Self { service })
    }

    pub async fn emit(&mut self, state: &ResolvedLyricState, track: &TrackSnapshot) -> Result<()> {
        self.publish(Published::new(state, track)).await
    }

    pub async fn clear(&mut self) -> Result<()> {
        self.publish(Published::default()).await
    }

    async fn publish(&mut self, next: Published) -> Result<()> {
        let emitter = self.service.signal_emitter();
        let mut service = self.service.get_mut().await;
        let previous = std::mem::replace(&mut service.published, next.clone());

        if previous.artist != next.artist {
            service.artist_changed(emitter).await?;
        }
        if previous.title != next.title {
            service.title_changed(emitter).await?;
        }
        if previous.is_playing != next.is_playing {
            service.is_playing_changed(emitter).await?;
        }
        if previous.current_lyric != next.current_lyric {
            service.current_lyric_changed(emitter).await?;
        }
        if previous.duration != next.duration {
            service.duration_changed(emitter).await?;
        }
        if previous.position != next.position {
            service.position_changed(emitter).await?;
        }
        drop(service);

        LyricService::state_changed(
            emitter,
            &next.artist,
            &next.title,
            next.is_playing,
            &next.current_lyric,
            next.duration,
            next.position,
        )
        .await
        .context("Failed to emit StateChanged")
    }
}
