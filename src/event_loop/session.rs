use std::{future::Future, sync::Arc, time::Instant};

use anyhow::{Context as _, Result};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{timeout, Duration},
};
use zbus::{names::OwnedBusName, Connection};

use crate::{
    args::Settings,
    dbus::player::PlayerProxy,
    engine::Engine,
    player::PlayerUpdate,
};

use super::update_listener::get_player_info;

/// Tells successive sessions apart, even when a player comes back under the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionId(u64);

impl SessionId {
    /// Hand out a fresh id, leaving `self` on it.
    pub fn advance(&mut self) -> Self {
        self.0 += 1;
        *self
    }
}

/// The player currently followed.
///
/// Dropping the session stops its update listener.
pub struct PlayerSession {
    pub id: SessionId,
    pub bus: Arc<OwnedBusName>,
    player: PlayerProxy<'static>,
    listener: JoinHandle<Result<()>>,
    position_timeout: Duration,
}

impl PlayerSession {
    /// Start following `bus`, loading its current state into a fresh `engine`.
    pub async fn attach(
        bus: Arc<OwnedBusName>,
        id: SessionId,
        conn: &Connection,
        settings: &Settings,
        update_sender: mpsc::Sender<(SessionId, PlayerUpdate)>,
        engine: &mut Engine,
    ) -> Result<Self> {
        let (player, initial, listener) = get_player_info(
            Arc::clone(&bus),
            id,
            conn,
            settings.poll_interval,
            update_sender,
        )
        .await?;
        tracing::info!(%bus, ?id, "Following player");

        engine.reset();
        engine.apply_change(initial);
        let session = Self {
            id,
            bus,
            player,
            listener,
            position_timeout: settings.poll_interval,
        };
        session.resync(engine).await;
        Ok(session)
    }

    /// Ask the player where it is right now.
    ///
    /// On failure the previous anchor is kept until the next poll.
    pub async fn resync(&self, engine: &mut Engine) {
        match position_within(self.player.position(), self.position_timeout).await {
            Ok(position) => engine.resync(position, Instant::now()),
            Err(e) => tracing::warn!(?e, bus = %self.bus, "Failed to resync player position"),
        }
    }

    /// Feed an update from this session's listener into `engine`.
    pub async fn apply_update(&self, update: PlayerUpdate, engine: &mut Engine) {
        match update {
            PlayerUpdate::Change(change) => {
                let outcome = engine.apply_change(change);
                if outcome.needs_resync() {
                    self.resync(engine).await;
                }
            }
            PlayerUpdate::Position(position, at) => engine.resync(position, at),
        }
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Wait at most `limit` for a position query.
async fn position_within(
    request: impl Future<Output = zbus::Result<i64>>,
    limit: Duration,
) -> Result<i64> {
    timeout(limit, request)
        .await
        .context("Timed out waiting for player position")?
        .context("Failed to get player position")
}
