use std::sync::Arc;

use anyhow::{ensure, Context as _, Result};
use tokio::{
    sync::mpsc,
    task::{spawn, JoinHandle},
    time::Duration,
};
use tracing::instrument;
use zbus::{fdo::PropertiesProxy, names::OwnedBusName, proxy::CacheProperties, Connection};

use crate::{
    dbus::{player::PlayerProxy, MPRIS_PATH},
    player::{PlayerUpdate, PlayerUpdateListener},
    track::TrackChange,
};

use super::session::SessionId;

/// Connect to a player, read its current state and start forwarding its updates.
///
/// Returns the proxy for later position queries, the player's current state, and the handle of
/// the task feeding `update_sender`.
#[instrument(skip_all, fields(%player_name, ?session_id))]
pub async fn get_player_info(
    player_name: Arc<OwnedBusName>,
    session_id: SessionId,
    conn: &Connection,
    poll_interval: Duration,
    update_sender: mpsc::Sender<(SessionId, PlayerUpdate)>,
) -> Result<(PlayerProxy<'static>, TrackChange, JoinHandle<Result<()>>)> {
    let destination = Arc::unwrap_or_clone(Arc::clone(&player_name));
    let player = PlayerProxy::builder(conn)
        .destination(destination.clone())?
        .path(MPRIS_PATH)?
        .cache_properties(CacheProperties::No)
        .build()
        .await
        .context("Failed to create player proxy")?;
    let properties = PropertiesProxy::builder(conn)
        .destination(destination)?
        .path(MPRIS_PATH)?
        .cache_properties(CacheProperties::No)
        .build()
        .await
        .context("Failed to create properties proxy")?;

    // Subscribe before reading so nothing sent in between is missed
    let mut listener = PlayerUpdateListener::new(player.clone(), &properties, poll_interval).await?;

    let metadata = player
        .metadata()
        .await
        .inspect_err(|e| tracing::warn!(?e, "Failed to get player metadata"))
        .unwrap_or_default();
    let status = player
        .playback_status()
        .await
        .inspect_err(|e| tracing::warn!(?e, "Failed to get player playback status"))
        .ok();
    let initial = TrackChange::from_player_state(&metadata, status.as_deref());
    tracing::debug!(?initial, "Player state read");

    let listener_task = spawn(async move {
        loop {
            let update = match listener.update().await {
                Ok(Some(u)) => u,
                Ok(None) => {
                    tracing::info!(%player_name, "Player signal streams closed");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(?e, "Failed to parse MPRIS update");
                    continue;
                }
            };
            let result = update_sender.send((session_id, update)).await;
            ensure!(result.is_ok(), "Player updates listener closed");
        }
    });

    Ok((player, initial, listener_task))
}
