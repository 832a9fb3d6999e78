mod session;
mod update_listener;

use std::{io, sync::Arc, time::Instant};

use anyhow::{bail, Context as _, Result};
use futures_lite::StreamExt as _;
use tokio::{
    select,
    signal::{
        self,
        unix::{self, SignalKind},
    },
    sync::mpsc,
    time::{interval, MissedTickBehavior},
};
use zbus::{names::OwnedBusName, Connection};

use crate::{
    args::Settings,
    dbus::{player_buses, BusActivity, BusChange},
    engine::Engine,
    output::Output,
    player::PlayerUpdate,
};

use session::{PlayerSession, SessionId};

/// Follow players until interrupted or terminated.
///
/// Owns the [`Engine`]: player updates, position resyncs and display ticks are all handled here,
/// one at a time.
pub async fn event_loop(conn: Connection, settings: Settings, mut output: Output) -> Result<()> {
    let mut dbus_stream = player_buses(&conn, settings.player.clone()).await?;

    let (player_update_sender, mut player_update_receiver) = mpsc::channel(16);

    // Matching players in the order they appeared
    let mut known_players: Vec<Arc<OwnedBusName>> = Vec::new();
    let mut session: Option<PlayerSession> = None;
    let mut session_ids = SessionId::default();
    let mut engine = Engine::new();

    let mut display_timer = interval(settings.tick_interval);
    display_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    output.clear().await?;

    loop {
        select! {
            bus_change = dbus_stream.next() => {
                let Some(BusChange { name: bus_name, activity: bus_activity }) = bus_change else {
                    bail!("DBus NameOwnerChanged stream closed");
                };
                let bus_name = Arc::new(bus_name);
                match bus_activity {
                    BusActivity::Created => {
                        tracing::info!(%bus_name, "New player registered");
                        if !known_players.contains(&bus_name) {
                            known_players.push(Arc::clone(&bus_name));
                        }
                        if session.is_none() {
                            session = attach_first(&[bus_name], &mut session_ids, &conn, &settings, &player_update_sender, &mut engine).await;
                        }
                    }
                    BusActivity::Destroyed => {
                        tracing::info!(%bus_name, "Player unregistered");
                        known_players.retain(|p| *p != bus_name);
                        if session.as_ref().is_some_and(|s| s.bus == bus_name) {
                            tracing::info!(%bus_name, "Followed player is gone. Clearing previous state");
                            drop(session.take());
                            engine.reset();
                            output.clear().await?;
                            session = attach_first(&known_players, &mut session_ids, &conn, &settings, &player_update_sender, &mut engine).await;
                        }
                    }
                }
            }
            Some((session_id, player_update)) = player_update_receiver.recv() => {
                let Some(current) = session.as_ref().filter(|s| s.id == session_id) else {
                    tracing::debug!(?session_id, "Dropping update from a session no longer followed");
                    continue;
                };
                tracing::trace!(bus_name = %current.bus, ?player_update, "Player update received");
                current.apply_update(player_update, &mut engine).await;
            }
            _ = display_timer.tick(), if session.is_some() => {
                let state = engine.tick(Instant::now());
                if let Err(e) = output.emit(&state, &engine.track()).await {
                    if is_broken_pipe(&e) {
                        return Err(e.context("Output closed"));
                    }
                    tracing::error!(?e, "Failed to write output");
                }
            }
            received = &mut shutdown => {
                let signal = received?;
                tracing::info!(signal, "Shutting down");
                break;
            }
        }
    }

    drop(session);
    output.finish()
}

/// Follow the first of `candidates` that can be attached to.
async fn attach_first(
    candidates: &[Arc<OwnedBusName>],
    session_ids: &mut SessionId,
    conn: &Connection,
    settings: &Settings,
    update_sender: &mpsc::Sender<(SessionId, PlayerUpdate)>,
    engine: &mut Engine,
) -> Option<PlayerSession> {
    for bus_name in candidates {
        match PlayerSession::attach(
            Arc::clone(bus_name),
            session_ids.advance(),
            conn,
            settings,
            update_sender.clone(),
            engine,
        )
        .await
        {
            Ok(session) => return Some(session),
            Err(e) => tracing::error!(?e, %bus_name, "Failed to get player information from DBus"),
        }
    }
    if !candidates.is_empty() {
        engine.reset();
    }
    None
}

/// Resolves with the name of the first of SIGINT or SIGTERM received.
async fn shutdown_signal() -> Result<&'static str> {
    let mut terminate =
        unix::signal(SignalKind::terminate()).context("Failed to listen for SIGTERM")?;
    select! {
        result = signal::ctrl_c() => {
            result.context("Failed to listen for SIGINT")?;
            Ok("SIGINT")
        }
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

fn is_broken_pipe(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::BrokenPipe)
    })
}
