use anyhow::{Context as _, Result};
use futures_lite::{stream::iter, Stream, StreamExt as _};
use zbus::{fdo::DBusProxy, names::OwnedBusName, Connection};

pub mod player;

/// Every MPRIS player owns a name below this prefix.
pub const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";
/// The object all MPRIS interfaces live on.
pub const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";
pub const PLAYER_INTERFACE: &str = "org.mpris.MediaPlayer2.Player";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusActivity {
    Created,
    Destroyed,
}

/// D-Bus's activity parsed from `NameOwnerChanged` signal
#[derive(Debug)]
pub struct BusChange {
    pub name: OwnedBusName,
    pub activity: BusActivity,
}
impl BusChange {
    pub const fn new(name: OwnedBusName, activity: BusActivity) -> Self {
        Self { name, activity }
    }
    pub const fn new_existing(name: OwnedBusName) -> Self {
        Self {
            name,
            activity: BusActivity::Created,
        }
    }
    /// Whether the bus belongs to the player the user asked for (`all` matches any).
    pub fn matches_player(&self, player: &str) -> bool {
        matches_player(&self.name, player)
    }
}

fn is_mpris_name(name: &str) -> bool {
    name.starts_with(MPRIS_PREFIX)
}

fn matches_player(name: &str, player: &str) -> bool {
    if !is_mpris_name(name) {
        return false;
    }
    if player == "all" {
        return true;
    }
    // Instances are suffixed, e.g. `org.mpris.MediaPlayer2.vlc.instance1234`
    name[MPRIS_PREFIX.len()..]
        .strip_prefix(player)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

/// Return a stream of the MPRIS players on the bus matching `player`, existing ones first
pub async fn player_buses(
    conn: &Connection,
    player: String,
) -> Result<impl Stream<Item = BusChange>> {
    let proxy = DBusProxy::new(conn)
        .await
        .context("Failed to create DBusProxy")?;

    let existing_names = iter(
        proxy
            .list_names()
            .await
            .context("Failed to list currently-owned names on DBus")?
            .into_iter()
            .map(BusChange::new_existing),
    );
    let new_activities = proxy
        .receive_name_owner_changed()
        .await
        .context("Failed to listen for NameOwnerChanged signal on DBus")?
        .filter_map(|s| {
            let args = s
                .args()
                .inspect_err(|e| tracing::warn!(?e, "Failed to parse NameOwnerChanged argument"))
                .ok()?;
            let change = match (args.new_owner.is_some(), args.old_owner.is_some()) {
                (true, false) => BusActivity::Created,
                (false, true) => BusActivity::Destroyed,
                _ => return None,
            };
            Some(BusChange::new(args.name.into(), change))
        });

    Ok(existing_names
        .chain(new_activities)
        .filter(move |c| c.matches_player(&player)))
}
