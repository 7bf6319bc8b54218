use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use zbus::{Connection, Proxy};
use zvariant::OwnedValue;

use crate::{MprisError, MprisResult, PlayerIdentity};

pub const DBUS_MPRIS_INTERFACE_NAME: &str = "org.mpris.MediaPlayer2";
pub const DBUS_MPRIS_INTERFACE_PATH: &str = "/org/mpris/MediaPlayer2";

/// A zero-argument method on `org.mpris.MediaPlayer2.Player`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMethod {
    Play,
    Pause,
    Next,
    Previous,
}

impl AsRef<str> for TransportMethod {
    fn as_ref(&self) -> &str {
        match self {
            TransportMethod::Play => "Play",
            TransportMethod::Pause => "Pause",
            TransportMethod::Next => "Next",
            TransportMethod::Previous => "Previous",
        }
    }
}

/// The remote player object, as seen through its property and method surface.
///
/// Implementations return raw D-Bus results; classification into [`MprisError`]
/// happens in [`crate::MediaClient`].
#[async_trait]
pub trait RemotePlayer: Send + Sync {
    async fn playback_status(&self) -> zbus::Result<String>;

    async fn metadata(&self) -> zbus::Result<HashMap<String, OwnedValue>>;

    /// Position in microseconds.
    async fn position(&self) -> zbus::Result<i64>;

    async fn call(&self, method: TransportMethod) -> zbus::Result<()>;
}

/// Something that can turn a [`PlayerIdentity`] into a [`RemotePlayer`].
#[async_trait]
pub trait PlayerBus: Send + Sync {
    type Player: RemotePlayer + 'static;

    /// Resolves the player object behind `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`MprisError::Connection`] if the bus is unreachable or nobody owns
    /// the player's bus name.
    async fn resolve(&self, identity: &PlayerIdentity) -> MprisResult<Self::Player>;
}

/// The D-Bus session bus. The connection is opened on first use and kept for the
/// lifetime of this value.
#[derive(Debug, Default)]
pub struct SessionBus {
    connection: OnceCell<Connection>,
}

impl SessionBus {
    pub fn new() -> Self {
        Self::default()
    }

    async fn connection(&self, identity: &PlayerIdentity) -> MprisResult<&Connection> {
        self.connection
            .get_or_try_init(Connection::session)
            .await
            .map_err(|err| {
                MprisError::connection(
                    identity.bus(),
                    format!("failed to connect to the D-Bus session bus: {err}"),
                )
            })
    }
}

#[async_trait]
impl PlayerBus for SessionBus {
    type Player = PlayerProxy;

    async fn resolve(&self, identity: &PlayerIdentity) -> MprisResult<PlayerProxy> {
        let connection = self.connection(identity).await?;

        let dbus_proxy = create_dbus_proxy(connection, identity).await?;
        let registered: bool = dbus_proxy
            .call("NameHasOwner", &(identity.bus(),))
            .await
            .map_err(|err| MprisError::connection(identity.bus(), err))?;

        if !registered {
            return Err(MprisError::connection(
                identity.bus(),
                "the name is not registered on the session bus",
            ));
        }

        let proxy = create_player_proxy(connection, identity).await?;

        Ok(PlayerProxy { proxy })
    }
}

/// Proxy for the "org.mpris.MediaPlayer2.Player" interface of one player.
#[derive(Debug, Clone)]
pub struct PlayerProxy {
    proxy: Proxy<'static>,
}

#[async_trait]
impl RemotePlayer for PlayerProxy {
    async fn playback_status(&self) -> zbus::Result<String> {
        self.proxy
            .get_property("PlaybackStatus")
            .await
            .map_err(zbus::Error::from)
    }

    async fn metadata(&self) -> zbus::Result<HashMap<String, OwnedValue>> {
        self.proxy
            .get_property("Metadata")
            .await
            .map_err(zbus::Error::from)
    }

    async fn position(&self) -> zbus::Result<i64> {
        self.proxy
            .get_property("Position")
            .await
            .map_err(zbus::Error::from)
    }

    async fn call(&self, method: TransportMethod) -> zbus::Result<()> {
        self.proxy.call_method(method.as_ref(), &()).await?;
        Ok(())
    }
}

/// Proxy for "org.freedesktop.DBus" interface.
async fn create_dbus_proxy(
    connection: &Connection,
    identity: &PlayerIdentity,
) -> MprisResult<Proxy<'static>> {
    Proxy::new(
        connection,
        "org.freedesktop.DBus",
        "/org/freedesktop/DBus",
        "org.freedesktop.DBus",
    )
    .await
    .map_err(|err| {
        MprisError::connection(
            identity.bus(),
            format!("failed to create org.freedesktop.DBus proxy: {err}"),
        )
    })
}

/// Proxy for "org.mpris.MediaPlayer2.Player" interface.
///
/// Property caching is off so every read reflects the player's current state.
async fn create_player_proxy(
    connection: &Connection,
    identity: &PlayerIdentity,
) -> MprisResult<Proxy<'static>> {
    let bus = identity.bus();
    let to_connection_err = |err: zbus::Error| MprisError::connection(bus, err);

    let proxy: Proxy = zbus::proxy::Builder::new(connection)
        .destination(bus.to_string())
        .map_err(to_connection_err)?
        .path(DBUS_MPRIS_INTERFACE_PATH)
        .map_err(to_connection_err)?
        .interface(format!("{DBUS_MPRIS_INTERFACE_NAME}.Player"))
        .map_err(to_connection_err)?
        .cache_properties(zbus::proxy::CacheProperties::No)
        .build()
        .await
        .map_err(|err| {
            MprisError::connection(
                bus,
                format!("failed to create {DBUS_MPRIS_INTERFACE_NAME}.Player proxy: {err}"),
            )
        })?;

    Ok(proxy)
}
