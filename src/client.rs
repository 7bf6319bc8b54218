use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use log::{debug, info};
use tokio::sync::Mutex;

use crate::{
    MetadataError, MprisError, MprisResult, PlaybackStatus, PlayerIdentity, PlayerMetadata,
    Track,
    proxies::{PlayerBus, RemotePlayer, TransportMethod},
};

/// Upper bound on every D-Bus round-trip unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration options for a [`MediaClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// The player to talk to.
    pub identity: PlayerIdentity,

    /// How long to wait for any single D-Bus reply.
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            identity: PlayerIdentity::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// The domain-level contract of a media player.
///
/// Identity and action operations fail with a classified [`MprisError`].
/// [`MediaControl::playback_status`] and [`MediaControl::track_position`] never fail;
/// they fall back to `Stopped` and zero so a status line keeps rendering.
#[async_trait]
pub trait MediaControl: Send + Sync {
    /// The player currently addressed.
    fn identity(&self) -> &PlayerIdentity;

    /// Makes sure the player object is resolved, reusing a cached handle.
    async fn resolve_connection(&self) -> MprisResult<()>;

    /// Drops the cached handle so the next call resolves the player again.
    async fn invalidate(&self);

    /// The track being played.
    ///
    /// # Errors
    ///
    /// - [`MprisError::NoTrackPlaying`] when the status is not `Playing`. Metadata is
    ///   not read in that case.
    /// - [`MprisError::Metadata`] when the player has no `Metadata` property, or the
    ///   bag is empty, has no title or has a wrongly typed field.
    /// - [`MprisError::Connection`] when the player cannot be reached or resolved.
    async fn current_track(&self) -> MprisResult<Track>;

    /// The raw metadata bag, read regardless of playback status.
    async fn metadata(&self) -> MprisResult<PlayerMetadata>;

    async fn play(&self) -> MprisResult<()>;

    async fn pause(&self) -> MprisResult<()>;

    async fn next(&self) -> MprisResult<()>;

    async fn previous(&self) -> MprisResult<()>;

    /// Current status, or `Stopped` if it could not be read.
    async fn playback_status(&self) -> PlaybackStatus;

    /// Current position, or zero if it could not be read.
    async fn track_position(&self) -> Duration;
}

/// A client for one MPRIS player on a [`PlayerBus`].
///
/// # Example
///
/// ```no_run
/// use spotifycli::{ClientOptions, MediaClient, MediaControl, SessionBus};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = MediaClient::new(SessionBus::new(), ClientOptions::default());
///
///     let track = client.current_track().await?;
///     println!("Current song: {}", track.display_name());
///
///     Ok(())
/// }
/// ```
pub struct MediaClient<B: PlayerBus> {
    bus: B,

    options: ClientOptions,

    /// Resolved player handle, cleared on identity change, invalidation or a bus fault.
    player: Mutex<Option<Arc<B::Player>>>,
}

impl<B: PlayerBus> MediaClient<B> {
    pub fn new(bus: B, options: ClientOptions) -> Self {
        Self {
            bus,
            options,
            player: Mutex::new(None),
        }
    }

    /// Addresses another player. The cached handle is always dropped, so setting
    /// the same identity again forces a fresh resolution.
    pub fn set_identity(&mut self, identity: PlayerIdentity) {
        debug!(
            "Switching player from {} to {}",
            self.options.identity.bus(),
            identity.bus()
        );

        self.options.identity = identity;
        *self.player.get_mut() = None;
    }

    /// Gets the resolved player, resolving it first if nothing is cached.
    pub async fn player(&self) -> MprisResult<Arc<B::Player>> {
        let mut cached = self.player.lock().await;

        if let Some(player) = cached.as_ref() {
            return Ok(Arc::clone(player));
        }

        let identity = &self.options.identity;
        debug!("Connecting to {} via D-Bus...", identity.bus());

        let player = Arc::new(
            self.bounded("resolving the player", self.bus.resolve(identity))
                .await??,
        );
        *cached = Some(Arc::clone(&player));

        Ok(player)
    }

    async fn read_status(&self) -> MprisResult<PlaybackStatus> {
        let player = self.player().await?;
        let raw = self
            .remote("reading PlaybackStatus", player.playback_status())
            .await?;
        debug!("Playback status: {raw}");

        raw.parse().map_err(|_| {
            MprisError::connection(
                self.options.identity.bus(),
                format!("the player reported an unknown PlaybackStatus `{raw}`"),
            )
        })
    }

    /// A player that answers but cannot produce its `Metadata` property reports
    /// missing metadata and keeps its handle.
    async fn read_metadata(&self) -> MprisResult<PlayerMetadata> {
        const WHAT: &str = "reading Metadata";

        let player = self.player().await?;
        let metadata = match self.attempt(WHAT, player.metadata()).await? {
            Ok(metadata) => metadata,
            Err(err) if is_unavailable_property(&err) => {
                info!("Metadata unavailable: {err}");
                return Err(MetadataError::Missing.into());
            }
            Err(err) => return Err(self.lost(WHAT, err).await),
        };
        debug!("Raw metadata: {metadata:?}");

        Ok(PlayerMetadata::new(metadata))
    }

    async fn read_position(&self) -> MprisResult<Duration> {
        let player = self.player().await?;
        let position = self.remote("reading Position", player.position()).await?;
        debug!("Position: {position}us");

        Ok(Duration::from_micros(position.max(0) as u64))
    }

    async fn transport(&self, method: TransportMethod) -> MprisResult<()> {
        let player = self.player().await?;
        debug!("Calling {} on {}", method.as_ref(), self.options.identity.bus());

        self.remote(method.as_ref(), player.call(method)).await
    }

    /// Runs one D-Bus round-trip. Any failure is a connection error and drops the
    /// cached handle.
    async fn remote<T>(
        &self,
        what: &str,
        call: impl Future<Output = zbus::Result<T>> + Send,
    ) -> MprisResult<T> {
        match self.attempt(what, call).await? {
            Ok(value) => Ok(value),
            Err(err) => Err(self.lost(what, err).await),
        }
    }

    /// Runs one bounded round-trip and hands back the reply unclassified. A
    /// timeout drops the cached handle.
    async fn attempt<T>(
        &self,
        what: &str,
        call: impl Future<Output = zbus::Result<T>> + Send,
    ) -> MprisResult<zbus::Result<T>> {
        let result = self.bounded(what, call).await;
        if result.is_err() {
            self.invalidate().await;
        }

        result
    }

    /// Drops the cached handle and turns `err` into a connection error.
    async fn lost(&self, what: &str, err: zbus::Error) -> MprisError {
        self.invalidate().await;
        MprisError::connection(self.options.identity.bus(), format!("{what} failed: {err}"))
    }

    async fn bounded<F: Future>(&self, what: &str, future: F) -> MprisResult<F::Output> {
        tokio::time::timeout(self.options.timeout, future)
            .await
            .map_err(|_| {
                MprisError::connection(
                    self.options.identity.bus(),
                    format!(
                        "{what} timed out after {}ms",
                        self.options.timeout.as_millis()
                    ),
                )
            })
    }
}

/// The player answered, but the property does not exist or its value does not
/// have the expected type.
fn is_unavailable_property(err: &zbus::Error) -> bool {
    match err {
        zbus::Error::FDO(err) => matches!(
            **err,
            zbus::fdo::Error::UnknownProperty(_) | zbus::fdo::Error::InvalidArgs(_)
        ),
        zbus::Error::Variant(_) => true,
        _ => false,
    }
}

#[async_trait]
impl<B: PlayerBus> MediaControl for MediaClient<B> {
    fn identity(&self) -> &PlayerIdentity {
        &self.options.identity
    }

    async fn resolve_connection(&self) -> MprisResult<()> {
        self.player().await.map(|_| ())
    }

    async fn invalidate(&self) {
        self.player.lock().await.take();
    }

    async fn current_track(&self) -> MprisResult<Track> {
        let status = self.read_status().await?;
        if !status.is_playing() {
            return Err(MprisError::NoTrackPlaying { status });
        }

        let metadata = self.read_metadata().await?;
        Track::from_metadata(&metadata)
    }

    async fn metadata(&self) -> MprisResult<PlayerMetadata> {
        self.read_metadata().await
    }

    async fn play(&self) -> MprisResult<()> {
        self.transport(TransportMethod::Play).await
    }

    async fn pause(&self) -> MprisResult<()> {
        self.transport(TransportMethod::Pause).await
    }

    async fn next(&self) -> MprisResult<()> {
        self.transport(TransportMethod::Next).await
    }

    async fn previous(&self) -> MprisResult<()> {
        self.transport(TransportMethod::Previous).await
    }

    async fn playback_status(&self) -> PlaybackStatus {
        self.read_status().await.unwrap_or_else(|err| {
            info!("Falling back to Stopped: {err}");
            PlaybackStatus::Stopped
        })
    }

    async fn track_position(&self) -> Duration {
        self.read_position().await.unwrap_or_else(|err| {
            info!("Falling back to position 0: {err}");
            Duration::ZERO
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{collections::HashMap, sync::Mutex as StdMutex};

    use zvariant::OwnedValue;

    use super::*;
    use crate::metadata::tests::owned;
    use crate::metadata::{KEY_ALBUM, KEY_ARTIST, KEY_LENGTH, KEY_TITLE};
    use crate::{Command, ErrorKind, MetadataError};

    pub(crate) fn imagine() -> HashMap<String, OwnedValue> {
        HashMap::from([
            (KEY_TITLE.to_string(), owned("Imagine")),
            (KEY_ARTIST.to_string(), owned(vec!["John Lennon"])),
            (KEY_ALBUM.to_string(), owned("Imagine")),
            (KEY_LENGTH.to_string(), owned(180_000_000i64)),
        ])
    }

    /// What the fake session bus and its players report.
    struct Remote {
        registered: Vec<String>,
        status: Option<&'static str>,
        metadata: Option<fn() -> HashMap<String, OwnedValue>>,
        /// Returned instead of the bag when `metadata` is None.
        metadata_fault: fn() -> zbus::Error,
        position: Option<i64>,
        hang: bool,
        resolved: Vec<String>,
        metadata_reads: usize,
        calls: Vec<TransportMethod>,
    }

    impl Default for Remote {
        fn default() -> Self {
            Self {
                registered: vec!["org.mpris.MediaPlayer2.spotify".to_string()],
                status: Some("Playing"),
                metadata: Some(imagine),
                metadata_fault: fault,
                position: Some(90_000_000),
                hang: false,
                resolved: Vec::new(),
                metadata_reads: 0,
                calls: Vec::new(),
            }
        }
    }

    #[derive(Default)]
    struct FakeBus {
        remote: Arc<StdMutex<Remote>>,
    }

    struct FakePlayer {
        remote: Arc<StdMutex<Remote>>,
    }

    fn fault() -> zbus::Error {
        zbus::Error::Failure("org.freedesktop.DBus.Error.ServiceUnknown".into())
    }

    impl FakePlayer {
        async fn maybe_hang(&self) {
            let hang = self.remote.lock().unwrap().hang;
            if hang {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
        }
    }

    #[async_trait]
    impl RemotePlayer for FakePlayer {
        async fn playback_status(&self) -> zbus::Result<String> {
            self.maybe_hang().await;
            let remote = self.remote.lock().unwrap();
            remote.status.map(str::to_string).ok_or_else(fault)
        }

        async fn metadata(&self) -> zbus::Result<HashMap<String, OwnedValue>> {
            let mut remote = self.remote.lock().unwrap();
            remote.metadata_reads += 1;
            let missing = remote.metadata_fault;
            remote.metadata.map(|build| build()).ok_or_else(missing)
        }

        async fn position(&self) -> zbus::Result<i64> {
            self.remote.lock().unwrap().position.ok_or_else(fault)
        }

        async fn call(&self, method: TransportMethod) -> zbus::Result<()> {
            self.maybe_hang().await;
            self.remote.lock().unwrap().calls.push(method);
            Ok(())
        }
    }

    #[async_trait]
    impl PlayerBus for FakeBus {
        type Player = FakePlayer;

        async fn resolve(&self, identity: &PlayerIdentity) -> MprisResult<FakePlayer> {
            let mut remote = self.remote.lock().unwrap();
            remote.resolved.push(identity.bus().to_string());

            if !remote.registered.iter().any(|bus| bus == identity.bus()) {
                return Err(MprisError::connection(identity.bus(), "not registered"));
            }

            Ok(FakePlayer {
                remote: Arc::clone(&self.remote),
            })
        }
    }

    fn client_with(remote: Remote) -> (MediaClient<FakeBus>, Arc<StdMutex<Remote>>) {
        let bus = FakeBus {
            remote: Arc::new(StdMutex::new(remote)),
        };
        let shared = Arc::clone(&bus.remote);

        (MediaClient::new(bus, ClientOptions::default()), shared)
    }

    #[tokio::test]
    async fn current_track_normalizes_metadata() {
        let (client, _) = client_with(Remote::default());

        let track = client.current_track().await.unwrap();
        assert_eq!(track.artist, "John Lennon");
        assert_eq!(track.title, "Imagine");
        assert_eq!(track.album, "Imagine");
        assert_eq!(track.length, Duration::from_secs(180));
    }

    #[tokio::test]
    async fn current_track_requires_playing_and_skips_metadata_read() {
        let (client, remote) = client_with(Remote {
            status: Some("Paused"),
            ..Remote::default()
        });

        let err = client.current_track().await.unwrap_err();
        assert!(matches!(
            err,
            MprisError::NoTrackPlaying {
                status: PlaybackStatus::Paused
            }
        ));
        assert_eq!(remote.lock().unwrap().metadata_reads, 0);
    }

    #[tokio::test]
    async fn current_track_without_title_is_a_metadata_error() {
        let (client, _) = client_with(Remote {
            metadata: Some(HashMap::new),
            ..Remote::default()
        });

        assert!(matches!(
            client.current_track().await,
            Err(MprisError::Metadata(MetadataError::Missing))
        ));
    }

    #[tokio::test]
    async fn unknown_metadata_property_is_a_metadata_error() {
        let (client, remote) = client_with(Remote {
            metadata: None,
            metadata_fault: || {
                zbus::Error::from(zbus::fdo::Error::UnknownProperty("Metadata".into()))
            },
            ..Remote::default()
        });

        for _ in 0..2 {
            let err = client.current_track().await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Metadata);
            assert!(matches!(err, MprisError::Metadata(MetadataError::Missing)));
        }

        let remote = remote.lock().unwrap();
        assert_eq!(remote.metadata_reads, 2);
        assert_eq!(remote.resolved.len(), 1);
    }

    #[tokio::test]
    async fn lost_player_while_reading_metadata_is_a_connection_error() {
        let (client, remote) = client_with(Remote {
            metadata: None,
            ..Remote::default()
        });

        assert_eq!(
            client.metadata().await.unwrap_err().kind(),
            ErrorKind::Connection
        );
        client.resolve_connection().await.unwrap();
        assert_eq!(remote.lock().unwrap().resolved.len(), 2);
    }

    #[tokio::test]
    async fn unregistered_player_is_a_connection_error() {
        let (client, _) = client_with(Remote {
            registered: Vec::new(),
            ..Remote::default()
        });

        assert_eq!(
            client.resolve_connection().await.unwrap_err().kind(),
            ErrorKind::Connection
        );
        assert_eq!(client.play().await.unwrap_err().kind(), ErrorKind::Connection);
        assert_eq!(
            client.current_track().await.unwrap_err().kind(),
            ErrorKind::Connection
        );
    }

    #[tokio::test]
    async fn passive_reads_degrade_instead_of_failing() {
        let (client, _) = client_with(Remote {
            status: None,
            position: None,
            ..Remote::default()
        });
        assert_eq!(client.playback_status().await, PlaybackStatus::Stopped);
        assert_eq!(client.track_position().await, Duration::ZERO);

        let (unreachable, _) = client_with(Remote {
            registered: Vec::new(),
            ..Remote::default()
        });
        assert_eq!(unreachable.playback_status().await, PlaybackStatus::Stopped);
        assert_eq!(unreachable.track_position().await, Duration::ZERO);
    }

    #[tokio::test]
    async fn garbage_status_reads_as_stopped() {
        let (client, _) = client_with(Remote {
            status: Some("Buffering"),
            ..Remote::default()
        });

        assert_eq!(client.playback_status().await, PlaybackStatus::Stopped);
        assert_eq!(
            client.current_track().await.unwrap_err().kind(),
            ErrorKind::Connection
        );
    }

    #[tokio::test]
    async fn negative_position_reads_as_zero() {
        let (client, _) = client_with(Remote {
            position: Some(-5),
            ..Remote::default()
        });

        assert_eq!(client.track_position().await, Duration::ZERO);
    }

    #[tokio::test]
    async fn transport_calls_reach_the_player_once() {
        let (client, remote) = client_with(Remote::default());

        client.play().await.unwrap();
        client.pause().await.unwrap();
        client.next().await.unwrap();
        client.next().await.unwrap();
        client.previous().await.unwrap();

        assert_eq!(
            remote.lock().unwrap().calls,
            vec![
                TransportMethod::Play,
                TransportMethod::Pause,
                TransportMethod::Next,
                TransportMethod::Next,
                TransportMethod::Previous,
            ]
        );
    }

    #[tokio::test]
    async fn handle_is_resolved_once_and_reused() {
        let (client, remote) = client_with(Remote::default());

        client.resolve_connection().await.unwrap();
        client.current_track().await.unwrap();
        client.playback_status().await;
        client.next().await.unwrap();

        assert_eq!(remote.lock().unwrap().resolved.len(), 1);
    }

    #[tokio::test]
    async fn switching_identity_forces_resolution() {
        let (mut client, remote) = client_with(Remote {
            registered: vec![
                "org.mpris.MediaPlayer2.spotify".to_string(),
                "org.mpris.MediaPlayer2.vlc".to_string(),
            ],
            ..Remote::default()
        });

        client.resolve_connection().await.unwrap();
        client.set_identity(PlayerIdentity::new("vlc").unwrap());
        client.resolve_connection().await.unwrap();
        client.resolve_connection().await.unwrap();

        assert_eq!(client.identity().short(), "vlc");
        assert_eq!(
            remote.lock().unwrap().resolved,
            vec![
                "org.mpris.MediaPlayer2.spotify".to_string(),
                "org.mpris.MediaPlayer2.vlc".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn bus_fault_drops_the_cached_handle() {
        let (client, remote) = client_with(Remote::default());

        client.resolve_connection().await.unwrap();
        remote.lock().unwrap().status = None;
        assert_eq!(
            client.current_track().await.unwrap_err().kind(),
            ErrorKind::Connection
        );

        remote.lock().unwrap().status = Some("Playing");
        client.current_track().await.unwrap();
        assert_eq!(remote.lock().unwrap().resolved.len(), 2);
    }

    #[tokio::test]
    async fn explicit_invalidate_forces_resolution() {
        let (client, remote) = client_with(Remote::default());

        client.resolve_connection().await.unwrap();
        client.invalidate().await;
        client.resolve_connection().await.unwrap();

        assert_eq!(remote.lock().unwrap().resolved.len(), 2);
    }

    #[tokio::test]
    async fn hung_player_times_out_as_connection_error() {
        let (bus, remote) = {
            let bus = FakeBus::default();
            let remote = Arc::clone(&bus.remote);
            (bus, remote)
        };
        remote.lock().unwrap().hang = true;

        let client = MediaClient::new(
            bus,
            ClientOptions {
                timeout: Duration::from_millis(20),
                ..ClientOptions::default()
            },
        );

        let err = client.play().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().contains("timed out"));
        assert!(remote.lock().unwrap().calls.is_empty());
        assert_eq!(client.playback_status().await, PlaybackStatus::Stopped);
    }

    #[tokio::test]
    async fn position_command_renders_through_the_client() {
        let (client, _) = client_with(Remote::default());

        let output = Command::Position.execute(&client).await.unwrap();
        assert_eq!(output.as_deref(), Some("John Lennon - Imagine [1:30/3:00]"));
    }

    #[tokio::test]
    async fn commands_follow_an_identity_switch() {
        let (mut client, remote) = client_with(Remote {
            registered: vec![
                "org.mpris.MediaPlayer2.spotify".to_string(),
                "org.mpris.MediaPlayer2.vlc".to_string(),
            ],
            ..Remote::default()
        });

        let before = Command::Status.execute(&client).await.unwrap();
        client.set_identity(PlayerIdentity::new("vlc").unwrap());
        let after = Command::Status.execute(&client).await.unwrap();

        assert_eq!(before.as_deref(), Some("John Lennon - Imagine [Playing]"));
        assert_eq!(after, before);
        assert_eq!(
            remote.lock().unwrap().resolved,
            vec![
                "org.mpris.MediaPlayer2.spotify".to_string(),
                "org.mpris.MediaPlayer2.vlc".to_string(),
            ]
        );
    }
}
