use std::str::FromStr;

use crate::{MprisError, MprisResult, proxies::DBUS_MPRIS_INTERFACE_NAME};

/// The player addressed when no `--client` is given.
pub const DEFAULT_PLAYER: &str = "spotify";

/// A struct representing which player the client talks to.
///
/// The main responsibility of this struct is to store
/// a `short` and the full `bus` name (e.g., `org.mpris.MediaPlayer2.spotify`) of a player.
///
/// # Example
///
/// ```
/// use spotifycli::PlayerIdentity;
///
/// let spotify = PlayerIdentity::new("spotify").unwrap();
///
/// assert_eq!("spotify", spotify.short());
/// assert_eq!("org.mpris.MediaPlayer2.spotify", spotify.bus());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerIdentity {
    /// The short name of the player.
    short: String,

    /// The full long bus name of the player.
    bus: String,
}

impl PlayerIdentity {
    /// Creates a new player identity from a short player name such as `spotify`.
    ///
    /// Players that register instance-qualified names (e.g. `vlc.instance1234`)
    /// can be addressed by passing the whole suffix.
    ///
    /// # Errors
    ///
    /// Returns [`MprisError::InvalidArgument`] if the name is empty or any of its
    /// dot-separated elements is not a valid D-Bus name element.
    pub fn new(short: impl Into<String>) -> MprisResult<Self> {
        let short = short.into();

        if short.is_empty() {
            return Err(MprisError::invalid_argument("player name must not be empty"));
        }

        if !short.split('.').all(is_valid_element) {
            return Err(MprisError::invalid_argument(format!(
                "`{short}` is not a valid D-Bus player name"
            )));
        }

        let bus = format!("{DBUS_MPRIS_INTERFACE_NAME}.{short}");

        Ok(Self { short, bus })
    }

    /// Creates a new player identity from a full bus name.
    ///
    /// # Errors
    ///
    /// Returns [`MprisError::InvalidArgument`] if the bus name does not start with
    /// `org.mpris.MediaPlayer2.` or the remaining short name is invalid.
    pub fn from_bus(bus: &str) -> MprisResult<Self> {
        let short = bus
            .strip_prefix(DBUS_MPRIS_INTERFACE_NAME)
            .and_then(|rest| rest.strip_prefix('.'))
            .ok_or_else(|| {
                MprisError::invalid_argument(format!("`{bus}` is not an MPRIS bus name"))
            })?;

        Self::new(short)
    }

    /// Gets the short name.
    pub fn short(&self) -> &str {
        &self.short
    }

    /// Gets the bus name.
    pub fn bus(&self) -> &str {
        &self.bus
    }
}

/// Accepts either a short name (`vlc`) or a full bus name
/// (`org.mpris.MediaPlayer2.vlc`).
impl FromStr for PlayerIdentity {
    type Err = MprisError;

    fn from_str(name: &str) -> MprisResult<Self> {
        if name.starts_with(DBUS_MPRIS_INTERFACE_NAME) {
            Self::from_bus(name)
        } else {
            Self::new(name)
        }
    }
}

impl Default for PlayerIdentity {
    fn default() -> Self {
        Self {
            short: DEFAULT_PLAYER.to_string(),
            bus: format!("{DBUS_MPRIS_INTERFACE_NAME}.{DEFAULT_PLAYER}"),
        }
    }
}

// [A-Za-z0-9_-]+ and not starting with a digit.
fn is_valid_element(element: &str) -> bool {
    !element.is_empty()
        && !element.starts_with(|c: char| c.is_ascii_digit())
        && element
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
