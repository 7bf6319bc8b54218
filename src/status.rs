use core::fmt;
use std::str::FromStr;

use crate::MprisError;

/// Playback status of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
}

impl PlaybackStatus {
    pub fn is_playing(&self) -> bool {
        *self == PlaybackStatus::Playing
    }

    pub fn is_paused(&self) -> bool {
        *self == PlaybackStatus::Paused
    }

    pub fn is_stopped(&self) -> bool {
        *self == PlaybackStatus::Stopped
    }
}

impl FromStr for PlaybackStatus {
    type Err = MprisError;

    /// Parses one of the exact MPRIS literals `Playing`, `Paused` or `Stopped`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Playing" => Ok(PlaybackStatus::Playing),
            "Paused" => Ok(PlaybackStatus::Paused),
            "Stopped" => Ok(PlaybackStatus::Stopped),
            _ => Err(MprisError::invalid_argument(format!(
                "PlaybackStatus `{s}` is not Playing, Paused or Stopped"
            ))),
        }
    }
}

impl AsRef<str> for PlaybackStatus {
    fn as_ref(&self) -> &str {
        match self {
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
            PlaybackStatus::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}
