use crate::status::PlaybackStatus;

/// Represents errors that can occur while reading the player metadata bag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("The player did not report any metadata.")]
    Missing,

    #[error("The player metadata has no `xesam:title`.")]
    MissingTitle,

    #[error("The field `{field}` expected: `{expected}` but got: {got}.")]
    InvalidFieldType {
        field: String,
        expected: String,
        got: String,
    },
}

/// The class of an [`MprisError`], for callers that only care which
/// kind of failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    NoTrackPlaying,
    Metadata,
    InvalidArgument,
}

/// Represents errors that can occur while talking to a player.
#[derive(Debug, thiserror::Error)]
pub enum MprisError {
    #[error("Failed to connect to {bus}: {message}")]
    Connection { bus: String, message: String },

    #[error("No track is currently playing (status: {status}).")]
    NoTrackPlaying { status: PlaybackStatus },

    #[error("No track metadata available: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl MprisError {
    pub fn connection(bus: impl Into<String>, message: impl ToString) -> Self {
        MprisError::Connection {
            bus: bus.into(),
            message: message.to_string(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        MprisError::InvalidArgument(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MprisError::Connection { .. } => ErrorKind::Connection,
            MprisError::NoTrackPlaying { .. } => ErrorKind::NoTrackPlaying,
            MprisError::Metadata(_) => ErrorKind::Metadata,
            MprisError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }
}

/// A shorthand for `Result<T, MprisError>`.
pub type MprisResult<T> = Result<T, MprisError>;
