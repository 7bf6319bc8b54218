use std::time::Duration;

use crate::{MetadataError, MprisResult, PlayerMetadata, TrackId};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// The track a player currently has loaded.
///
/// Built fresh from the metadata bag on every query, with placeholders
/// substituted for missing optional fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// All artists joined with `, `.
    pub artist: String,
    pub title: String,
    pub album: String,
    pub art_url: Option<String>,
    pub track_id: Option<TrackId>,
    pub length: Duration,
}

impl Track {
    /// Normalizes a metadata bag into a track.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Missing`] for an empty bag, [`MetadataError::MissingTitle`]
    /// when there is no usable title and [`MetadataError::InvalidFieldType`] when any
    /// known key has an unexpected type.
    pub fn from_metadata(metadata: &PlayerMetadata) -> MprisResult<Self> {
        if metadata.is_empty() {
            return Err(MetadataError::Missing.into());
        }

        let title = metadata
            .title()?
            .filter(|title| !title.is_empty())
            .ok_or(MetadataError::MissingTitle)?;

        let artist = metadata
            .artists()?
            .map(|artists| artists.join(", "))
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());

        let album = metadata
            .album()?
            .filter(|album| !album.is_empty())
            .unwrap_or_else(|| UNKNOWN_ALBUM.to_string());

        Ok(Self {
            artist,
            title,
            album,
            art_url: metadata.art_url()?.filter(|url| !url.is_empty()),
            track_id: metadata.track_id()?,
            length: metadata.length()?.unwrap_or_default(),
        })
    }

    /// `artist - title`.
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }
}

/// Formats a duration as `minutes:seconds`, without rolling over into hours.
pub fn format_time(time: Duration) -> String {
    let total_seconds = time.as_secs();
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// A playback position within a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackPosition {
    pub position: Duration,
    pub total: Duration,
}

impl TrackPosition {
    pub fn new(position: Duration, total: Duration) -> Self {
        Self { position, total }
    }

    pub fn formatted_position(&self) -> String {
        format_time(self.position)
    }

    pub fn formatted_total(&self) -> String {
        format_time(self.total)
    }

    /// `position/total`, e.g. `1:30/3:00`.
    pub fn formatted(&self) -> String {
        format!("{}/{}", self.formatted_position(), self.formatted_total())
    }

    /// Floor of the completed percentage, 0 for a zero-length track and
    /// clamped to 100 when the position runs past the total.
    pub fn percent_complete(&self) -> u8 {
        let total = self.total.as_micros();
        if total == 0 {
            return 0;
        }

        let percent = self.position.as_micros() * 100 / total;
        percent.min(100) as u8
    }
}
