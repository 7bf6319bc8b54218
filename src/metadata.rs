use std::{collections::HashMap, time::Duration};

use zvariant::{OwnedValue, Value};

use crate::{MetadataError, MprisResult};

pub const KEY_TRACK_ID: &str = "mpris:trackid";
pub const KEY_LENGTH: &str = "mpris:length";
pub const KEY_ART_URL: &str = "mpris:artUrl";
pub const KEY_TITLE: &str = "xesam:title";
pub const KEY_ARTIST: &str = "xesam:artist";
pub const KEY_ALBUM: &str = "xesam:album";

/// A custom wrapper type for representing a track identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackId(String);

impl AsRef<str> for TrackId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Represents the metadata bag of an MPRIS media player.
///
/// This struct stores the raw key-value pairs read from the `Metadata` property and
/// exposes typed, optional accessors for the keys this crate understands. Each
/// accessor returns `Ok(None)` when the key is absent and an error when the key is
/// present with an unexpected D-Bus type.
#[derive(Debug, Default)]
pub struct PlayerMetadata {
    metadata: HashMap<String, OwnedValue>,
}

impl PlayerMetadata {
    /// Creates a new `PlayerMetadata` instance from a raw metadata map.
    pub fn new(metadata: HashMap<String, OwnedValue>) -> Self {
        Self { metadata }
    }

    /// Returns `true` if the player reported no keys at all.
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Returns `true` if the given key is present, whatever its type.
    pub fn contains(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }

    /// Metadata mpris:trackid.
    ///
    /// Spotify reports it as a string, most other players as an object path.
    pub fn track_id(&self) -> MprisResult<Option<TrackId>> {
        self.field(KEY_TRACK_ID, "s or o", |value| match value {
            Value::Str(track_id) => Some(TrackId(track_id.to_string())),
            Value::ObjectPath(track_id) => Some(TrackId(track_id.to_string())),
            _ => None,
        })
    }

    /// Metadata xesam:title.
    pub fn title(&self) -> MprisResult<Option<String>> {
        self.string_field(KEY_TITLE)
    }

    /// Metadata xesam:album.
    pub fn album(&self) -> MprisResult<Option<String>> {
        self.string_field(KEY_ALBUM)
    }

    /// Metadata mpris:artUrl.
    pub fn art_url(&self) -> MprisResult<Option<String>> {
        self.string_field(KEY_ART_URL)
    }

    /// Metadata xesam:artist.
    ///
    /// Returns None when the key is missing or the list is empty. A bare string is
    /// accepted as a single artist since some players send one. A list holding
    /// anything but strings is a type error.
    pub fn artists(&self) -> MprisResult<Option<Vec<String>>> {
        let artists = self.field(KEY_ARTIST, "as", |value| match value {
            Value::Array(artists) => artists
                .iter()
                .map(|artist| match unwrap_variant(artist) {
                    Value::Str(artist) => Some(artist.to_string()),
                    _ => None,
                })
                .collect::<Option<Vec<String>>>(),
            Value::Str(artist) => Some(vec![artist.to_string()]),
            _ => None,
        })?;

        Ok(artists.filter(|artists| !artists.is_empty()))
    }

    /// Metadata mpris:length.
    ///
    /// Negative lengths are reported as zero.
    pub fn length(&self) -> MprisResult<Option<Duration>> {
        self.field(KEY_LENGTH, "x or t", |value| match value {
            Value::I64(length) => Some(Duration::from_micros((*length).max(0) as u64)),
            Value::U64(length) => Some(Duration::from_micros(*length)),
            Value::I32(length) => Some(Duration::from_micros((*length).max(0) as u64)),
            Value::U32(length) => Some(Duration::from_micros(u64::from(*length))),
            _ => None,
        })
    }

    fn string_field(&self, key: &str) -> MprisResult<Option<String>> {
        self.field(key, "s", |value| match value {
            Value::Str(value) => Some(value.to_string()),
            _ => None,
        })
    }

    /// Looks up `key` and converts it with `convert`, which returns None on a type mismatch.
    fn field<T>(
        &self,
        key: &str,
        expected: &str,
        convert: impl FnOnce(&Value<'_>) -> Option<T>,
    ) -> MprisResult<Option<T>> {
        let Some(raw) = self.metadata.get(key) else {
            return Ok(None);
        };

        let value = unwrap_variant(raw);

        convert(value).map(Some).ok_or_else(|| {
            MetadataError::InvalidFieldType {
                field: key.into(),
                expected: expected.into(),
                got: value.value_signature().to_string(),
            }
            .into()
        })
    }
}

fn unwrap_variant<'a, 'v>(value: &'a Value<'v>) -> &'a Value<'v> {
    match value {
        Value::Value(inner) => unwrap_variant(inner),
        other => other,
    }
}
