use core::fmt;
use std::str::FromStr;

use crate::{MprisError, Track};

/// Visible characters kept by the shortened selectors.
pub const SHORT_TEXT_LEN: usize = 17;

/// Appended to text cut down to [`SHORT_TEXT_LEN`].
pub const ELLIPSIS: &str = "...";

/// Returned by [`FieldSelector::ArtUrl`] when the player gave no art.
pub const NO_ART_URL: &str = "No album art available";

/// Which piece of a [`Track`] to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSelector {
    Song,
    SongShort,
    Artist,
    ArtistShort,
    Album,
    ArtUrl,
    Display,
}

impl FieldSelector {
    pub const ALL: [FieldSelector; 7] = [
        FieldSelector::Song,
        FieldSelector::SongShort,
        FieldSelector::Artist,
        FieldSelector::ArtistShort,
        FieldSelector::Album,
        FieldSelector::ArtUrl,
        FieldSelector::Display,
    ];
}

impl FromStr for FieldSelector {
    type Err = MprisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "song" | "track" => Ok(FieldSelector::Song),
            "songshort" | "trackshort" => Ok(FieldSelector::SongShort),
            "artist" => Ok(FieldSelector::Artist),
            "artistshort" => Ok(FieldSelector::ArtistShort),
            "album" => Ok(FieldSelector::Album),
            "arturl" => Ok(FieldSelector::ArtUrl),
            "display" => Ok(FieldSelector::Display),
            _ => Err(MprisError::invalid_argument(format!(
                "unknown track field `{s}`"
            ))),
        }
    }
}

impl AsRef<str> for FieldSelector {
    fn as_ref(&self) -> &str {
        match self {
            FieldSelector::Song => "song",
            FieldSelector::SongShort => "songshort",
            FieldSelector::Artist => "artist",
            FieldSelector::ArtistShort => "artistshort",
            FieldSelector::Album => "album",
            FieldSelector::ArtUrl => "arturl",
            FieldSelector::Display => "display",
        }
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

/// Renders the selected field of `track`.
pub fn select_field(track: &Track, selector: FieldSelector) -> String {
    match selector {
        FieldSelector::Song => track.title.clone(),
        FieldSelector::SongShort => shorten(&track.title),
        FieldSelector::Artist => track.artist.clone(),
        FieldSelector::ArtistShort => shorten(&track.artist),
        FieldSelector::Album => track.album.clone(),
        FieldSelector::ArtUrl => track
            .art_url
            .clone()
            .unwrap_or_else(|| NO_ART_URL.to_string()),
        FieldSelector::Display => track.display_name(),
    }
}

/// Cuts `text` to [`SHORT_TEXT_LEN`] characters plus [`ELLIPSIS`] if it is longer.
pub fn shorten(text: &str) -> String {
    match text.char_indices().nth(SHORT_TEXT_LEN) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ErrorKind;

    fn track(title: &str, artist: &str) -> Track {
        Track {
            artist: artist.to_string(),
            title: title.to_string(),
            album: "Imagine".to_string(),
            art_url: None,
            track_id: None,
            length: Duration::from_secs(180),
        }
    }

    #[test]
    fn shortens_long_text() {
        let title = "Bohemian Rhapsody Remastered"[..25].to_string();
        assert_eq!(title.chars().count(), 25);

        let short = select_field(&track(&title, "Queen"), FieldSelector::SongShort);
        assert_eq!(short, "Bohemian Rhapsody...");
        assert_eq!(short.chars().count(), SHORT_TEXT_LEN + ELLIPSIS.len());
    }

    #[test]
    fn keeps_short_text() {
        assert_eq!(shorten("Yesterday!"), "Yesterday!");
        assert_eq!(shorten("exactly 17 chars!"), "exactly 17 chars!");
        assert_eq!(shorten(""), "");
    }

    #[test]
    fn shortens_by_characters_not_bytes() {
        let artist = "Ólafur Arnalds & Nils Frahm";
        assert_eq!(shorten(artist), "Ólafur Arnalds & ...");
    }

    #[test]
    fn selects_each_field() {
        let mut t = track("Imagine", "John Lennon");

        assert_eq!(select_field(&t, FieldSelector::Song), "Imagine");
        assert_eq!(select_field(&t, FieldSelector::Artist), "John Lennon");
        assert_eq!(select_field(&t, FieldSelector::ArtistShort), "John Lennon");
        assert_eq!(select_field(&t, FieldSelector::Album), "Imagine");
        assert_eq!(select_field(&t, FieldSelector::Display), "John Lennon - Imagine");
        assert_eq!(select_field(&t, FieldSelector::ArtUrl), NO_ART_URL);

        t.art_url = Some("https://i.scdn.co/image/abc".to_string());
        assert_eq!(
            select_field(&t, FieldSelector::ArtUrl),
            "https://i.scdn.co/image/abc"
        );
    }

    #[test]
    fn parses_selectors_and_aliases() {
        for selector in FieldSelector::ALL {
            assert_eq!(selector.to_string().parse::<FieldSelector>().unwrap(), selector);
        }

        assert_eq!("track".parse::<FieldSelector>().unwrap(), FieldSelector::Song);
        assert_eq!(
            "trackshort".parse::<FieldSelector>().unwrap(),
            FieldSelector::SongShort
        );
    }

    #[test]
    fn unknown_selector_is_invalid_argument() {
        let err = "lyrics".parse::<FieldSelector>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
