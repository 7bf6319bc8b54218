use std::str::FromStr;

use crate::{
    FieldSelector, MediaControl, MprisError, MprisResult, PlayerMetadata, TrackPosition,
    metadata::{KEY_ALBUM, KEY_ARTIST, KEY_TITLE},
    select_field,
};

/// One user-facing action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Next,
    Previous,
    PlayPause,
    Status,
    Position,
    Field(FieldSelector),
    Check,
    IsPlaying,
    Help,
}

impl Command {
    /// Every command in the order `help` lists them.
    pub const ALL: [Command; 16] = [
        Command::Play,
        Command::Pause,
        Command::Next,
        Command::Previous,
        Command::PlayPause,
        Command::Status,
        Command::Position,
        Command::Field(FieldSelector::Song),
        Command::Field(FieldSelector::SongShort),
        Command::Field(FieldSelector::Artist),
        Command::Field(FieldSelector::ArtistShort),
        Command::Field(FieldSelector::Album),
        Command::Field(FieldSelector::ArtUrl),
        Command::Check,
        Command::IsPlaying,
        Command::Help,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Command::Play => "play",
            Command::Pause => "pause",
            Command::Next => "next",
            Command::Previous => "prev",
            Command::PlayPause => "playpause",
            Command::Status => "status",
            Command::Position => "position",
            Command::Field(FieldSelector::Song) => "song",
            Command::Field(FieldSelector::SongShort) => "songshort",
            Command::Field(FieldSelector::Artist) => "artist",
            Command::Field(FieldSelector::ArtistShort) => "artistshort",
            Command::Field(FieldSelector::Album) => "album",
            Command::Field(FieldSelector::ArtUrl) => "arturl",
            Command::Field(FieldSelector::Display) => "display",
            Command::Check => "check",
            Command::IsPlaying => "isplaying",
            Command::Help => "help",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::Play => "Play the current track",
            Command::Pause => "Pause the current track",
            Command::Next => "Play the next track",
            Command::Previous => "Play the previous track",
            Command::PlayPause => "Toggle between play and pause",
            Command::Status => "Show the current track and playback status",
            Command::Position => "Show the current playback position",
            Command::Field(FieldSelector::Song) => "Show the current song name",
            Command::Field(FieldSelector::SongShort) => "Show the current song name (shortened)",
            Command::Field(FieldSelector::Artist) => "Show the current artist name",
            Command::Field(FieldSelector::ArtistShort) => {
                "Show the current artist name (shortened)"
            }
            Command::Field(FieldSelector::Album) => "Show the current album name",
            Command::Field(FieldSelector::ArtUrl) => "Show the album art URL",
            Command::Field(FieldSelector::Display) => "Show `artist - song`",
            Command::Check => "Check that the player is reachable over D-Bus",
            Command::IsPlaying => "Check whether a song is currently playing",
            Command::Help => "List the available commands",
        }
    }

    /// Runs the command against `control`.
    ///
    /// Returns the text to print, if any. Transport actions are issued exactly once;
    /// a failure is returned, never retried.
    pub async fn execute(&self, control: &dyn MediaControl) -> MprisResult<Option<String>> {
        match self {
            Command::Play => control.play().await.map(|_| None),
            Command::Pause => control.pause().await.map(|_| None),
            Command::Next => control.next().await.map(|_| None),
            Command::Previous => control.previous().await.map(|_| None),
            Command::PlayPause => {
                if control.playback_status().await.is_playing() {
                    control.pause().await?;
                } else {
                    control.play().await?;
                }
                Ok(None)
            }
            Command::Status => {
                let track = control.current_track().await?;
                let status = control.playback_status().await;
                Ok(Some(format!("{} [{status}]", track.display_name())))
            }
            Command::Position => {
                let track = control.current_track().await?;
                let position = TrackPosition::new(control.track_position().await, track.length);
                Ok(Some(format!(
                    "{} [{}]",
                    track.display_name(),
                    position.formatted()
                )))
            }
            Command::Field(selector) => {
                let track = control.current_track().await?;
                Ok(Some(select_field(&track, *selector)))
            }
            Command::Check => check(control).await.map(Some),
            Command::IsPlaying => is_playing(control).await.map(Some),
            Command::Help => Ok(Some(help())),
        }
    }
}

impl FromStr for Command {
    type Err = MprisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok(Command::Play),
            "pause" => Ok(Command::Pause),
            "next" => Ok(Command::Next),
            "prev" | "previous" => Ok(Command::Previous),
            "playpause" => Ok(Command::PlayPause),
            "status" => Ok(Command::Status),
            "position" => Ok(Command::Position),
            "check" => Ok(Command::Check),
            "isplaying" => Ok(Command::IsPlaying),
            "help" => Ok(Command::Help),
            other => other
                .parse::<FieldSelector>()
                .map(Command::Field)
                .map_err(|_| MprisError::invalid_argument(format!("unknown command `{other}`"))),
        }
    }
}

fn presence(metadata: &PlayerMetadata, key: &str) -> &'static str {
    if metadata.contains(key) {
        "✓ Present"
    } else {
        "✗ Missing"
    }
}

async fn check(control: &dyn MediaControl) -> MprisResult<String> {
    let identity = control.identity();

    control.resolve_connection().await?;
    let mut lines = vec![
        "✓ Connection successful!".to_string(),
        format!("✓ Player: {} ({})", identity.short(), identity.bus()),
    ];

    match control.metadata().await {
        Ok(metadata) => {
            let available = if metadata.is_empty() {
                "Not available"
            } else {
                "Available"
            };
            lines.push(format!("✓ Metadata access: {available}"));
            lines.push(String::new());
            lines.push("Metadata fields:".to_string());
            for key in [KEY_TITLE, KEY_ARTIST, KEY_ALBUM] {
                lines.push(format!("- {key}: {}", presence(&metadata, key)));
            }
        }
        Err(err) => {
            lines.push(format!("✗ Metadata access failed: {err}"));
            lines.push(
                "  This could indicate no song is playing or the player is not fully initialized."
                    .to_string(),
            );
        }
    }

    lines.push(String::new());
    lines.push(format!("Playback status: {}", control.playback_status().await));

    Ok(lines.join("\n"))
}

async fn is_playing(control: &dyn MediaControl) -> MprisResult<String> {
    let identity = control.identity();

    control.resolve_connection().await?;
    let status = control.playback_status().await;

    let mut lines = vec![
        "✓ Player connection: OK".to_string(),
        format!("✓ Playback status: {status}"),
    ];

    if !status.is_playing() {
        lines.push(format!(
            "✗ {} is not currently playing music (status: {status})",
            identity.short()
        ));
        lines.push("  You need to play a song first for most commands to work".to_string());
        lines.push("  Try using \"spotifycli play\" to start playback".to_string());
        return Ok(lines.join("\n"));
    }

    lines.push("✓ Song is currently playing".to_string());

    let metadata = control.metadata().await.ok();
    let title = metadata
        .as_ref()
        .and_then(|metadata| metadata.title().ok().flatten());

    lines.push(match title {
        Some(title) => {
            let artists = metadata
                .as_ref()
                .and_then(|metadata| metadata.artists().ok().flatten())
                .map(|artists| artists.join(", "))
                .unwrap_or_else(|| "Unknown".to_string());
            format!("✓ Current track: \"{title}\" by {artists}")
        }
        None => "✗ No track metadata available despite playing status".to_string(),
    });

    Ok(lines.join("\n"))
}

fn help() -> String {
    let width = Command::ALL
        .iter()
        .map(|command| command.name().len())
        .max()
        .unwrap_or_default();

    let entries = Command::ALL
        .iter()
        .map(|command| (command.name(), command.description()))
        .chain([
            ("client", "Switch to another player"),
            ("exit", "Leave the shell"),
        ]);

    let mut lines = vec!["Commands:".to_string()];
    lines.extend(entries.map(|(name, description)| format!("  {name:width$}  {description}")));

    lines.join("\n")
}
