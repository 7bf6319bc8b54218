use std::{io::Write, process::ExitCode, time::Duration};

use clap::{Parser, Subcommand};
use log::debug;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    ClientOptions, Command, DEFAULT_PLAYER, DEFAULT_TIMEOUT, ErrorKind, FieldSelector,
    MediaClient, MediaControl, MprisError, MprisResult, PlayerIdentity, SessionBus,
};

/// Set to `true` (or `1`) to get the same output as `--debug`.
pub const DEBUG_ENV: &str = "SPOTIFY_CLI_DEBUG";

const PROMPT: &str = "spotifycli> ";

#[derive(Debug, Parser)]
#[command(name = "spotifycli")]
#[command(version)]
#[command(about = "Control Spotify (or any MPRIS player) from the command line")]
#[command(after_help = "Run without a command to start an interactive shell.")]
pub struct Cli {
    /// Player name, either <name> or the full org.mpris.MediaPlayer2.<name>
    #[arg(long, global = true, value_name = "name", default_value = DEFAULT_PLAYER)]
    pub client: String,

    /// Print debug output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Milliseconds to wait for each D-Bus reply
    #[arg(long, global = true, value_name = "ms", default_value_t = DEFAULT_TIMEOUT.as_millis() as u64)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum CliCommand {
    /// Play the current track
    Play,
    /// Pause the current track
    Pause,
    /// Play the next track
    Next,
    /// Play the previous track
    Prev,
    /// Toggle between play and pause
    #[command(name = "playpause")]
    PlayPause,
    /// Show the current track and playback status
    Status,
    /// Show the current playback position
    Position,
    /// Show the current song name
    Song,
    /// Show the current song name (shortened)
    #[command(name = "songshort")]
    SongShort,
    /// Show the current artist name
    Artist,
    /// Show the current artist name (shortened)
    #[command(name = "artistshort")]
    ArtistShort,
    /// Show the current album name
    Album,
    /// Show the album art URL
    #[command(name = "arturl")]
    ArtUrl,
    /// Check that the player is reachable over D-Bus
    Check,
    /// Check whether a song is currently playing
    #[command(name = "isplaying")]
    IsPlaying,
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::Play => Command::Play,
            CliCommand::Pause => Command::Pause,
            CliCommand::Next => Command::Next,
            CliCommand::Prev => Command::Previous,
            CliCommand::PlayPause => Command::PlayPause,
            CliCommand::Status => Command::Status,
            CliCommand::Position => Command::Position,
            CliCommand::Song => Command::Field(FieldSelector::Song),
            CliCommand::SongShort => Command::Field(FieldSelector::SongShort),
            CliCommand::Artist => Command::Field(FieldSelector::Artist),
            CliCommand::ArtistShort => Command::Field(FieldSelector::ArtistShort),
            CliCommand::Album => Command::Field(FieldSelector::Album),
            CliCommand::ArtUrl => Command::Field(FieldSelector::ArtUrl),
            CliCommand::Check => Command::Check,
            CliCommand::IsPlaying => Command::IsPlaying,
        }
    }
}

impl Cli {
    /// Client options from the parsed flags.
    pub fn options(&self) -> MprisResult<ClientOptions> {
        if self.timeout == 0 {
            return Err(MprisError::invalid_argument("--timeout must be at least 1ms"));
        }

        Ok(ClientOptions {
            identity: self.client.parse()?,
            timeout: Duration::from_millis(self.timeout),
        })
    }
}

/// A line typed into the interactive shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Empty,
    Exit,
    /// `client` alone shows the current player, `client <name>` switches to another.
    Client(Option<String>),
    Command(Command),
}

impl ShellInput {
    pub fn parse(line: &str) -> MprisResult<Self> {
        let mut words = line.split_whitespace();

        let Some(first) = words.next() else {
            return Ok(ShellInput::Empty);
        };

        let input = match first {
            "exit" | "quit" => ShellInput::Exit,
            "client" => ShellInput::Client(words.next().map(str::to_string)),
            command => ShellInput::Command(command.parse()?),
        };

        if let Some(extra) = words.next() {
            return Err(MprisError::invalid_argument(format!(
                "unexpected argument `{extra}`"
            )));
        }

        Ok(input)
    }
}

/// What to tell the user after an error, beyond the error itself.
pub fn hint(err: &MprisError) -> Option<&'static str> {
    match err.kind() {
        ErrorKind::Connection => Some(
            "Make sure the player is running and try again.\n\
             Tip: use --client <name> if your player is not registered as `spotify`.",
        ),
        ErrorKind::NoTrackPlaying | ErrorKind::Metadata => Some(
            "No song is currently playing or the track info is unavailable.\n\
             Play a song first, then run `spotifycli isplaying` to verify playback status.",
        ),
        ErrorKind::InvalidArgument => Some("Run `spotifycli help` to list the available commands."),
    }
}

fn report(name: &str, err: &MprisError) {
    eprintln!("Error executing {name}: {err}");
    if let Some(hint) = hint(err) {
        eprintln!("{hint}");
    }
}

/// `true` when the debug environment variable asks for debug output.
pub fn debug_from_env(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("true" | "1"))
}

fn init_logging(debug: bool) {
    let debug = debug || debug_from_env(std::env::var(DEBUG_ENV).ok().as_deref());

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }

    let _ = builder.format_timestamp(None).try_init();
}

/// Entrypoint for CLI
pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let options = match cli.options() {
        Ok(options) => options,
        Err(err) => {
            report("spotifycli", &err);
            return ExitCode::FAILURE;
        }
    };

    let mut client = MediaClient::new(SessionBus::new(), options);

    match cli.command {
        Some(command) => execute(&Command::from(command), &client).await,
        None => shell(&mut client).await,
    }
}

async fn execute(command: &Command, control: &dyn MediaControl) -> ExitCode {
    debug!(
        "Executing command: {} on {}",
        command.name(),
        control.identity().bus()
    );

    match command.execute(control).await {
        Ok(output) => {
            if let Some(output) = output {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(command.name(), &err);
            ExitCode::FAILURE
        }
    }
}

/// Reads commands from stdin one line at a time until `exit`, `quit` or end of input.
async fn shell(client: &mut MediaClient<SessionBus>) -> ExitCode {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{PROMPT}");
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                eprintln!("Failed to read input: {err}");
                return ExitCode::FAILURE;
            }
        };

        match ShellInput::parse(&line) {
            Ok(ShellInput::Empty) => {}
            Ok(ShellInput::Exit) => break,
            Ok(ShellInput::Client(None)) => println!("{}", client.identity().bus()),
            Ok(ShellInput::Client(Some(name))) => match name.parse::<PlayerIdentity>() {
                Ok(identity) => {
                    client.set_identity(identity);
                    println!("Using {}", client.identity().bus());
                }
                Err(err) => report("client", &err),
            },
            Ok(ShellInput::Command(command)) => {
                execute(&command, &*client).await;
            }
            Err(err) => report(line.trim(), &err),
        }
    }

    ExitCode::SUCCESS
}
