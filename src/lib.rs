//! # spotifycli
//! Control Spotify (or any other MPRIS player) over D-Bus.
//!
//! The core is [`MediaClient`], which resolves a player on a [`PlayerBus`] and turns
//! its loosely typed properties into a [`Track`], a [`PlaybackStatus`] and a position.
//! [`Command`] builds the user-facing actions on top of the [`MediaControl`] contract.
//!
//! # Usage
//!
//! ```no_run
//! use spotifycli::{ClientOptions, Command, MediaClient, PlayerIdentity, SessionBus};
//!
//! #[tokio::main]
//! pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ClientOptions {
//!         identity: PlayerIdentity::new("spotify")?,
//!         ..ClientOptions::default()
//!     };
//!     let client = MediaClient::new(SessionBus::new(), options);
//!
//!     // Prints e.g. "John Lennon - Imagine [1:30/3:00]".
//!     if let Some(line) = Command::Position.execute(&client).await? {
//!         println!("{line}");
//!     }
//!
//!     Ok(())
//! }
//! ```

mod error;
pub use error::*;

mod identity;
pub use identity::*;

mod status;
pub use status::*;

mod metadata;
pub use metadata::*;

mod track;
pub use track::*;

mod format;
pub use format::*;

mod proxies;
pub use proxies::{PlayerBus, PlayerProxy, RemotePlayer, SessionBus, TransportMethod};

mod client;
pub use client::*;

mod commands;
pub use commands::*;

mod cli;
pub use cli::*;
