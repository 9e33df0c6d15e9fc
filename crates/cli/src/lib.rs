//! Interactive front end for Bookdeck
//!
//! [`Session`] wires a playback panel and a catalog panel to one signal bus
//! and routes every message between them. The `bookdeck` binary drives a
//! session from stdin; [`settings`] backs its `config` subcommand.

pub mod commands;
pub mod session;
pub mod settings;
pub mod view;

pub use commands::{Command, CommandError, HELP};
pub use session::{Event, Reply, Session};
