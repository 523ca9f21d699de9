//! Glypho live - live preview updater
//!
//! Fetches pre-rendered Markdown/LaTeX HTML from a Glypho server, places it
//! in a single container and keeps it current from the server's event stream.
//! The updater core is host independent; the `client` feature adds the native
//! HTTP/SSE client, the runner and the on-disk mirror.

pub mod error;
pub mod realtime;
pub mod types;
pub mod updater;

#[cfg(feature = "client")]
pub mod config;
#[cfg(feature = "client")]
pub mod mirror;

pub use error::{GlyphoError, Result};
pub use types::*;
pub use updater::{Container, Highlighter, PageUpdater, Typesetter, Update, UpdaterStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
