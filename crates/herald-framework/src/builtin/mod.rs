//! Built-in responders shipped with Herald.
//!
//! | Responder | Triggers | Description |
//! |-----------|----------|-------------|
//! | [`Sys`] | `ping`, `пинг`, `say!`, configured commands | Fixed answers and random quotes |
//! | [`Anecdote`] | `анекдот!`, `joke!`, `chuck!` | Jokes fetched over HTTP (`anecdote` feature) |
//! | [`Help`] | `/help`, `help`, `помощь` | Help of every other responder |
//!
//! Register [`Help`] last so it can see the others:
//!
//! ```rust,ignore
//! let mut dispatcher = PluginDispatcher::new().with(Sys::new(SysConfig::default())?);
//! let help = Help::new(HelpConfig::default(), &dispatcher.help());
//! dispatcher.add(help);
//! ```

#[cfg(feature = "anecdote")]
pub mod anecdote;
pub mod help;
pub mod sys;

#[cfg(feature = "anecdote")]
pub use anecdote::{Anecdote, AnecdoteConfig};
pub use help::{Help, HelpConfig};
pub use sys::{Sys, SysCommand, SysConfig};
