//! # Herald Framework
//!
//! Ready-made [`Responder`](herald_core::Responder)s for the Herald relay.
//!
//! Each responder comes with a serde configuration struct so the runtime can
//! read it straight from the `plugins` section of the configuration file.

pub mod builtin;

#[cfg(feature = "anecdote")]
pub use builtin::{Anecdote, AnecdoteConfig};
pub use builtin::{Help, HelpConfig, Sys, SysCommand, SysConfig};
