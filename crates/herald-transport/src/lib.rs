//! # Herald Transport
//!
//! Network front ends for the Herald relay.
//!
//! ## Features
//!
//! - `http-client`: the shared [`HttpClient`] used by web-fetching responders
//!
//! The broadcast [`LineListener`] is always available.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  herald-runtime      │  (spawns the listener, owns the bridge)
//! ├──────────────────────┤
//! │  herald-core         │  (Submitter trait)
//! ├──────────────────────┤
//! │  herald-transport    │  <- This crate
//! ├──────────────────────┤
//! │  Network (TCP/HTTP)  │
//! └──────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald_transport::{LineListener, ListenerConfig};
//!
//! let listener = LineListener::bind(ListenerConfig::default()).await?;
//! tokio::spawn(listener.run(Arc::new(bridge_handle), cancel.clone()));
//! ```

pub mod error;
pub mod listener;

#[cfg(feature = "http-client")]
pub mod http;

pub use error::{TransportError, TransportResult};
pub use listener::{DEFAULT_PINNED, LineListener, ListenerConfig};

#[cfg(feature = "http-client")]
pub use http::{DEFAULT_HTTP_TIMEOUT, HttpClient};
