//! Foundation layer - the data model.
//!
//! This module contains the values that move through the relay:
//! - Inbound messages and the identities that send them
//! - Answers, replies and bridge broadcasts going back out

pub mod message;
pub mod reply;

pub use message::{ChatTarget, Entity, Identity, Image, InboundMessage, MessageHandle, UserHandle};
pub use reply::{Answer, BridgeItem, Reply};
