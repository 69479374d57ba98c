//! Transcript recording boundary.

use crate::error::TranscriptResult;
use crate::foundation::InboundMessage;

/// Persists messages of the moderated chat for later export.
///
/// `save` is called from inside the relay loop and must not block; an
/// implementation hands the message off and returns. Errors are logged by
/// the caller and never stop the relay.
pub trait Transcript: Send + Sync {
    /// Hands a message to the recorder.
    fn save(&self, msg: &InboundMessage) -> TranscriptResult<()>;
}

/// A recorder that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTranscript;

impl Transcript for NullTranscript {
    fn save(&self, _msg: &InboundMessage) -> TranscriptResult<()> {
        Ok(())
    }
}
