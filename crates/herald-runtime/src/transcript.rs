//! JSON-lines transcript of the moderated chat.
//!
//! [`FileTranscript::save`] only queues the message; a background task owns
//! the file and appends one serialized [`InboundMessage`] per line. The task
//! ends once every `FileTranscript` clone is dropped and the queue is
//! flushed.

use std::path::{Path, PathBuf};

use herald_core::{InboundMessage, Transcript, TranscriptError, TranscriptResult};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Queue-backed file recorder.
#[derive(Debug, Clone)]
pub struct FileTranscript {
    tx: mpsc::Sender<InboundMessage>,
}

impl FileTranscript {
    /// Opens (or creates) `path` for appending and starts the writer task.
    ///
    /// `buffer` is the number of messages that may wait for the writer
    /// before `save` starts failing with [`TranscriptError::Backlog`].
    pub async fn spawn(
        path: impl AsRef<Path>,
        buffer: usize,
    ) -> TranscriptResult<(Self, JoinHandle<()>)> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        info!(path = %path.display(), "Transcript recording enabled");
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let task = tokio::spawn(write_lines(path, BufWriter::new(file), rx));
        Ok((Self { tx }, task))
    }
}

impl Transcript for FileTranscript {
    fn save(&self, msg: &InboundMessage) -> TranscriptResult<()> {
        self.tx.try_send(msg.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TranscriptError::Backlog,
            mpsc::error::TrySendError::Closed(_) => TranscriptError::Closed,
        })
    }
}

async fn write_lines(
    path: PathBuf,
    mut out: BufWriter<tokio::fs::File>,
    mut rx: mpsc::Receiver<InboundMessage>,
) {
    while let Some(msg) = rx.recv().await {
        let mut line = match serde_json::to_vec(&msg) {
            Ok(line) => line,
            Err(e) => {
                warn!(msg_id = %msg.id, error = %e, "Can't serialize transcript entry");
                continue;
            }
        };
        line.push(b'\n');

        // flush per entry so the file is readable while the relay runs
        let written = async {
            out.write_all(&line).await?;
            out.flush().await
        }
        .await;

        if let Err(e) = written {
            warn!(path = %path.display(), error = %e, "Can't write transcript entry");
        }
    }

    debug!(path = %path.display(), "Transcript writer stopped");
}
