//! Domain events for the generation pipeline.
//!
//! A generation run emits a finite sequence of [`ProgressEvent`]s through a
//! [`ProgressSink`] and finishes with exactly one [`GenerationOutcome`].

use serde::Serialize;
use std::fmt;

/// Progress notifications emitted while a generation run is in flight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum ProgressEvent {
    /// Resolving the source image for the image-to-video pipeline.
    DownloadingImage,
    /// Passthrough status from the render backend.
    Rendering { status: String },
    /// Delivering the finished artifact to the chat.
    Uploading,
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DownloadingImage => write!(f, "Downloading source image..."),
            Self::Rendering { status } => write!(f, "{status}"),
            Self::Uploading => write!(f, "Uploading video..."),
        }
    }
}

/// Terminal result of a single generation run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum GenerationOutcome {
    /// Artifact delivered to the chat and credit settled.
    Delivered,
    /// Artifact exceeded the delivery ceiling; nothing was sent or debited.
    Oversized { size_mb: u64 },
    /// Rendering or delivery failed; message is safe to show to the user.
    Failed { message: String },
}

/// Observer for progress notifications. The bot's sink edits the status
/// message in the chat; tests record events instead.
#[async_trait::async_trait]
pub trait ProgressSink: Send + Sync {
    async fn update(&self, event: ProgressEvent);
}
