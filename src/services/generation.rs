//! Generation orchestrator: drives one render from finalized settings to a
//! delivered video, settling the credit and resetting the chat afterwards.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::bot::ui;
use crate::clients::renderer::RenderClient;
use crate::clients::telegram::ChatTransport;
use crate::constants::limits;
use crate::domain::{GenerationOutcome, ProgressEvent, ProgressSink};
use crate::models::{GenerationMode, GenerationSettings};
use crate::services::entitlement_service::EntitlementService;
use crate::services::session::SessionStore;

/// Progress sink that edits a single status message in the chat. Edits are
/// best effort; a failed edit never aborts the run.
struct StatusMessage {
    transport: Arc<dyn ChatTransport>,
    chat_id: i64,
    message_id: Option<i64>,
}

impl StatusMessage {
    async fn create(transport: Arc<dyn ChatTransport>, chat_id: i64, text: &str) -> Self {
        let message_id = match transport.send_message(chat_id, text).await {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(chat_id, error = %err, "could not create status message");
                None
            }
        };
        Self {
            transport,
            chat_id,
            message_id,
        }
    }

    async fn set_text(&self, text: &str) {
        let Some(message_id) = self.message_id else {
            return;
        };
        if let Err(err) = self
            .transport
            .edit_message(self.chat_id, message_id, text)
            .await
        {
            debug!(chat_id = self.chat_id, error = %err, "status edit failed");
        }
    }

    /// Removes the status message once the run has a terminal result.
    async fn discard(&self) {
        let Some(message_id) = self.message_id else {
            return;
        };
        if let Err(err) = self.transport.delete_message(self.chat_id, message_id).await {
            debug!(chat_id = self.chat_id, error = %err, "status delete failed");
        }
    }
}

#[async_trait::async_trait]
impl ProgressSink for StatusMessage {
    async fn update(&self, event: ProgressEvent) {
        self.set_text(&event.to_string()).await;
    }
}

/// One finalized request, ready to run.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub chat_id: i64,
    pub user_id: String,
    pub mode: GenerationMode,
    pub settings: GenerationSettings,
    /// Source photo reference; present iff `mode` is image-to-video.
    pub photo_file_id: Option<String>,
}

pub struct GenerationService {
    transport: Arc<dyn ChatTransport>,
    renderer: Arc<dyn RenderClient>,
    entitlements: Arc<dyn EntitlementService>,
    sessions: Arc<dyn SessionStore>,
}

impl GenerationService {
    #[must_use]
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        renderer: Arc<dyn RenderClient>,
        entitlements: Arc<dyn EntitlementService>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            transport,
            renderer,
            entitlements,
            sessions,
        }
    }

    /// Runs one generation end to end. Whatever the outcome, the chat session
    /// is cleared, the local artifact is removed and the mode menu is shown
    /// again so the user can go straight into the next request.
    pub async fn run(&self, request: GenerationRequest) -> GenerationOutcome {
        info!(
            chat_id = request.chat_id,
            user_id = %request.user_id,
            mode = %request.mode,
            "generation started"
        );

        let status = StatusMessage::create(
            Arc::clone(&self.transport),
            request.chat_id,
            "Starting generation...",
        )
        .await;

        let outcome = self.execute(&request, &status).await;

        match &outcome {
            GenerationOutcome::Delivered => {
                status.discard().await;
            }
            GenerationOutcome::Oversized { size_mb } => {
                status
                    .set_text(&format!(
                        "The video is ready, but at {size_mb} MB it exceeds the {} MB \
                         delivery limit. Try a lower quality.",
                        limits::MAX_VIDEO_MB
                    ))
                    .await;
            }
            GenerationOutcome::Failed { message } => {
                status
                    .set_text(&ui::truncate_chars(
                        &format!("Generation failed: {message}"),
                        limits::MESSAGE_CHARS,
                    ))
                    .await;
            }
        }

        self.sessions.remove(request.chat_id).await;
        if let Err(err) = self
            .transport
            .send_message_with_keyboard(request.chat_id, ui::CHOOSE_MODE, &ui::mode_keyboard())
            .await
        {
            warn!(chat_id = request.chat_id, error = %err, "could not re-show mode menu");
        }

        info!(chat_id = request.chat_id, outcome = ?outcome, "generation finished");
        outcome
    }

    async fn execute(
        &self,
        request: &GenerationRequest,
        progress: &StatusMessage,
    ) -> GenerationOutcome {
        let artifact = match self.render(request, progress).await {
            Ok(path) => path,
            Err(message) => return GenerationOutcome::Failed { message },
        };

        let outcome = self.deliver(request, progress, &artifact).await;

        if let Err(err) = tokio::fs::remove_file(&artifact).await {
            warn!(path = %artifact.display(), error = %err, "artifact cleanup failed");
        }

        outcome
    }

    async fn render(
        &self,
        request: &GenerationRequest,
        progress: &StatusMessage,
    ) -> Result<PathBuf, String> {
        match &request.photo_file_id {
            Some(file_id) => {
                progress.update(ProgressEvent::DownloadingImage).await;
                let image = self
                    .transport
                    .download_file(file_id)
                    .await
                    .map_err(|err| err.to_string())?;
                self.renderer
                    .generate_from_image(&request.settings, &image, progress)
                    .await
                    .map_err(|err| err.to_string())
            }
            None => self
                .renderer
                .generate_from_text(&request.settings, progress)
                .await
                .map_err(|err| err.to_string()),
        }
    }

    async fn deliver(
        &self,
        request: &GenerationRequest,
        progress: &StatusMessage,
        artifact: &Path,
    ) -> GenerationOutcome {
        let size_bytes = match tokio::fs::metadata(artifact).await {
            Ok(meta) => meta.len(),
            Err(err) => {
                return GenerationOutcome::Failed {
                    message: format!("finished artifact is unreadable: {err}"),
                };
            }
        };

        // Compare in bytes: a single byte over the ceiling already breaks
        // the delivery, so no rounding before the check.
        if size_bytes > limits::MAX_VIDEO_MB * 1024 * 1024 {
            // No debit: the user never received anything.
            return GenerationOutcome::Oversized {
                size_mb: size_bytes.div_ceil(1024 * 1024),
            };
        }

        progress.update(ProgressEvent::Uploading).await;

        // Settle exactly one credit per finished render. The oversize branch
        // above never reaches this point.
        if let Err(err) = self.entitlements.debit(&request.user_id).await {
            error!(user_id = %request.user_id, error = %err, "credit debit failed");
        }

        let caption = ui::delivery_caption(
            request.mode,
            &request.settings.quality,
            &request.settings.prompt,
        );
        if let Err(err) = self
            .transport
            .send_video(request.chat_id, artifact, &caption)
            .await
        {
            return GenerationOutcome::Failed {
                message: err.to_string(),
            };
        }

        GenerationOutcome::Delivered
    }
}
