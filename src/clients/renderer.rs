//! Render backend client: submits a generation job, polls it to completion
//! and downloads the finished artifact to local disk.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::RendererConfig;
use crate::domain::{ProgressEvent, ProgressSink};
use crate::models::GenerationSettings;

/// Errors from the rendering collaborator. Messages are safe to surface to
/// the end user verbatim.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Render backend error: {0}")]
    Backend(String),

    #[error("Render backend unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Artifact write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Render job did not finish within {0} seconds")]
    TimedOut(u64),
}

/// Rendering collaborator seam. Each call resolves to a local artifact path
/// or fails with a user-presentable error; polling and retry live inside the
/// implementation.
#[async_trait]
pub trait RenderClient: Send + Sync {
    async fn generate_from_text(
        &self,
        settings: &GenerationSettings,
        progress: &dyn ProgressSink,
    ) -> Result<PathBuf, RenderError>;

    async fn generate_from_image(
        &self,
        settings: &GenerationSettings,
        image: &[u8],
        progress: &dyn ProgressSink,
    ) -> Result<PathBuf, RenderError>;
}

#[derive(Debug, Deserialize)]
struct JobCreated {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum JobState {
    Queued,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    status: JobState,
    status_text: Option<String>,
    video_url: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpRenderClient {
    client: Client,
    config: RendererConfig,
}

impl HttpRenderClient {
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .unwrap_or_default(),
            config,
        }
    }

    fn job_payload(settings: &GenerationSettings, mode: &str) -> serde_json::Value {
        serde_json::json!({
            "mode": mode,
            "prompt": settings.prompt,
            "aspectRatio": settings.aspect_ratio,
            "quality": settings.quality,
            "seed": settings.seed,
            "videoModelKey": settings.video_model_key,
            "muteAudio": settings.mute_audio,
        })
    }

    async fn submit_text_job(&self, settings: &GenerationSettings) -> Result<String, RenderError> {
        let url = format!("{}/v1/jobs", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&Self::job_payload(settings, "t2v"))
            .send()
            .await?;

        Self::created_from(response).await
    }

    async fn submit_image_job(
        &self,
        settings: &GenerationSettings,
        image: &[u8],
    ) -> Result<String, RenderError> {
        let url = format!("{}/v1/jobs", self.config.base_url);
        let form = reqwest::multipart::Form::new()
            .text("payload", Self::job_payload(settings, "i2v").to_string())
            .part(
                "image",
                reqwest::multipart::Part::bytes(image.to_vec()).file_name("source.jpg"),
            );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        Self::created_from(response).await
    }

    async fn created_from(response: reqwest::Response) -> Result<String, RenderError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::Backend(format!(
                "job submission rejected: {status} - {body}"
            )));
        }

        let created: JobCreated = response.json().await?;
        Ok(created.id)
    }

    /// Polls the job until it completes or fails, forwarding backend status
    /// text as rendering progress.
    async fn await_job(
        &self,
        job_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<String, RenderError> {
        let interval = Duration::from_secs(self.config.poll_interval_secs.max(1));
        let deadline = tokio::time::Instant::now()
            + Duration::from_secs(self.config.max_render_secs);
        let url = format!("{}/v1/jobs/{}", self.config.base_url, job_id);

        loop {
            if tokio::time::Instant::now() >= deadline {
                return Err(RenderError::TimedOut(self.config.max_render_secs));
            }

            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.config.api_key)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(RenderError::Backend(format!(
                    "job status check failed: {status} - {body}"
                )));
            }

            let job: JobStatus = response.json().await?;
            match job.status {
                JobState::Completed => {
                    let video_url = job.video_url.ok_or_else(|| {
                        RenderError::Backend("completed job carries no artifact url".to_string())
                    })?;
                    return Ok(video_url);
                }
                JobState::Failed => {
                    return Err(RenderError::Backend(
                        job.error.unwrap_or_else(|| "rendering failed".to_string()),
                    ));
                }
                JobState::Queued | JobState::Processing => {
                    if let Some(status_text) = job.status_text {
                        progress
                            .update(ProgressEvent::Rendering {
                                status: status_text,
                            })
                            .await;
                    }
                }
            }

            tokio::time::sleep(interval).await;
        }
    }

    async fn download_artifact(&self, video_url: &str) -> Result<PathBuf, RenderError> {
        let response = self.client.get(video_url).send().await?;
        if !response.status().is_success() {
            return Err(RenderError::Backend(format!(
                "artifact download failed: {}",
                response.status()
            )));
        }
        let bytes = response.bytes().await?;

        let dir = PathBuf::from(&self.config.download_dir);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{}.mp4", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, &bytes).await?;

        debug!(path = %path.display(), size = bytes.len(), "artifact downloaded");
        Ok(path)
    }

    async fn run_job(
        &self,
        job_id: String,
        progress: &dyn ProgressSink,
    ) -> Result<PathBuf, RenderError> {
        progress
            .update(ProgressEvent::Rendering {
                status: "Render job queued...".to_string(),
            })
            .await;

        let video_url = self.await_job(&job_id, progress).await?;
        self.download_artifact(&video_url).await
    }
}

#[async_trait]
impl RenderClient for HttpRenderClient {
    async fn generate_from_text(
        &self,
        settings: &GenerationSettings,
        progress: &dyn ProgressSink,
    ) -> Result<PathBuf, RenderError> {
        let job_id = self.submit_text_job(settings).await?;
        self.run_job(job_id, progress).await
    }

    async fn generate_from_image(
        &self,
        settings: &GenerationSettings,
        image: &[u8],
        progress: &dyn ProgressSink,
    ) -> Result<PathBuf, RenderError> {
        let job_id = self.submit_image_job(settings, image).await?;
        self.run_job(job_id, progress).await
    }
}
