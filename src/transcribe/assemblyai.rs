use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::processor::{api_error, TranscriptJob, TranscriptionProcessor};
use super::{Transcriber, TranscriptionRequest, TranscriptionResult};
use crate::config::AssemblyAiConfig;
use crate::utils::non_empty;
use crate::{Result, TranscriptorError};

/// AssemblyAI transcription client
pub struct AssemblyAiTranscriber {
    transcript_endpoint: Url,
    default_api_key: Option<String>,
    poll_interval: Duration,
}

impl AssemblyAiTranscriber {
    pub fn new(config: &AssemblyAiConfig) -> Result<Self> {
        let transcript_endpoint = Url::parse(&config.base_url)
            .and_then(|base| base.join("v2/transcript"))
            .map_err(|e| TranscriptorError::Unexpected(format!("Invalid AssemblyAI URL: {}", e)))?;

        let poll_interval = Duration::try_from_secs_f64(config.poll_interval_secs)
            .map_err(|e| TranscriptorError::Unexpected(format!("Invalid poll interval: {}", e)))?;

        Ok(Self {
            transcript_endpoint,
            default_api_key: non_empty(config.api_key.as_deref()).map(str::to_string),
            poll_interval,
        })
    }

    /// Transcribe a direct media URL, optionally with a per-call API key
    pub async fn transcribe_url(&self, audio_url: &str, api_key: Option<&str>) -> TranscriptionResult {
        self.transcribe(&TranscriptionRequest::new(audio_url, api_key))
            .await
    }

    /// The per-call key wins over the configured one
    fn effective_api_key<'a>(&'a self, request: &'a TranscriptionRequest) -> Option<&'a str> {
        non_empty(request.api_key.as_deref()).or(self.default_api_key.as_deref())
    }

    /// Submit the transcription job
    async fn start_transcription_job(
        &self,
        client: &Client,
        request: &TranscriptionRequest,
        api_key: &str,
    ) -> Result<TranscriptJob> {
        tracing::info!("Submitting transcription job to AssemblyAI");

        let response = client
            .post(self.transcript_endpoint.clone())
            .header("authorization", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| TranscriptorError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let job: TranscriptJob = response
            .json()
            .await
            .map_err(|e| TranscriptorError::Unexpected(format!("Failed to parse job response: {}", e)))?;

        tracing::info!("Started transcription job: {}", job.id);
        Ok(job)
    }

    fn job_url(&self, job_id: &str) -> Result<Url> {
        let mut url = self.transcript_endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| TranscriptorError::Unexpected("AssemblyAI URL cannot be a base".to_string()))?
            .push(job_id);
        Ok(url)
    }

    async fn run_job(&self, request: &TranscriptionRequest, api_key: &str) -> Result<TranscriptionResult> {
        // Each job gets its own HTTP session
        let client = Client::builder()
            .build()
            .map_err(|e| TranscriptorError::Unexpected(e.to_string()))?;
        let job = self.start_transcription_job(&client, request, api_key).await?;

        TranscriptionProcessor::new(
            client,
            self.job_url(&job.id)?,
            api_key.to_string(),
            self.poll_interval,
        )
        .wait_for_completion(job)
        .await
    }
}

#[async_trait]
impl Transcriber for AssemblyAiTranscriber {
    async fn transcribe(&self, request: &TranscriptionRequest) -> TranscriptionResult {
        let Some(api_key) = self.effective_api_key(request) else {
            tracing::warn!("No AssemblyAI API key available");
            return TranscriptionResult::failure(TranscriptorError::Configuration.to_string());
        };

        match self.run_job(request, api_key).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Transcription failed: {}", e);
                TranscriptionResult::failure(e.to_string())
            }
        }
    }
}
