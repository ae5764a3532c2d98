use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use url::Url;

use super::{format_utterances, TranscriptionResult, Utterance};
use crate::{Result, TranscriptorError};

/// AssemblyAI job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
    #[serde(other)]
    Unknown,
}

/// AssemblyAI transcript record, as returned by submit and status calls
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptJob {
    pub id: String,
    pub status: JobStatus,
    pub text: Option<String>,
    pub utterances: Option<Vec<ApiUtterance>>,
    pub confidence: Option<f64>,
    /// Duration in seconds
    pub audio_duration: Option<f64>,
    pub language_code: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUtterance {
    start: u64,
    end: u64,
    speaker: Option<String>,
    text: String,
}

impl From<ApiUtterance> for Utterance {
    fn from(utterance: ApiUtterance) -> Self {
        Utterance {
            start_ms: utterance.start,
            end_ms: utterance.end,
            speaker: utterance.speaker,
            text: utterance.text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// Turn a non-success response into a service error, preferring the API's own message
pub(crate) async fn api_error(response: Response) -> TranscriptorError {
    let status = response.status();
    let detail = match response.json::<ApiErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("AssemblyAI request failed: HTTP {}", status),
    };
    TranscriptorError::TranscriptionService(detail)
}

/// Transcription job processor
pub struct TranscriptionProcessor {
    client: Client,
    job_url: Url,
    api_key: String,
    poll_interval: Duration,
}

impl TranscriptionProcessor {
    pub fn new(client: Client, job_url: Url, api_key: String, poll_interval: Duration) -> Self {
        Self {
            client,
            job_url,
            api_key,
            poll_interval,
        }
    }

    /// Wait for the job to reach a terminal state
    pub async fn wait_for_completion(&self, mut job: TranscriptJob) -> Result<TranscriptionResult> {
        let start_time = Instant::now();
        let mut check_count = 0u32;

        loop {
            match job.status {
                JobStatus::Queued | JobStatus::Processing => {
                    tracing::debug!(
                        "Job {} {:?} ({}s elapsed, check #{})",
                        job.id,
                        job.status,
                        start_time.elapsed().as_secs(),
                        check_count
                    );
                    sleep(self.poll_interval).await;
                    check_count += 1;
                    job = self.get_transcription_job().await?;
                }
                JobStatus::Completed => {
                    tracing::info!(
                        "Transcription job {} completed in {:.1}s",
                        job.id,
                        start_time.elapsed().as_secs_f64()
                    );
                    return Ok(process_transcription_result(job));
                }
                JobStatus::Error => {
                    let reason = job
                        .error
                        .unwrap_or_else(|| "Transcription failed".to_string());
                    return Err(TranscriptorError::TranscriptionService(reason));
                }
                JobStatus::Unknown => {
                    return Err(TranscriptorError::Unexpected(
                        "Unexpected transcription job status".to_string(),
                    ));
                }
            }
        }
    }

    /// Get transcription job details
    async fn get_transcription_job(&self) -> Result<TranscriptJob> {
        let response = self
            .client
            .get(self.job_url.clone())
            .header("authorization", &self.api_key)
            .send()
            .await
            .map_err(|e| TranscriptorError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| TranscriptorError::Unexpected(format!("Failed to parse transcript: {}", e)))
    }
}

/// Process a completed job into a result
pub fn process_transcription_result(job: TranscriptJob) -> TranscriptionResult {
    let utterances: Vec<Utterance> = job
        .utterances
        .unwrap_or_default()
        .into_iter()
        .map(Utterance::from)
        .collect();

    let transcript = format_utterances(&utterances, job.text.as_deref().unwrap_or_default());

    TranscriptionResult::Success {
        transcript,
        confidence: job.confidence,
        audio_duration_ms: job
            .audio_duration
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(|secs| (secs * 1000.0).round() as u64),
        language_detected: job.language_code,
    }
}
