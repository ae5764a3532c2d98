use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::extractors::{InstagramResolver, MediaResolver, PostReference};
use crate::output;
use crate::utils::format_timestamp;
use crate::Result;

pub mod assemblyai;
pub mod processor;

pub use assemblyai::AssemblyAiTranscriber;

/// Features requested from the transcription service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionOptions {
    pub auto_highlights: bool,
    pub speaker_labels: bool,
    pub language_detection: bool,
}

impl Default for TranscriptionOptions {
    fn default() -> Self {
        Self {
            auto_highlights: true,
            speaker_labels: true,
            language_detection: true,
        }
    }
}

/// A single transcription job submission
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionRequest {
    pub audio_url: String,

    /// Per-call credential; falls back to the configured key when absent
    #[serde(skip)]
    pub api_key: Option<String>,

    #[serde(flatten)]
    pub options: TranscriptionOptions,
}

impl TranscriptionRequest {
    pub fn new(audio_url: impl Into<String>, api_key: Option<&str>) -> Self {
        Self {
            audio_url: audio_url.into(),
            api_key: api_key.map(str::to_string),
            options: TranscriptionOptions::default(),
        }
    }
}

/// One detected speech turn, in service order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// Start offset in milliseconds
    pub start_ms: u64,

    /// End offset in milliseconds
    pub end_ms: u64,

    /// Speaker ID assigned by diarization
    pub speaker: Option<String>,

    pub text: String,
}

impl Utterance {
    /// Render as `[start - end] Speaker X: text`
    pub fn format_line(&self) -> String {
        let speaker = match self.speaker.as_deref() {
            Some(id) if !id.is_empty() => format!("Speaker {}", id),
            _ => "Speaker".to_string(),
        };

        format!(
            "[{} - {}] {}: {}",
            format_timestamp(self.start_ms),
            format_timestamp(self.end_ms),
            speaker,
            self.text
        )
    }
}

/// Join utterances into transcript lines, or fall back to the plain text when there are none
pub fn format_utterances(utterances: &[Utterance], fallback_text: &str) -> String {
    if utterances.is_empty() {
        return fallback_text.to_string();
    }

    utterances
        .iter()
        .map(Utterance::format_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Outcome of a transcription attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranscriptionResult {
    Success {
        /// Formatted transcript text
        transcript: String,

        /// Overall confidence score (0.0 to 1.0)
        confidence: Option<f64>,

        /// Audio duration in milliseconds
        audio_duration_ms: Option<u64>,

        /// Language code detected by the service
        language_detected: Option<String>,
    },
    Failure {
        error: String,
    },
}

impl TranscriptionResult {
    pub fn failure(error: impl Into<String>) -> Self {
        TranscriptionResult::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TranscriptionResult::Success { .. })
    }
}

/// Speech-to-text backend
///
/// Implementations never return errors: every problem is reported as
/// [`TranscriptionResult::Failure`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Submit the request and wait until the job reaches a terminal state
    async fn transcribe(&self, request: &TranscriptionRequest) -> TranscriptionResult;
}

/// Main transcription pipeline: validate, resolve, transcribe, format
pub struct TranscriptionPipeline {
    resolver: Box<dyn MediaResolver>,
    transcriber: Box<dyn Transcriber>,
}

impl TranscriptionPipeline {
    /// Create a pipeline backed by Instagram and AssemblyAI
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_components(
            Box::new(InstagramResolver::new(&config.instagram)?),
            Box::new(AssemblyAiTranscriber::new(&config.assemblyai)?),
        ))
    }

    pub fn with_components(
        resolver: Box<dyn MediaResolver>,
        transcriber: Box<dyn Transcriber>,
    ) -> Self {
        Self {
            resolver,
            transcriber,
        }
    }

    pub fn platform_name(&self) -> &'static str {
        self.resolver.platform_name()
    }

    /// Transcribe a post URL
    ///
    /// Validation and resolution problems are returned as errors; transcription problems are
    /// reported inside the returned [`TranscriptionResult`].
    pub async fn transcribe_post(
        &self,
        url: &str,
        api_key: Option<&str>,
    ) -> Result<TranscriptionResult> {
        let post = PostReference::parse(url)?;
        tracing::info!("Starting transcription for {} {}", post.kind(), post.shortcode());

        let media = self.resolver.resolve(&post).await?;
        tracing::debug!("Resolved direct media URL for {}", post.shortcode());

        let request = TranscriptionRequest::new(media.direct_url, api_key);
        let result = self.transcriber.transcribe(&request).await;

        match &result {
            TranscriptionResult::Success { .. } => {
                tracing::info!("Transcription completed for {}", post.shortcode())
            }
            TranscriptionResult::Failure { error } => {
                tracing::warn!("Transcription failed for {}: {}", post.shortcode(), error)
            }
        }

        Ok(result)
    }

    /// Run the full pipeline and render the report; never fails
    pub async fn run(&self, url: &str, api_key: Option<&str>) -> String {
        match self.transcribe_post(url, api_key).await {
            Ok(result) => output::format_report(url, &result),
            Err(e) => {
                tracing::warn!("Could not process {}: {}", url, e);
                output::format_error(&e)
            }
        }
    }
}
