//! Social Transcriptor - transcribe Instagram reels and video posts with AssemblyAI
//!
//! This library resolves the direct video URL behind an Instagram post, submits it to the
//! AssemblyAI transcription service and renders the result as a readable report. The same
//! pipeline is exposed as a stdio tool server and as a one-shot CLI command.

pub mod cli;
pub mod config;
pub mod extractors;
pub mod mcp;
pub mod output;
pub mod transcribe;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::{MediaResolver, MediaResource, PostReference};
pub use transcribe::{Transcriber, TranscriptionPipeline, TranscriptionResult};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, TranscriptorError>;

/// Error types specific to the transcriptor
#[derive(thiserror::Error, Debug)]
pub enum TranscriptorError {
    #[error("Invalid Instagram URL format: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch Instagram post: {0}")]
    PostFetchFailed(String),

    #[error("Instagram post does not contain video content. Only video content can be transcribed.")]
    NotVideoContent,

    #[error("Could not extract video URL from Instagram post.")]
    NoMediaUrl,

    #[error("Error extracting Instagram media URL: {0}")]
    ResolverInternal(String),

    #[error("AssemblyAI API key not found. Please set ASSEMBLYAI_API_KEY environment variable or provide api_key parameter.")]
    Configuration,

    #[error("{0}")]
    TranscriptionService(String),

    #[error("{0}")]
    Unexpected(String),
}

impl TranscriptorError {
    /// Whether the error was raised while resolving the post's media.
    pub fn is_resolver_error(&self) -> bool {
        matches!(
            self,
            TranscriptorError::PostFetchFailed(_)
                | TranscriptorError::NotVideoContent
                | TranscriptorError::NoMediaUrl
                | TranscriptorError::ResolverInternal(_)
        )
    }
}
