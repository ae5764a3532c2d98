use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "social-transcriptor",
    about = "Social Transcriptor - Extract transcripts from Instagram reels and videos using AssemblyAI",
    version,
    long_about = "Serves the get_instagram_transcript tool over stdio for agent hosts, or transcribes a single Instagram post from the command line. Uses AssemblyAI for speaker-labelled speech-to-text."
)]
pub struct Cli {
    /// Defaults to `serve` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Serve the transcript tool over stdin/stdout
    Serve,

    /// Transcribe a single Instagram post or reel
    Transcribe {
        /// Instagram post, reel, tv or story URL
        #[arg(value_name = "URL")]
        url: String,

        /// AssemblyAI API key
        #[arg(long, env = "ASSEMBLYAI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the effective configuration
    Config,

    /// List supported URL formats
    Platforms,
}

#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum OutputFormat {
    /// Human-readable report
    Text,
    /// JSON transcription result
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
