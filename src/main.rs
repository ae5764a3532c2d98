use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use social_transcriptor::cli::{Cli, Commands, OutputFormat};
use social_transcriptor::config::Config;
use social_transcriptor::extractors::shortcode;
use social_transcriptor::mcp::{McpServer, TranscriptTool};
use social_transcriptor::{output, TranscriptionPipeline, TranscriptionResult};

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up ASSEMBLYAI_API_KEY from a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli);

    let config = Config::load()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let pipeline = TranscriptionPipeline::new(&config)?;
            if config.api_key().is_none() {
                tracing::warn!("ASSEMBLYAI_API_KEY is not set; tool calls must pass assemblyai_api_key");
            }

            let server = McpServer::new(TranscriptTool::new(pipeline));

            // stdout carries the protocol, so the readiness notice goes to stderr
            eprintln!("✅ Social MCP Server is now running and ready to process Instagram transcript requests");
            server.serve_stdio().await?;
            tracing::info!("Server stopped");
        }
        Commands::Transcribe {
            url,
            api_key,
            output: output_path,
            format,
        } => {
            let pipeline = TranscriptionPipeline::new(&config)?;

            tracing::info!("Starting {} transcription for URL: {}", pipeline.platform_name(), url);

            let result = match pipeline.transcribe_post(&url, api_key.as_deref()).await {
                Ok(result) => result,
                Err(e) => {
                    match format {
                        OutputFormat::Text => println!("{}", output::format_error(&e)),
                        OutputFormat::Json => println!(
                            "{}",
                            output::format_as_json(&TranscriptionResult::failure(e.to_string()))?
                        ),
                    }
                    std::process::exit(1);
                }
            };

            match output_path {
                Some(path) if result.is_success() => {
                    output::save_to_file(&url, &result, &path, &format).await?;
                    println!("Transcription saved to: {}", path.display());
                }
                _ => output::print_to_console(&url, &result, &format)?,
            }

            if !result.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Config => {
            config.display();
        }
        Commands::Platforms => {
            let pipeline = TranscriptionPipeline::new(&config)?;
            println!("Supported platforms:");
            println!(
                "  • {} posts, reels, IGTV and stories (video content only)",
                pipeline.platform_name()
            );
            println!();
            println!("Recognized URL formats:");
            for format in shortcode::supported_formats() {
                println!("  • {}", format);
            }
        }
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let default_filter = if cli.verbose {
        "social_transcriptor=debug"
    } else {
        "social_transcriptor=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr; stdout is reserved for tool responses and reports
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
