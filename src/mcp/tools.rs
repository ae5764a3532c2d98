use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::protocol::{CallToolResult, RpcError, ToolDefinition};
use super::server::ToolHandler;
use crate::output;
use crate::transcribe::TranscriptionPipeline;

pub const TRANSCRIPT_TOOL: &str = "get_instagram_transcript";

/// Arguments of `get_instagram_transcript`
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptArgs {
    pub url: String,
    #[serde(default)]
    pub assemblyai_api_key: Option<String>,
}

/// Exposes the transcription pipeline as a tool
pub struct TranscriptTool {
    pipeline: Arc<TranscriptionPipeline>,
}

impl TranscriptTool {
    pub fn new(pipeline: TranscriptionPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    fn definition() -> ToolDefinition {
        ToolDefinition {
            name: TRANSCRIPT_TOOL.to_string(),
            description: "Extract transcript from Instagram video/reel using AssemblyAI. \
                          Returns the transcript text with timestamps and speaker labels."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Instagram post or reel URL (e.g., https://instagram.com/p/ABC123/ or https://instagram.com/reel/XYZ789/)"
                    },
                    "assemblyai_api_key": {
                        "type": "string",
                        "description": "AssemblyAI API key (optional if ASSEMBLYAI_API_KEY environment variable is set)"
                    }
                },
                "required": ["url"]
            }),
        }
    }

    /// Run the pipeline; a panic anywhere inside still yields a report
    async fn get_instagram_transcript(&self, args: TranscriptArgs) -> String {
        let pipeline = Arc::clone(&self.pipeline);
        let handle = tokio::spawn(async move {
            pipeline
                .run(&args.url, args.assemblyai_api_key.as_deref())
                .await
        });

        match handle.await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Transcript pipeline aborted: {}", e);
                output::format_unexpected(&e.to_string())
            }
        }
    }
}

#[async_trait]
impl ToolHandler for TranscriptTool {
    fn tools(&self) -> Vec<ToolDefinition> {
        vec![Self::definition()]
    }

    async fn call(&self, name: &str, arguments: Value) -> Result<CallToolResult, RpcError> {
        if name != TRANSCRIPT_TOOL {
            return Err(RpcError::invalid_params(format!("Unknown tool: {}", name)));
        }

        let args: TranscriptArgs = serde_json::from_value(arguments)
            .map_err(|e| RpcError::invalid_params(format!("Invalid arguments for {}: {}", name, e)))?;

        tracing::info!("Tool call {} for {}", name, args.url);
        Ok(CallToolResult::text(self.get_instagram_transcript(args).await))
    }
}
