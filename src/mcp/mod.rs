//! Stdio tool server exposing `get_instagram_transcript` to agent hosts.

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::{McpServer, ServerInfo, ToolHandler};
pub use tools::{TranscriptTool, TRANSCRIPT_TOOL};
