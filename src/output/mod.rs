use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::transcribe::TranscriptionResult;
use crate::TranscriptorError;

pub const SUCCESS_MARKER: &str = "✅";
pub const FAILURE_MARKER: &str = "❌";

/// Render a transcription result as a human-readable report
pub fn format_report(source_url: &str, result: &TranscriptionResult) -> String {
    match result {
        TranscriptionResult::Success {
            transcript,
            confidence,
            audio_duration_ms,
            language_detected,
        } => {
            let duration = audio_duration_ms
                .map(|ms| format!("{}ms", ms))
                .unwrap_or_else(|| "Unknown".to_string());
            let language = language_detected
                .as_deref()
                .filter(|lang| !lang.is_empty())
                .unwrap_or("Unknown");
            let confidence = confidence
                .map(|c| c.to_string())
                .unwrap_or_else(|| "Unknown".to_string());

            let mut report =
                format!("{} Successfully extracted transcript from Instagram content\n\n", SUCCESS_MARKER);
            report.push_str(&format!("🔗 Source: {}\n", source_url));
            report.push_str(&format!("🎵 Audio Duration: {}\n", duration));
            report.push_str(&format!("🌍 Language Detected: {}\n", language));
            report.push_str(&format!("📊 Confidence: {}\n\n", confidence));
            report.push_str(&format!("📄 Transcript:\n{}", transcript));
            report
        }
        TranscriptionResult::Failure { error } => {
            format!("{} Failed to transcribe content: {}", FAILURE_MARKER, single_line(error))
        }
    }
}

/// Join multi-line service messages so a failure report stays on one line
fn single_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a validation or resolution error
pub fn format_error(error: &TranscriptorError) -> String {
    if error.is_resolver_error() {
        format!("{} {}", FAILURE_MARKER, error)
    } else {
        format_unexpected(&error.to_string())
    }
}

/// Render an error that escaped every other stage
pub fn format_unexpected(message: &str) -> String {
    format!("{} Error processing Instagram content: {}", FAILURE_MARKER, message)
}

/// Serialize a result as pretty JSON
pub fn format_as_json(result: &TranscriptionResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

fn render(source_url: &str, result: &TranscriptionResult, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format_report(source_url, result)),
        OutputFormat::Json => format_as_json(result),
    }
}

/// Save transcription result to file
pub async fn save_to_file(
    source_url: &str,
    result: &TranscriptionResult,
    path: &Path,
    format: &OutputFormat,
) -> Result<()> {
    let content = render(source_url, result, format)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print transcription result to console
pub fn print_to_console(
    source_url: &str,
    result: &TranscriptionResult,
    format: &OutputFormat,
) -> Result<()> {
    let content = render(source_url, result, format)?;
    println!("{}", content);
    Ok(())
}
