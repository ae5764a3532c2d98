/// Format a millisecond offset as `MM:SS`, or `HH:MM:SS` from one hour on.
///
/// The offset is truncated to whole seconds before formatting.
pub fn format_timestamp(millis: u64) -> String {
    let total_seconds = millis / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Parse a `MM:SS` or `HH:MM:SS` timestamp back into whole seconds
pub fn parse_timestamp(timestamp: &str) -> Option<u64> {
    let parts = timestamp
        .split(':')
        .map(|part| part.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [minutes, secs] if *secs < 60 => Some(minutes * 60 + secs),
        [hours, minutes, secs] if *minutes < 60 && *secs < 60 => {
            Some(hours * 3600 + minutes * 60 + secs)
        }
        _ => None,
    }
}

/// Mask a secret for display, keeping only the last four characters
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }

    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

/// Treat empty or whitespace-only strings as missing
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
