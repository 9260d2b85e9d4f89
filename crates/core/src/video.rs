use std::sync::LazyLock;

use regex::Regex;

use crate::error::ApiError;

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#,
    )
    .expect("valid regex")
});

/// Pull the 11-character video id out of a YouTube link.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Check a pasted link before anything is sent to the service. Returns the video id.
pub fn validate_video_url(url: &str) -> Result<String, ApiError> {
    let trimmed = url.trim();
    let invalid = |reason: &str| ApiError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("Please enter a YouTube URL."));
    }
    if !trimmed.contains("youtube.com") && !trimmed.contains("youtu.be") {
        return Err(invalid("Please enter a valid YouTube URL."));
    }
    extract_video_id(trimmed)
        .ok_or_else(|| invalid("Invalid YouTube URL: Could not extract video ID."))
}
