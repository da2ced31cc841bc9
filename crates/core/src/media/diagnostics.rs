//! Turning extractor stderr into a single line fit for end users.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::VecDeque;

/// Marker yt-dlp puts in front of fatal errors.
pub const ERROR_MARKER: &str = "ERROR:";

pub const ACCESS_RESTRICTED_MESSAGE: &str =
    "This video is private or requires sign-in. Try private mode with a logged-in browser.";
pub const METADATA_FAILED_MESSAGE: &str = "Could not fetch video information.";
pub const DOWNLOAD_FAILED_MESSAGE: &str = "Download failed. Try a different quality.";

const RESTRICTED_HINTS: &[&str] = &[
    "sign in",
    "sign-in",
    "login",
    "log in",
    "private",
    "members-only",
    "members only",
];

// "[youtube] dQw4w9WgXcQ: " style prefix
static EXTRACTOR_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[^\]]+\]\s*(?:[^\s:]+:\s+)?").unwrap());

/// Picks the most useful single line from extractor stderr.
///
/// The first line carrying [`ERROR_MARKER`] wins, with the marker and any
/// extractor/video-id prefix removed. Without one, stderr mentioning sign-in
/// or private content maps to [`ACCESS_RESTRICTED_MESSAGE`], and anything
/// else to `fallback`.
pub fn summarize_stderr(stderr: &str, fallback: &str) -> String {
    let marked = stderr
        .lines()
        .filter_map(|line| line.split_once(ERROR_MARKER).map(|(_, rest)| rest.trim()))
        .map(|rest| EXTRACTOR_PREFIX.replace(rest, "").trim().to_string())
        .find(|message| !message.is_empty());

    if let Some(message) = marked {
        return message;
    }

    let lower = stderr.to_ascii_lowercase();
    if RESTRICTED_HINTS.iter().any(|hint| lower.contains(hint)) {
        return ACCESS_RESTRICTED_MESSAGE.to_string();
    }

    fallback.to_string()
}

/// Bounded buffer of the most recent stderr lines of a streaming run.
#[derive(Debug)]
pub struct StderrTail {
    lines: VecDeque<String>,
    capacity: usize,
}

impl StderrTail {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    pub fn push(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn into_string(self) -> String {
        Vec::from(self.lines).join("\n")
    }
}

/// Last `max_chars` characters of `text`, for log lines.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let start = text
        .char_indices()
        .nth(count - max_chars)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &text[start..]
}
