//! Markdown-to-speakable-text reduction.
//!
//! The analysis result is markdown meant for the eye; narration wants
//! plain prose. Structural markers are stripped, link syntax is reduced
//! to the link text, and list markers become a short spoken pause cue.

use once_cell::sync::Lazy;
use regex::Regex;

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+").unwrap());
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*{1,2}([^*]+)\*{1,2}").unwrap());
static UNDERSCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{1,2}([^_]+)_{1,2}").unwrap());
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap());
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[-*+]\s+").unwrap());
static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\d+\.\s+").unwrap());
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Spoken pause cue substituted for list markers.
const PAUSE_CUE: &str = ", ";

/// Derive narration text from a markdown explanation.
pub fn speakable_text(markdown: &str) -> String {
    let text = HEADING.replace_all(markdown, "");
    let text = EMPHASIS.replace_all(&text, "$1");
    let text = UNDERSCORE.replace_all(&text, "$1");
    // Fenced blocks are dropped whole before inline code is unwrapped so
    // the fence pattern never sees half-stripped backticks.
    let text = CODE_FENCE.replace_all(&text, "");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = BULLET.replace_all(&text, PAUSE_CUE);
    let text = NUMBERED.replace_all(&text, PAUSE_CUE);
    let text = BLANK_RUN.replace_all(&text, "\n\n");
    text.trim().to_string()
}
