//! Locates triple-backtick fenced regions in generated markdown.

use regex::Regex;
use std::sync::LazyLock;

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(\w+)?\s*(.*?)```").expect("Invalid fenced block regex")
});

/// A fenced region of the source text. Offsets are byte positions of the
/// opening and one-past-closing fence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock {
    pub lang: String,
    pub body: String,
    pub start: usize,
    pub end: usize,
}

/// All fenced blocks in order of appearance. Each match closes at the nearest
/// following fence; an unterminated fence yields nothing.
pub fn extract_fenced_blocks(text: &str) -> Vec<FencedBlock> {
    FENCE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(FencedBlock {
                lang: caps
                    .get(1)
                    .map(|m| m.as_str().trim().to_lowercase())
                    .unwrap_or_default(),
                body: caps
                    .get(2)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default(),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

pub fn first_fenced_block(text: &str) -> Option<FencedBlock> {
    extract_fenced_blocks(text).into_iter().next()
}

/// Removes every fenced region, leaving surrounding prose untouched.
pub fn strip_fenced_blocks(text: &str) -> String {
    FENCE.replace_all(text, "").into_owned()
}
