use html2text::from_read;
use regex::Regex;
use std::sync::LazyLock;

// Constant patterns, compiled on first use
static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("valid url regex"));
static WHITESPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static SENTENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?]+\s+)").expect("valid sentence regex"));

/// Clean text by removing HTML tags, URLs and normalizing whitespace
pub fn clean_text(text: &str) -> String {
    let plain_text = from_read(text.as_bytes(), usize::MAX);
    let without_urls = URL_PATTERN.replace_all(&plain_text, "");
    let normalized = WHITESPACE_PATTERN.replace_all(&without_urls, " ");
    normalized.trim().to_string()
}

/// Split text into batches that respect sentence boundaries.
/// Each batch is at most `max_batch_size` bytes.
pub fn split_into_batches(text: &str, max_batch_size: usize) -> Vec<String> {
    if text.len() <= max_batch_size {
        return vec![text.to_string()];
    }

    let mut batches = Vec::new();
    let mut current_batch = String::new();
    let mut last_end = 0;

    for mat in SENTENCE_PATTERN.find_iter(text) {
        let sentence = &text[last_end..mat.end()];

        if !current_batch.is_empty() && current_batch.len() + sentence.len() > max_batch_size {
            batches.push(current_batch.trim().to_string());
            current_batch = String::new();
        }

        if sentence.len() > max_batch_size {
            batches.extend(chunk_chars(sentence, max_batch_size));
        } else {
            current_batch.push_str(sentence);
        }
        last_end = mat.end();
    }

    // Remaining text after the last sentence boundary
    if last_end < text.len() {
        let remaining = &text[last_end..];

        if !current_batch.is_empty() && current_batch.len() + remaining.len() > max_batch_size {
            batches.push(current_batch.trim().to_string());
            current_batch = String::new();
        }

        if remaining.len() > max_batch_size {
            batches.extend(chunk_chars(remaining, max_batch_size));
        } else {
            current_batch.push_str(remaining);
        }
    }

    if !current_batch.trim().is_empty() {
        batches.push(current_batch.trim().to_string());
    }

    batches.retain(|b| !b.is_empty());
    batches
}

/// Split on char boundaries so no chunk exceeds `max_bytes`
fn chunk_chars(text: &str, max_bytes: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if current.len() + ch.len_utf8() > max_bytes {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}
