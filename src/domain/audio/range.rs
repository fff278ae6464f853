//! `Range: bytes=...` handling for the audio endpoint.
//!
//! Only single ranges are supported. Out-of-bounds positions are rejected
//! rather than clamped, so the client always learns the real total size.

use super::error::AudioServiceError;

/// Inclusive byte range `[start, end]` within an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Parse a `Range` header value against an artifact of `total_size` bytes.
    ///
    /// Accepts `bytes=start-end`, `bytes=start-` and the suffix form `bytes=-n`.
    pub fn parse(header: &str, total_size: u64) -> Result<Self, AudioServiceError> {
        let invalid = || AudioServiceError::InvalidRange { total_size };

        let spec = header
            .trim()
            .strip_prefix("bytes=")
            .ok_or_else(invalid)?
            .trim();
        if spec.contains(',') {
            return Err(invalid());
        }
        let (start_raw, end_raw) = spec.split_once('-').ok_or_else(invalid)?;
        let (start_raw, end_raw) = (start_raw.trim(), end_raw.trim());

        let (start, end) = if start_raw.is_empty() {
            // Suffix form: last `n` bytes
            let suffix: u64 = parse_position(end_raw).ok_or_else(invalid)?;
            if suffix == 0 || total_size == 0 {
                return Err(invalid());
            }
            (total_size.saturating_sub(suffix), total_size - 1)
        } else {
            let start = parse_position(start_raw).ok_or_else(invalid)?;
            let end = if end_raw.is_empty() {
                total_size.checked_sub(1).ok_or_else(invalid)?
            } else {
                parse_position(end_raw).ok_or_else(invalid)?
            };
            (start, end)
        };

        if start >= total_size || end >= total_size || start > end {
            return Err(invalid());
        }

        Ok(Self { start, end })
    }

    /// Number of bytes in the range; never zero
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value of the `Content-Range` header for a partial response
    pub fn content_range(&self, total_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total_size)
    }
}

fn parse_position(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
