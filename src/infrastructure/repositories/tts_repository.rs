use crate::domain::tts::VoiceHint;
use async_trait::async_trait;

/// Error raised by a provider while synthesizing one text
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SynthesisError {
    pub message: String,
}

impl SynthesisError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Repository for TTS synthesis operations.
/// Abstracts the underlying TTS backend (local engine or a remote API).
///
/// Implementations are responsible for:
/// - Handling provider-specific text length limitations
/// - Mapping the abstract voice hint to their own voice identifiers
/// - Returning audio in the canonical artifact encoding (see `domain::tts::audio_format`)
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Short provider name used in logs, reports and errors
    fn name(&self) -> &'static str;

    /// Synthesize cleaned text and return canonical WAV bytes
    async fn synthesize(&self, text: &str, voice: VoiceHint) -> Result<Vec<u8>, SynthesisError>;
}
