use std::sync::Arc;

use crate::domain::audio::{AudioServiceError, ProviderAttempt};
use crate::infrastructure::repositories::TtsRepository;

/// Construction seam for one TTS backend.
///
/// `build` must not touch the network; it only checks that the backend's
/// dependencies and configuration are present.
pub trait ProviderBuilder: Send + Sync {
    fn name(&self) -> &'static str;

    fn build(&self) -> Result<Arc<dyn TtsRepository>, String>;
}

/// Picks a TTS backend for one synthesis request: the local engine first,
/// the remote API when the local engine cannot be constructed.
///
/// Nothing is cached between calls, so a backend that appears or disappears
/// while the process runs is picked up on the next request.
pub struct ProviderSelector {
    primary: Arc<dyn ProviderBuilder>,
    fallback: Arc<dyn ProviderBuilder>,
}

impl ProviderSelector {
    pub fn new(primary: Arc<dyn ProviderBuilder>, fallback: Arc<dyn ProviderBuilder>) -> Self {
        Self { primary, fallback }
    }

    pub fn select_provider(&self) -> Result<Arc<dyn TtsRepository>, AudioServiceError> {
        let mut attempts = Vec::with_capacity(2);

        for builder in [&self.primary, &self.fallback] {
            match builder.build() {
                Ok(provider) => {
                    tracing::info!(
                        provider = %provider.name(),
                        skipped = attempts.len(),
                        "Selected TTS provider"
                    );
                    return Ok(provider);
                }
                Err(reason) => {
                    tracing::warn!(
                        provider = %builder.name(),
                        reason = %reason,
                        "TTS provider unavailable"
                    );
                    attempts.push(ProviderAttempt {
                        provider: builder.name().to_string(),
                        reason,
                    });
                }
            }
        }

        Err(AudioServiceError::NoProviderAvailable { attempts })
    }
}
