use crate::error::AppError;

/// One failed construction attempt during provider selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAttempt {
    pub provider: String,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AudioServiceError {
    #[error("no TTS provider available: {}", describe_attempts(.attempts))]
    NoProviderAvailable { attempts: Vec<ProviderAttempt> },
    #[error("synthesis failed in provider {provider}: {message}")]
    SynthesisFailed { provider: String, message: String },
    #[error("audio not found")]
    ArtifactNotFound,
    #[error("requested range not satisfiable for {total_size} bytes")]
    InvalidRange { total_size: u64 },
    #[error("invalid item id")]
    InvalidItemId,
    #[error("artifact {item_id} already stored with different content")]
    ArtifactConflict { item_id: String },
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn describe_attempts(attempts: &[ProviderAttempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{} ({})", a.provider, a.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

impl AudioServiceError {
    /// Stable machine-readable kind, used in per-item batch reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoProviderAvailable { .. } => "no_provider_available",
            Self::SynthesisFailed { .. } => "synthesis_failed",
            Self::ArtifactNotFound => "artifact_not_found",
            Self::InvalidRange { .. } => "invalid_range",
            Self::InvalidItemId => "invalid_item_id",
            Self::ArtifactConflict { .. } => "artifact_conflict",
            Self::Invalid(_) => "invalid_input",
            Self::Storage(_) | Self::Other(_) => "internal",
        }
    }
}

impl From<AudioServiceError> for AppError {
    fn from(err: AudioServiceError) -> Self {
        match err {
            AudioServiceError::NoProviderAvailable { .. } => {
                AppError::ServiceUnavailable(err.to_string())
            }
            AudioServiceError::SynthesisFailed { .. } => AppError::ExternalService(err.to_string()),
            AudioServiceError::ArtifactNotFound => AppError::NotFound("Audio not found".to_string()),
            AudioServiceError::InvalidRange { total_size } => {
                AppError::RangeNotSatisfiable { total_size }
            }
            AudioServiceError::InvalidItemId => {
                AppError::BadRequest("Invalid item id".to_string())
            }
            AudioServiceError::ArtifactConflict { .. } => AppError::Conflict(err.to_string()),
            AudioServiceError::Invalid(msg) => AppError::BadRequest(msg),
            AudioServiceError::Storage(e) => AppError::Internal(e.to_string()),
            AudioServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
