pub mod artifact;
pub mod error;
pub mod item_id;
pub mod range;
pub mod service;

pub use artifact::{artifact_key, audio_url, AudioArtifact, ARTIFACT_EXTENSION, ARTIFACT_MIME_TYPE};
pub use error::{AudioServiceError, ProviderAttempt};
pub use item_id::ItemId;
pub use range::ByteRange;
pub use service::{
    Availability, GeneratedItem, GenerationReport, ItemOutcome, ItemReport, NarrationItem,
    NarrationService, NarrationServiceApi, ProviderStatus,
};
