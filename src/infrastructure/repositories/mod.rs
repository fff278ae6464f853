pub mod audio_artifact_repository;
pub mod local_tts_repository;
pub mod polly_tts_repository;
pub mod tts_repository;

pub use audio_artifact_repository::AudioArtifactRepository;
pub use local_tts_repository::{LocalEngine, LocalProviderBuilder, LocalTtsRepository, LOCAL_PROVIDER_NAME};
pub use polly_tts_repository::{PollyProviderBuilder, PollyTtsRepository, VoiceOverrides, POLLY_PROVIDER_NAME};
pub use tts_repository::{SynthesisError, TtsRepository};
