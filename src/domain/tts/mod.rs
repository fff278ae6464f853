pub mod audio_format;
pub mod language;
pub mod selector;
pub mod text;
pub mod voice;

pub use language::{LanguageCode, LanguageGuesser};
pub use selector::{ProviderBuilder, ProviderSelector};
pub use voice::VoiceHint;
