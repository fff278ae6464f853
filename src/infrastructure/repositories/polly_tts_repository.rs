use super::tts_repository::{SynthesisError, TtsRepository};
use crate::domain::tts::audio_format::{encode_canonical, pcm16_le_to_canonical, CANONICAL_SAMPLE_RATE};
use crate::domain::tts::text::split_into_batches;
use crate::domain::tts::{LanguageCode, LanguageGuesser, ProviderBuilder, VoiceHint};
use async_trait::async_trait;
use aws_sdk_polly::{
    config::{BehaviorVersion, Credentials, Region},
    types::{Engine, OutputFormat, VoiceId},
    Client as PollyClient,
};
use std::sync::Arc;

/// AWS Polly has a limit of 3000 characters per request
const MAX_BATCH_SIZE: usize = 3000;

pub const POLLY_PROVIDER_NAME: &str = "polly";

/// AWS Polly implementation of TTS repository
pub struct PollyTtsRepository {
    polly_client: Arc<PollyClient>,
    language_guesser: Arc<LanguageGuesser>,
    voice_overrides: VoiceOverrides,
}

/// Optional fixed Polly voices per hint, taking precedence over language mapping
#[derive(Debug, Clone, Default)]
pub struct VoiceOverrides {
    pub narrator_a: Option<String>,
    pub narrator_b: Option<String>,
}

impl PollyTtsRepository {
    pub fn new(
        polly_client: Arc<PollyClient>,
        language_guesser: Arc<LanguageGuesser>,
        voice_overrides: VoiceOverrides,
    ) -> Self {
        Self {
            polly_client,
            language_guesser,
            voice_overrides,
        }
    }

    /// Select the Polly neural voice for a language and narrator
    fn get_voice(&self, language: LanguageCode, hint: VoiceHint) -> String {
        let overridden = match hint {
            VoiceHint::NarratorA => self.voice_overrides.narrator_a.as_ref(),
            VoiceHint::NarratorB => self.voice_overrides.narrator_b.as_ref(),
        };
        if let Some(voice) = overridden {
            return voice.clone();
        }

        match (language, hint) {
            (LanguageCode::English, VoiceHint::NarratorA) => "Joanna",
            (LanguageCode::English, VoiceHint::NarratorB) => "Matthew",
            (LanguageCode::Spanish, VoiceHint::NarratorA) => "Lupe",
            (LanguageCode::Spanish, VoiceHint::NarratorB) => "Sergio",
            (LanguageCode::French, VoiceHint::NarratorA) => "Lea",
            (LanguageCode::French, VoiceHint::NarratorB) => "Remi",
            (LanguageCode::German, VoiceHint::NarratorA) => "Vicki",
            (LanguageCode::German, VoiceHint::NarratorB) => "Daniel",
            (LanguageCode::Italian, VoiceHint::NarratorA) => "Bianca",
            (LanguageCode::Italian, VoiceHint::NarratorB) => "Adriano",
            (LanguageCode::Portuguese, VoiceHint::NarratorA) => "Ines",
            (LanguageCode::Portuguese, VoiceHint::NarratorB) => "Thiago",
        }
        .to_string()
    }

    /// Call AWS Polly to synthesize a single text batch as raw PCM
    async fn call_polly(&self, text: &str, voice_name: &str) -> Result<Vec<u8>, SynthesisError> {
        let voice_id = VoiceId::from(voice_name);
        let engine = Engine::Neural;

        tracing::debug!(
            voice = voice_name,
            engine = ?engine,
            output_format = "Pcm",
            text_length = text.len(),
            "Calling AWS Polly synthesize_speech"
        );

        let result = self
            .polly_client
            .synthesize_speech()
            .text(text)
            .voice_id(voice_id)
            .output_format(OutputFormat::Pcm)
            .sample_rate(CANONICAL_SAMPLE_RATE.to_string())
            .engine(engine.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = ?e,
                    voice = voice_name,
                    engine = ?engine,
                    text_length = text.len(),
                    "AWS Polly synthesize_speech failed"
                );
                SynthesisError::new(format!("AWS Polly error: {}", e))
            })?;

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            SynthesisError::new(format!("Failed to read audio stream: {}", e))
        })?;

        Ok(audio_stream.into_bytes().to_vec())
    }
}

#[async_trait]
impl TtsRepository for PollyTtsRepository {
    fn name(&self) -> &'static str {
        POLLY_PROVIDER_NAME
    }

    async fn synthesize(&self, text: &str, voice: VoiceHint) -> Result<Vec<u8>, SynthesisError> {
        let start_time = std::time::Instant::now();

        let language = self.language_guesser.detect(text);
        let voice_name = self.get_voice(language, voice);
        let batches = split_into_batches(text, MAX_BATCH_SIZE);

        tracing::info!(
            language = %language,
            voice = %voice_name,
            batch_count = batches.len(),
            text_length = text.len(),
            "Starting Polly synthesis"
        );

        // PCM segments are concatenated as samples, never as encoded containers
        let mut samples = Vec::new();
        for (index, batch) in batches.iter().enumerate() {
            let pcm = self.call_polly(batch, &voice_name).await?;
            samples.extend(pcm16_le_to_canonical(&pcm, CANONICAL_SAMPLE_RATE));
            tracing::debug!(batch_index = index, total_samples = samples.len(), "Batch synthesized");
        }

        let audio_data = encode_canonical(&samples)
            .map_err(|e| SynthesisError::new(format!("Failed to encode audio: {}", e)))?;

        let duration = start_time.elapsed();
        tracing::info!(
            provider = POLLY_PROVIDER_NAME,
            latency_ms = duration.as_millis(),
            characters_count = text.len(),
            batch_count = batches.len(),
            audio_size_bytes = audio_data.len(),
            "TTS synthesis completed"
        );

        Ok(audio_data)
    }
}

/// Builds the Polly provider from credentials in the environment.
///
/// Credentials are read on every build so that adding them to the
/// environment makes the fallback available without a restart. No network
/// call happens here.
pub struct PollyProviderBuilder {
    region: String,
    language_guesser: Arc<LanguageGuesser>,
}

impl PollyProviderBuilder {
    pub fn new(region: String, language_guesser: Arc<LanguageGuesser>) -> Self {
        Self {
            region,
            language_guesser,
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl ProviderBuilder for PollyProviderBuilder {
    fn name(&self) -> &'static str {
        POLLY_PROVIDER_NAME
    }

    fn build(&self) -> Result<Arc<dyn TtsRepository>, String> {
        let access_key = non_empty_env("AWS_ACCESS_KEY_ID")
            .ok_or_else(|| "AWS_ACCESS_KEY_ID not set".to_string())?;
        let secret_key = non_empty_env("AWS_SECRET_ACCESS_KEY")
            .ok_or_else(|| "AWS_SECRET_ACCESS_KEY not set".to_string())?;
        let session_token = non_empty_env("AWS_SESSION_TOKEN");

        let credentials = Credentials::new(access_key, secret_key, session_token, None, "environment");
        let config = aws_sdk_polly::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(credentials)
            .build();

        let overrides = VoiceOverrides {
            narrator_a: non_empty_env("POLLY_VOICE_A"),
            narrator_b: non_empty_env("POLLY_VOICE_B"),
        };

        Ok(Arc::new(PollyTtsRepository::new(
            Arc::new(PollyClient::from_conf(config)),
            self.language_guesser.clone(),
            overrides,
        )))
    }
}
