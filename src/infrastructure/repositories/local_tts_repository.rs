//! Local CLI synthesis engines.
//!
//! Prefers Piper (needs a voice model per narrator) and falls back to
//! espeak-ng. Both write a WAV file which is normalized to the canonical
//! artifact format.

use super::tts_repository::{SynthesisError, TtsRepository};
use crate::domain::tts::audio_format::normalize_wav;
use crate::domain::tts::{ProviderBuilder, VoiceHint};
use crate::infrastructure::config::LocalTtsConfig;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub const LOCAL_PROVIDER_NAME: &str = "local";

#[derive(Debug, Clone, PartialEq)]
pub enum LocalEngine {
    Piper {
        bin: PathBuf,
        voice_a: PathBuf,
        voice_b: Option<PathBuf>,
    },
    Espeak {
        bin: PathBuf,
    },
}

impl LocalEngine {
    fn as_str(&self) -> &'static str {
        match self {
            LocalEngine::Piper { .. } => "piper",
            LocalEngine::Espeak { .. } => "espeak-ng",
        }
    }
}

pub struct LocalTtsRepository {
    engine: LocalEngine,
    timeout: Duration,
}

impl LocalTtsRepository {
    pub fn new(engine: LocalEngine, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    /// Both engines read the narration from stdin, so the text is never
    /// parsed as an option and is not bound by the argv size limit
    fn command(&self, voice: VoiceHint, out_wav: &Path) -> Command {
        let mut cmd = match &self.engine {
            LocalEngine::Piper { bin, voice_a, voice_b } => {
                let model = match voice {
                    VoiceHint::NarratorA => voice_a,
                    VoiceHint::NarratorB => voice_b.as_ref().unwrap_or(voice_a),
                };
                let mut cmd = Command::new(bin);
                cmd.arg("-m").arg(model).arg("-f").arg(out_wav);
                cmd
            }
            LocalEngine::Espeak { bin } => {
                let variant = match voice {
                    VoiceHint::NarratorA => "en+f3",
                    VoiceHint::NarratorB => "en+m3",
                };
                let mut cmd = Command::new(bin);
                cmd.arg("--stdin").arg("-v").arg(variant).arg("-w").arg(out_wav);
                cmd
            }
        };
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run_engine(&self, text: &str, voice: VoiceHint, out_wav: &Path) -> Result<(), SynthesisError> {
        let mut cmd = self.command(voice, out_wav);

        tracing::debug!(engine = self.engine.as_str(), command = ?cmd, "Running local TTS engine");

        let mut child = cmd
            .spawn()
            .map_err(|e| SynthesisError::new(format!("failed to start {}: {}", self.engine.as_str(), e)))?;

        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(text.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };

        // Feeding stdin and draining stderr run together under one deadline.
        // Dropping the child on timeout kills the engine.
        let (fed, output) = tokio::time::timeout(self.timeout, async move {
            tokio::join!(feed, child.wait_with_output())
        })
        .await
        .map_err(|_| SynthesisError::new(format!("{} timed out after {:?}", self.engine.as_str(), self.timeout)))?;

        let output = output.map_err(|e| SynthesisError::new(format!("{} failed: {}", self.engine.as_str(), e)))?;

        if !output.status.success() {
            return Err(SynthesisError::new(format!(
                "{} exited with {}: {}",
                self.engine.as_str(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        fed.map_err(|e| SynthesisError::new(format!("failed to feed text: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl TtsRepository for LocalTtsRepository {
    fn name(&self) -> &'static str {
        LOCAL_PROVIDER_NAME
    }

    async fn synthesize(&self, text: &str, voice: VoiceHint) -> Result<Vec<u8>, SynthesisError> {
        let start_time = std::time::Instant::now();
        let scratch = tempfile::tempdir()
            .map_err(|e| SynthesisError::new(format!("failed to create scratch dir: {}", e)))?;
        let out_wav = scratch.path().join("narration.wav");

        self.run_engine(text, voice, &out_wav).await?;

        let raw = tokio::fs::read(&out_wav)
            .await
            .map_err(|e| SynthesisError::new(format!("engine produced no audio: {}", e)))?;
        let audio_data = normalize_wav(&raw)
            .map_err(|e| SynthesisError::new(format!("engine produced unreadable audio: {}", e)))?;

        tracing::info!(
            provider = LOCAL_PROVIDER_NAME,
            engine = self.engine.as_str(),
            voice = %voice,
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = text.len(),
            audio_size_bytes = audio_data.len(),
            "TTS synthesis completed"
        );

        Ok(audio_data)
    }
}

/// Constructs the local provider, checking binaries and models on every call
pub struct LocalProviderBuilder {
    config: LocalTtsConfig,
}

impl LocalProviderBuilder {
    pub fn new(config: LocalTtsConfig) -> Self {
        Self { config }
    }

    fn detect_engine(&self) -> Result<LocalEngine, String> {
        let existing = |p: &Option<PathBuf>| p.as_ref().filter(|p| p.is_file()).cloned();

        let piper_bin = existing(&self.config.piper_bin);
        let voice_a = existing(&self.config.piper_voice_a);
        if let (Some(bin), Some(voice_a)) = (piper_bin.clone(), voice_a) {
            return Ok(LocalEngine::Piper {
                bin,
                voice_a,
                voice_b: existing(&self.config.piper_voice_b),
            });
        }

        if let Some(bin) = existing(&self.config.espeak_bin) {
            return Ok(LocalEngine::Espeak { bin });
        }

        if piper_bin.is_some() {
            Err("piper found but no voice model at PIPER_VOICE_A, and espeak-ng missing".to_string())
        } else {
            Err("no local engine binary found (piper, espeak-ng)".to_string())
        }
    }
}

impl ProviderBuilder for LocalProviderBuilder {
    fn name(&self) -> &'static str {
        LOCAL_PROVIDER_NAME
    }

    fn build(&self) -> Result<Arc<dyn TtsRepository>, String> {
        let engine = self.detect_engine()?;
        Ok(Arc::new(LocalTtsRepository::new(
            engine,
            Duration::from_secs(self.config.timeout_secs.max(1)),
        )))
    }
}
