use super::artifact::AudioArtifact;
use super::error::AudioServiceError;
use super::item_id::ItemId;
use crate::domain::tts::text::clean_text;
use crate::domain::tts::{ProviderSelector, VoiceHint};
use crate::infrastructure::repositories::AudioArtifactRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// One feed item to narrate
#[derive(Debug, Clone)]
pub struct NarrationItem {
    pub id: ItemId,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedItem {
    pub artifact: AudioArtifact,
    /// Provider that synthesized the audio; `None` when it was already stored
    pub provider: Option<String>,
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Ready {
        url: String,
        size_bytes: u64,
        provider: Option<String>,
        cached: bool,
    },
    Failed {
        kind: String,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub id: ItemId,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub items: Vec<ItemReport>,
    pub ready: usize,
    pub failed: usize,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Availability {
    pub id: ItemId,
    pub has_audio: bool,
}

/// Which provider a synthesis right now would use, for the UI status area
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProviderStatus {
    pub provider: Option<String>,
    pub error: Option<String>,
}

pub struct NarrationService {
    store: Arc<AudioArtifactRepository>,
    selector: Arc<ProviderSelector>,
    generation_locks: Cache<ItemId, Arc<Mutex<()>>>,
    max_text_chars: usize,
}

impl NarrationService {
    pub fn new(
        store: Arc<AudioArtifactRepository>,
        selector: Arc<ProviderSelector>,
        max_text_chars: usize,
    ) -> Self {
        let generation_locks = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(Duration::from_secs(10 * 60))
            .build();

        Self {
            store,
            selector,
            generation_locks,
            max_text_chars,
        }
    }
}

#[async_trait]
pub trait NarrationServiceApi: Send + Sync {
    /// Return the stored artifact for an item, synthesizing it on a miss.
    ///
    /// Blocks until synthesis completes. Concurrent calls for the same item
    /// are serialized so the audio is synthesized at most once.
    async fn generate(&self, item: &NarrationItem, voice: VoiceHint) -> Result<GeneratedItem, AudioServiceError>;

    /// Generate every item in order, isolating per-item failures
    async fn generate_batch(&self, items: Vec<NarrationItem>, voice: VoiceHint) -> GenerationReport;

    /// "Has audio" flags for a page of items, in request order
    async fn availability(&self, ids: &[ItemId]) -> Result<Vec<Availability>, AudioServiceError>;

    async fn artifact(&self, id: &ItemId) -> Result<AudioArtifact, AudioServiceError>;

    fn current_provider(&self) -> ProviderStatus;
}

#[async_trait]
impl NarrationServiceApi for NarrationService {
    async fn generate(&self, item: &NarrationItem, voice: VoiceHint) -> Result<GeneratedItem, AudioServiceError> {
        if let Some(hit) = self.cached(&item.id).await? {
            return Ok(hit);
        }

        let lock = self
            .generation_locks
            .get_with(item.id.clone(), async { Arc::new(Mutex::new(())) })
            .await;
        let _guard = lock.lock().await;

        // Someone else may have finished while we waited
        if let Some(hit) = self.cached(&item.id).await? {
            return Ok(hit);
        }

        let text = self.prepare_text(&item.text)?;
        let provider = self.selector.select_provider()?;
        let provider_name = provider.name().to_string();

        tracing::info!(
            item_id = %item.id,
            provider = %provider_name,
            voice = %voice,
            text_length = text.len(),
            "Synthesizing narration"
        );

        let audio = provider
            .synthesize(&text, voice)
            .await
            .map_err(|e| AudioServiceError::SynthesisFailed {
                provider: provider_name.clone(),
                message: e.message,
            })?;

        let artifact = match self.store.put(&item.id, audio).await {
            Ok(artifact) => artifact,
            Err(AudioServiceError::ArtifactConflict { .. }) => {
                // A concurrent generation stored this item first; its audio wins
                tracing::warn!(
                    item_id = %item.id,
                    provider = %provider_name,
                    "Item stored by a concurrent generation, discarding new audio"
                );
                return self
                    .cached(&item.id)
                    .await?
                    .ok_or(AudioServiceError::ArtifactNotFound);
            }
            Err(e) => return Err(e),
        };

        Ok(GeneratedItem {
            artifact,
            provider: Some(provider_name),
            cached: false,
        })
    }

    async fn generate_batch(&self, items: Vec<NarrationItem>, voice: VoiceHint) -> GenerationReport {
        let mut reports = Vec::with_capacity(items.len());

        for item in items {
            let outcome = match self.generate(&item, voice).await {
                Ok(generated) => ItemOutcome::Ready {
                    url: generated.artifact.url(),
                    size_bytes: generated.artifact.size_bytes,
                    provider: generated.provider,
                    cached: generated.cached,
                },
                Err(e) => {
                    tracing::warn!(item_id = %item.id, error = %e, "Narration failed for item, continuing");
                    ItemOutcome::Failed {
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    }
                }
            };
            reports.push(ItemReport { id: item.id, outcome });
        }

        let failed = reports
            .iter()
            .filter(|r| matches!(r.outcome, ItemOutcome::Failed { .. }))
            .count();

        tracing::info!(total = reports.len(), failed, "Narration batch completed");

        GenerationReport {
            ready: reports.len() - failed,
            failed,
            items: reports,
            completed_at: Utc::now(),
        }
    }

    async fn availability(&self, ids: &[ItemId]) -> Result<Vec<Availability>, AudioServiceError> {
        let existing = self.store.existing(ids).await?;
        Ok(ids
            .iter()
            .map(|id| Availability {
                id: id.clone(),
                has_audio: existing.contains(id),
            })
            .collect())
    }

    async fn artifact(&self, id: &ItemId) -> Result<AudioArtifact, AudioServiceError> {
        self.store.get(id).await
    }

    fn current_provider(&self) -> ProviderStatus {
        match self.selector.select_provider() {
            Ok(provider) => ProviderStatus {
                provider: Some(provider.name().to_string()),
                error: None,
            },
            Err(e) => ProviderStatus {
                provider: None,
                error: Some(e.to_string()),
            },
        }
    }
}

impl NarrationService {
    async fn cached(&self, id: &ItemId) -> Result<Option<GeneratedItem>, AudioServiceError> {
        match self.store.get(id).await {
            Ok(artifact) => Ok(Some(GeneratedItem {
                artifact,
                provider: None,
                cached: true,
            })),
            Err(AudioServiceError::ArtifactNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn prepare_text(&self, raw: &str) -> Result<String, AudioServiceError> {
        let text = clean_text(raw);
        if text.is_empty() {
            return Err(AudioServiceError::Invalid("Text cannot be empty".to_string()));
        }
        if text.chars().count() > self.max_text_chars {
            return Err(AudioServiceError::Invalid(format!(
                "Text must be {} characters or less",
                self.max_text_chars
            )));
        }
        Ok(text)
    }
}
