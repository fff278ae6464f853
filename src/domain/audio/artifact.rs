use serde::Serialize;
use std::path::{Path, PathBuf};

use super::item_id::ItemId;

/// MIME type of every stored artifact (see `domain::tts::audio_format`)
pub const ARTIFACT_MIME_TYPE: &str = "audio/wav";
pub const ARTIFACT_EXTENSION: &str = "wav";

/// Immutable narration audio for one feed item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioArtifact {
    pub item_id: ItemId,
    pub key: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub size_bytes: u64,
    pub mime_type: &'static str,
}

impl AudioArtifact {
    pub fn new(item_id: ItemId, root: &Path, size_bytes: u64) -> Self {
        let key = artifact_key(&item_id);
        let path = root.join(&key);
        Self {
            item_id,
            key,
            path,
            size_bytes,
            mime_type: ARTIFACT_MIME_TYPE,
        }
    }

    /// Public URL the range server exposes this artifact at
    pub fn url(&self) -> String {
        audio_url(&self.item_id)
    }
}

/// Storage key, a pure function of the item id
pub fn artifact_key(item_id: &ItemId) -> String {
    format!("{}.{}", item_id, ARTIFACT_EXTENSION)
}

pub fn audio_url(item_id: &ItemId) -> String {
    format!("/audio/{}", item_id)
}
