use std::collections::HashSet;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::domain::audio::{artifact_key, AudioArtifact, AudioServiceError, ByteRange, ItemId, ARTIFACT_EXTENSION};

/// Content-addressed artifact store on the local filesystem.
///
/// Artifacts are written to a temp file in the same directory and renamed
/// into place, so a reader never observes a partially written artifact.
/// Reads take no locks.
pub struct AudioArtifactRepository {
    root: PathBuf,
}

impl AudioArtifactRepository {
    /// Open the store, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, item_id: &ItemId) -> PathBuf {
        self.root.join(artifact_key(item_id))
    }

    pub async fn has(&self, item_id: &ItemId) -> Result<bool, AudioServiceError> {
        Ok(tokio::fs::try_exists(self.path_for(item_id)).await?)
    }

    pub async fn get(&self, item_id: &ItemId) -> Result<AudioArtifact, AudioServiceError> {
        match tokio::fs::metadata(self.path_for(item_id)).await {
            Ok(meta) if meta.is_file() => Ok(AudioArtifact::new(item_id.clone(), &self.root, meta.len())),
            Ok(_) => Err(AudioServiceError::ArtifactNotFound),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AudioServiceError::ArtifactNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Store `bytes` under `item_id`.
    ///
    /// Writing identical bytes again returns the existing artifact. Different
    /// bytes for an id that is already stored are rejected.
    pub async fn put(&self, item_id: &ItemId, bytes: Vec<u8>) -> Result<AudioArtifact, AudioServiceError> {
        if let Some(artifact) = self.check_existing(item_id, &bytes).await? {
            return Ok(artifact);
        }

        let root = self.root.clone();
        let target = self.path_for(item_id);
        let size = bytes.len() as u64;
        let bytes_for_write = bytes.clone();

        let persisted = tokio::task::spawn_blocking(move || -> std::io::Result<bool> {
            let mut tmp = tempfile::NamedTempFile::new_in(&root)?;
            tmp.write_all(&bytes_for_write)?;
            tmp.as_file().sync_all()?;
            match tmp.persist_noclobber(&target) {
                Ok(_) => Ok(true),
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
                Err(e) => Err(e.error),
            }
        })
        .await
        .map_err(|e| AudioServiceError::Other(anyhow::anyhow!("artifact write task failed: {}", e)))??;

        if !persisted {
            // Another writer finished first
            return self
                .check_existing(item_id, &bytes)
                .await?
                .ok_or(AudioServiceError::ArtifactNotFound);
        }

        tracing::info!(item_id = %item_id, size_bytes = size, "Audio artifact stored");
        Ok(AudioArtifact::new(item_id.clone(), &self.root, size))
    }

    async fn check_existing(&self, item_id: &ItemId, bytes: &[u8]) -> Result<Option<AudioArtifact>, AudioServiceError> {
        let existing = match tokio::fs::read(self.path_for(item_id)).await {
            Ok(existing) => existing,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if existing == bytes {
            tracing::debug!(item_id = %item_id, "Identical artifact already stored");
            return Ok(Some(AudioArtifact::new(item_id.clone(), &self.root, existing.len() as u64)));
        }

        tracing::error!(
            item_id = %item_id,
            stored_size = existing.len(),
            new_size = bytes.len(),
            "Content-address anomaly: artifact already stored with different bytes"
        );
        Err(AudioServiceError::ArtifactConflict {
            item_id: item_id.to_string(),
        })
    }

    /// Which of `item_ids` are stored, answered with a single directory scan
    pub async fn existing(&self, item_ids: &[ItemId]) -> Result<HashSet<ItemId>, AudioServiceError> {
        let wanted: HashSet<&ItemId> = item_ids.iter().collect();
        let mut found = HashSet::new();
        if wanted.is_empty() {
            return Ok(found);
        }

        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(stem) = name
                .to_str()
                .and_then(|n| n.strip_suffix(ARTIFACT_EXTENSION))
                .and_then(|n| n.strip_suffix('.'))
            else {
                continue;
            };
            if let Ok(id) = ItemId::parse(stem) {
                if wanted.contains(&id) {
                    found.insert(id);
                }
            }
        }

        Ok(found)
    }

    /// Open the artifact positioned at `range.start`, limited to the range length
    pub async fn open_range(
        &self,
        artifact: &AudioArtifact,
        range: Option<ByteRange>,
    ) -> Result<tokio::io::Take<tokio::fs::File>, AudioServiceError> {
        let mut file = match tokio::fs::File::open(&artifact.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(AudioServiceError::ArtifactNotFound),
            Err(e) => return Err(e.into()),
        };

        let (start, length) = match range {
            Some(range) => (range.start, range.length()),
            None => (0, artifact.size_bytes),
        };
        if start > 0 {
            file.seek(std::io::SeekFrom::Start(start)).await?;
        }
        Ok(file.take(length))
    }
}
