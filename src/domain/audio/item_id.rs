use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

use super::error::AudioServiceError;

/// Length of a hex-encoded SHA-256 digest
pub const ITEM_ID_LEN: usize = 64;

/// Stable identifier of a feed item: the hex SHA-256 of its content.
///
/// Only values that pass [`ItemId::parse`] can exist, so anything holding an
/// `ItemId` may safely use it as a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    /// Validate against the allow-list: exactly 64 hex characters.
    pub fn parse(raw: &str) -> Result<Self, AudioServiceError> {
        if raw.len() != ITEM_ID_LEN || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AudioServiceError::InvalidItemId);
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// Derive the id of a feed item from its identifying content.
    ///
    /// Fields are length-prefixed so that moving text between them changes the id.
    pub fn for_content(source_url: &str, title: &str, body: &str) -> Self {
        let mut hasher = Sha256::new();
        for field in [source_url, title, body] {
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ItemId::parse(&raw).map_err(serde::de::Error::custom)
    }
}
