use serde::{Deserialize, Serialize};

use crate::domain::audio::{audio_url, ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

/// A feed entry as the feed collaborator hands it over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedRecord {
    pub item_id: ItemId,
    pub has_audio: bool,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    PlayItem(ItemId),
    TogglePlayPause,
    Next,
    Previous,
    /// The audio element finished loading the source of `generation`
    SourceLoaded { generation: u64 },
    PositionChanged { generation: u64, seconds: f64 },
    /// Natural end of the audio of `generation`
    PlaybackEnded { generation: u64 },
    ItemListChanged(Vec<FeedRecord>),
}

impl PlaybackEvent {
    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::Next | Self::Previous)
    }
}

/// Side effects the UI layer must carry out, in order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum PlaybackEffect {
    LoadSource {
        item_id: ItemId,
        url: String,
        generation: u64,
    },
    Play,
    Pause,
    Resume {
        from: f64,
    },
    StopAudio,
    ScrollIntoView {
        item_id: ItemId,
    },
    Highlight {
        item_id: ItemId,
    },
    ClearHighlight,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackView {
    pub status: PlaybackStatus,
    pub current_item: Option<ItemId>,
    pub current_index: Option<usize>,
    pub position_seconds: f64,
    pub next_enabled: bool,
    pub previous_enabled: bool,
}

/// Single-channel playback state for one listening session.
///
/// Every `PlayItem` and every list change starts a new load generation.
/// Player callbacks tagged with an older generation are dropped, which is
/// what makes a list change a hard cancellation of in-flight loads.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    items: Vec<ItemId>,
    status: PlaybackStatus,
    current_index: Option<usize>,
    position_seconds: f64,
    generation: u64,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PlaybackSession {
    pub fn new(items: Vec<ItemId>) -> Self {
        Self {
            items,
            status: PlaybackStatus::Stopped,
            current_index: None,
            position_seconds: 0.0,
            generation: 0,
        }
    }

    /// Build the playable order from feed records, skipping items with no audio
    pub fn from_records(records: &[FeedRecord]) -> Self {
        Self::new(playable_ids(records))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn view(&self) -> PlaybackView {
        let len = self.items.len();
        PlaybackView {
            status: self.status,
            current_item: self.current_index.map(|i| self.items[i].clone()),
            current_index: self.current_index,
            position_seconds: self.position_seconds,
            next_enabled: self.current_index.is_some_and(|i| i + 1 < len),
            previous_enabled: self.current_index.is_some_and(|i| i > 0),
        }
    }

    pub fn dispatch(&mut self, event: PlaybackEvent) -> Vec<PlaybackEffect> {
        match event {
            PlaybackEvent::PlayItem(id) => match self.items.iter().position(|i| *i == id) {
                Some(index) => self.play_index(index),
                None => {
                    tracing::warn!(item_id = %id, "Ignoring play request for item not in the current list");
                    Vec::new()
                }
            },
            PlaybackEvent::TogglePlayPause => self.toggle(),
            PlaybackEvent::Next => self.step(1),
            PlaybackEvent::Previous => self.step(-1),
            PlaybackEvent::SourceLoaded { generation } => {
                if self.is_stale(generation) || self.status != PlaybackStatus::Playing {
                    return Vec::new();
                }
                vec![PlaybackEffect::Play]
            }
            PlaybackEvent::PositionChanged { generation, seconds } => {
                if !self.is_stale(generation) && self.status != PlaybackStatus::Stopped {
                    self.position_seconds = seconds;
                }
                Vec::new()
            }
            PlaybackEvent::PlaybackEnded { generation } => {
                if self.is_stale(generation) || self.status == PlaybackStatus::Stopped {
                    return Vec::new();
                }
                tracing::debug!(generation, "Playback reached the end of the item");
                self.stop();
                vec![PlaybackEffect::ClearHighlight]
            }
            PlaybackEvent::ItemListChanged(records) => {
                self.items = playable_ids(&records);
                self.stop();
                tracing::debug!(items = self.items.len(), generation = self.generation, "Item list replaced");
                vec![PlaybackEffect::StopAudio, PlaybackEffect::ClearHighlight]
            }
        }
    }

    fn play_index(&mut self, index: usize) -> Vec<PlaybackEffect> {
        self.generation += 1;
        self.current_index = Some(index);
        self.status = PlaybackStatus::Playing;
        self.position_seconds = 0.0;

        let item_id = self.items[index].clone();
        vec![
            PlaybackEffect::LoadSource {
                url: audio_url(&item_id),
                item_id: item_id.clone(),
                generation: self.generation,
            },
            PlaybackEffect::ScrollIntoView {
                item_id: item_id.clone(),
            },
            PlaybackEffect::Highlight { item_id },
        ]
    }

    fn toggle(&mut self) -> Vec<PlaybackEffect> {
        match self.status {
            PlaybackStatus::Playing => {
                self.status = PlaybackStatus::Paused;
                vec![PlaybackEffect::Pause]
            }
            PlaybackStatus::Paused => {
                self.status = PlaybackStatus::Playing;
                vec![PlaybackEffect::Resume {
                    from: self.position_seconds,
                }]
            }
            PlaybackStatus::Stopped => Vec::new(),
        }
    }

    /// Move one item forward (`1`) or back (`-1`). Stepping past either end
    /// stops playback instead of wrapping.
    fn step(&mut self, direction: isize) -> Vec<PlaybackEffect> {
        let Some(current) = self.current_index else {
            return Vec::new();
        };

        match current.checked_add_signed(direction) {
            Some(target) if target < self.items.len() => self.play_index(target),
            _ => {
                self.stop();
                vec![PlaybackEffect::StopAudio, PlaybackEffect::ClearHighlight]
            }
        }
    }

    fn stop(&mut self) {
        self.generation += 1;
        self.status = PlaybackStatus::Stopped;
        self.current_index = None;
        self.position_seconds = 0.0;
    }

    fn is_stale(&self, generation: u64) -> bool {
        generation != self.generation
    }
}

fn playable_ids(records: &[FeedRecord]) -> Vec<ItemId> {
    records
        .iter()
        .filter(|r| r.has_audio)
        .map(|r| r.item_id.clone())
        .collect()
}
