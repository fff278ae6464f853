pub mod sequencer;
pub mod session;

pub use sequencer::{PlaybackSequencer, SequencerError, DEFAULT_DEBOUNCE};
pub use session::{
    FeedRecord, PlaybackEffect, PlaybackEvent, PlaybackSession, PlaybackStatus, PlaybackView,
};
