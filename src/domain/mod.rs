pub mod audio;
pub mod playback;
pub mod tts;
