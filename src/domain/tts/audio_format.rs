//! Canonical artifact encoding.
//!
//! Every provider's output is converted to 16-bit signed PCM, mono, 16 kHz in
//! a RIFF/WAV container before it reaches the store, so nothing downstream
//! needs to know which engine produced an artifact.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;

pub const CANONICAL_SAMPLE_RATE: u32 = 16_000;
pub const CANONICAL_CHANNELS: u16 = 1;
pub const CANONICAL_BITS_PER_SAMPLE: u16 = 16;

#[derive(Debug, thiserror::Error)]
pub enum AudioFormatError {
    #[error("wav: {0}")]
    Wav(#[from] hound::Error),
    #[error("unsupported audio: {0}")]
    Unsupported(String),
}

pub fn canonical_spec() -> WavSpec {
    WavSpec {
        channels: CANONICAL_CHANNELS,
        sample_rate: CANONICAL_SAMPLE_RATE,
        bits_per_sample: CANONICAL_BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

/// Encode canonical mono samples into a WAV container
pub fn encode_canonical(samples: &[i16]) -> Result<Vec<u8>, AudioFormatError> {
    let mut buffer = Vec::new();
    {
        let mut writer = WavWriter::new(Cursor::new(&mut buffer), canonical_spec())?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(buffer)
}

/// Decode any PCM or float WAV into canonical mono 16 kHz samples
pub fn decode_to_canonical(wav: &[u8]) -> Result<Vec<i16>, AudioFormatError> {
    let mut reader = WavReader::new(Cursor::new(wav))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioFormatError::Unsupported("zero channels".to_string()));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioFormatError::Unsupported(format!(
                    "{}-bit integer samples",
                    spec.bits_per_sample
                )));
            }
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
    };

    let mono = downmix(&interleaved, spec.channels as usize);
    let resampled = resample_linear(&mono, spec.sample_rate, CANONICAL_SAMPLE_RATE);
    Ok(resampled.into_iter().map(to_i16).collect())
}

/// Re-encode any supported WAV into the canonical format
pub fn normalize_wav(wav: &[u8]) -> Result<Vec<u8>, AudioFormatError> {
    encode_canonical(&decode_to_canonical(wav)?)
}

/// Convert raw little-endian signed 16-bit mono PCM at `sample_rate` to canonical samples
pub fn pcm16_le_to_canonical(pcm: &[u8], sample_rate: u32) -> Vec<i16> {
    let samples: Vec<f32> = pcm
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();
    resample_linear(&samples, sample_rate, CANONICAL_SAMPLE_RATE)
        .into_iter()
        .map(to_i16)
        .collect()
}

fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((samples.len() as f64) / ratio).round() as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = (pos.floor() as usize).min(last);
            let next = (idx + 1).min(last);
            let frac = (pos - idx as f64) as f32;
            samples[idx] * (1.0 - frac) + samples[next] * frac
        })
        .collect()
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}
