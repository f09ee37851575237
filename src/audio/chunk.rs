use chrono::{DateTime, Utc};

use crate::audio::source::AudioFrame;

/// A fixed-duration span of normalized audio, ready for transcription.
///
/// Chunks are always mono at the pipeline's target sample rate; `index` is
/// the zero-based position within the session.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
    pub index: u64,
    /// When the chunk was completed.
    pub captured_at: DateTime<Utc>,
}

impl AudioChunk {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }
}

/// Accumulates normalized frames and emits fixed-duration chunks.
///
/// Pure and synchronous: `push` appends samples and returns every chunk the
/// new samples completed. A trailing partial chunk is never emitted; at
/// session end it is simply dropped from the transcription path (the full
/// take is still covered by the session's raw audio accumulator).
pub struct ChunkBuffer {
    samples_per_chunk: usize,
    sample_rate: u32,
    buffer: Vec<i16>,
    next_index: u64,
}

impl ChunkBuffer {
    /// Buffer mono audio at `sample_rate` into chunks of `chunk_seconds`.
    pub fn new(chunk_seconds: u64, sample_rate: u32) -> Self {
        Self {
            samples_per_chunk: (chunk_seconds * sample_rate as u64).max(1) as usize,
            sample_rate,
            buffer: Vec::new(),
            next_index: 0,
        }
    }

    /// Append samples, returning any chunks they completed. A single call can
    /// complete more than one chunk if the input outruns the chunk size.
    pub fn push(&mut self, samples: &[i16]) -> Vec<AudioChunk> {
        self.buffer.extend_from_slice(samples);

        let mut completed = Vec::new();
        while self.buffer.len() >= self.samples_per_chunk {
            let rest = self.buffer.split_off(self.samples_per_chunk);
            let samples = std::mem::replace(&mut self.buffer, rest);

            completed.push(AudioChunk {
                samples,
                sample_rate: self.sample_rate,
                channels: 1,
                index: self.next_index,
                captured_at: Utc::now(),
            });
            self.next_index += 1;
        }

        completed
    }

    /// Samples currently buffered toward the next chunk.
    pub fn buffered_samples(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffered_duration_ms(&self) -> u64 {
        self.buffer.len() as u64 * 1000 / self.sample_rate as u64
    }

    /// Total chunks emitted so far.
    pub fn chunks_emitted(&self) -> u64 {
        self.next_index
    }
}

/// Convert a frame to mono at the target sample rate.
///
/// Multi-channel input is averaged across channels; rate conversion is
/// nearest-neighbor, which is adequate for speech headed to a transcription
/// model. Frames already in the target format pass through unchanged.
pub fn normalize_frame(frame: &AudioFrame, target_rate: u32, target_channels: u16) -> AudioFrame {
    let mono: Vec<i16> = if frame.channels > 1 && target_channels == 1 {
        frame
            .samples
            .chunks_exact(frame.channels as usize)
            .map(|interleaved| {
                let sum: i32 = interleaved.iter().map(|&s| s as i32).sum();
                (sum / interleaved.len() as i32) as i16
            })
            .collect()
    } else {
        frame.samples.clone()
    };

    let samples = if frame.sample_rate == target_rate {
        mono
    } else {
        resample(&mono, frame.sample_rate, target_rate)
    };

    AudioFrame {
        samples,
        sample_rate: target_rate,
        channels: 1,
        timestamp_ms: frame.timestamp_ms,
    }
}

fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if samples.is_empty() {
        return Vec::new();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = (samples.len() as f64 / ratio).round() as usize;

    (0..out_len)
        .map(|i| {
            let src = (i as f64 * ratio) as usize;
            samples[src.min(samples.len() - 1)]
        })
        .collect()
}
