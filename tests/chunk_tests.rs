// Integration tests for audio chunking and normalization
//
// These tests verify that captured frames accumulate into fixed-duration
// chunks with no samples lost or duplicated at the boundaries, and that
// normalization produces mono audio at the transcription sample rate.

use anyhow::Result;
use wingman::{encode_wav, normalize_frame, AudioFrame, ChunkBuffer};

fn frame(samples: Vec<i16>, sample_rate: u32, channels: u16) -> AudioFrame {
    AudioFrame {
        samples,
        sample_rate,
        channels,
        timestamp_ms: 0,
    }
}

#[test]
fn test_chunks_emit_after_exact_duration() {
    // 2s chunks at 16kHz = 32000 samples; 100ms frames = 1600 samples
    let mut buffer = ChunkBuffer::new(2, 16000);

    let mut chunks = Vec::new();
    for _ in 0..50 {
        chunks.extend(buffer.push(&vec![0i16; 1600]));
    }

    // 5 seconds of audio completes 2 two-second chunks
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].samples.len(), 32000);
    assert_eq!(chunks[1].samples.len(), 32000);
    assert_eq!(chunks[0].index, 0);
    assert_eq!(chunks[1].index, 1);

    // The remaining second stays buffered; a partial chunk is never emitted
    assert_eq!(buffer.buffered_samples(), 16000);
    assert_eq!(buffer.buffered_duration_ms(), 1000);
    assert_eq!(buffer.chunks_emitted(), 2);
}

#[test]
fn test_chunk_boundaries_lose_and_repeat_nothing() {
    // Distinct sample values make gaps or duplicates visible
    let mut buffer = ChunkBuffer::new(1, 4);
    let samples: Vec<i16> = (0..10).map(|i| i as i16).collect();

    let mut chunks = Vec::new();
    chunks.extend(buffer.push(&samples[..6]));
    chunks.extend(buffer.push(&samples[6..]));

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].samples, vec![0, 1, 2, 3]);
    assert_eq!(chunks[1].samples, vec![4, 5, 6, 7]);
    assert_eq!(buffer.buffered_samples(), 2);
}

#[test]
fn test_one_push_can_complete_multiple_chunks() {
    let mut buffer = ChunkBuffer::new(1, 4);
    let samples: Vec<i16> = (0..9).map(|i| i as i16).collect();

    let chunks = buffer.push(&samples);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].samples, vec![0, 1, 2, 3]);
    assert_eq!(chunks[1].samples, vec![4, 5, 6, 7]);
    assert_eq!(buffer.buffered_samples(), 1);
}

#[test]
fn test_empty_push_emits_nothing() {
    let mut buffer = ChunkBuffer::new(1, 16000);
    assert!(buffer.push(&[]).is_empty());
    assert_eq!(buffer.buffered_samples(), 0);
}

#[test]
fn test_normalize_averages_stereo_pairs_to_mono() {
    let f = frame(vec![100, 200, -50, 50, 1000, 3000], 16000, 2);

    let mono = normalize_frame(&f, 16000, 1);

    assert_eq!(mono.channels, 1);
    assert_eq!(mono.sample_rate, 16000);
    assert_eq!(mono.samples, vec![150, 0, 2000]);
}

#[test]
fn test_normalize_downsamples_to_target_rate() {
    // 48kHz to 16kHz keeps every third sample
    let samples: Vec<i16> = (0..48).map(|i| i as i16).collect();
    let f = frame(samples, 48000, 1);

    let out = normalize_frame(&f, 16000, 1);

    assert_eq!(out.sample_rate, 16000);
    assert_eq!(out.samples.len(), 16);
    assert_eq!(out.samples[0], 0);
    assert_eq!(out.samples[1], 3);
    assert_eq!(out.samples[15], 45);
}

#[test]
fn test_normalize_passes_matching_audio_through() {
    let f = frame(vec![1, 2, 3], 16000, 1);
    let out = normalize_frame(&f, 16000, 1);
    assert_eq!(out.samples, vec![1, 2, 3]);
    assert_eq!(out.timestamp_ms, f.timestamp_ms);
}

#[test]
fn test_encoded_wav_is_a_valid_16bit_mono_file() -> Result<()> {
    let samples: Vec<i16> = (0..1600).map(|i| (i % 64) as i16).collect();

    let bytes = encode_wav(&samples, 16000, 1)?;

    let reader = hound::WavReader::new(std::io::Cursor::new(bytes))?;
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 16000);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);

    let decoded: Vec<i16> = reader
        .into_samples::<i16>()
        .collect::<std::result::Result<_, _>>()?;
    assert_eq!(decoded, samples);
    Ok(())
}
