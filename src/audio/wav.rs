use std::io::Cursor;
use std::path::Path;

use tracing::info;

use crate::error::Result;

fn spec(sample_rate: u32, channels: u16) -> hound::WavSpec {
    hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Encode 16-bit PCM into an in-memory WAV container.
///
/// Used to package each chunk for upload without touching the filesystem.
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());

    let mut writer = hound::WavWriter::new(&mut cursor, spec(sample_rate, channels))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}

/// Write 16-bit PCM to a WAV file, creating parent directories as needed.
pub fn write_wav_file(
    path: &Path,
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = hound::WavWriter::create(path, spec(sample_rate, channels))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    info!(
        "Saved {:.1}s of audio to {}",
        samples.len() as f64 / (sample_rate as f64 * channels as f64),
        path.display()
    );

    Ok(())
}
