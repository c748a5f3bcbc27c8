//! WAV file read/write for temp files and the built-in decoder.

use std::path::Path;

use crate::errors::{AlignError, AlignResult};

use super::AudioBuffer;

/// Read a mono WAV file into an [`AudioBuffer`].
///
/// Integer samples (8/16/24/32 bit) are normalized to `[-1, 1]`; float
/// samples are taken as-is. Multi-channel files are rejected.
pub fn read_wav(path: &Path) -> AlignResult<AudioBuffer> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| AlignError::decode_failed(format!("cannot open '{}': {e}", path.display())))?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(AlignError::invalid_audio(format!(
            "expected mono audio, got {} channels in '{}'",
            spec.channels,
            path.display()
        )));
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AlignError::decode_failed(format!("bad sample data: {e}")))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| AlignError::decode_failed(format!("bad sample data: {e}")))?
        }
    };

    Ok(AudioBuffer::new(samples, spec.sample_rate))
}

/// Write an [`AudioBuffer`] as a 32-bit float mono WAV file.
pub fn write_wav(path: &Path, audio: &AudioBuffer) -> AlignResult<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| {
        AlignError::io_error(
            format!("creating WAV '{}'", path.display()),
            std::io::Error::other(e),
        )
    })?;

    for &sample in &audio.samples {
        writer.write_sample(sample).map_err(|e| {
            AlignError::io_error("writing WAV samples", std::io::Error::other(e))
        })?;
    }

    writer
        .finalize()
        .map_err(|e| AlignError::io_error("finalizing WAV", std::io::Error::other(e)))
}
