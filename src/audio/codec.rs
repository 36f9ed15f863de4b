// Codec seam between the augmentation core and audio files on disk
// The core only ever sees decoded mono clips at the processing rate

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use thiserror::Error;

use crate::audio::clip::{AudioClip, SAMPLE_RATE};
use crate::audio::ingest::{ingest_wav_file, AudioError};
use crate::audio::resample::{resample, ResampleError};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to decode audio: {0}")]
    Decode(#[from] AudioError),

    #[error("Failed to write WAV file: {0}")]
    Encode(#[from] hound::Error),

    #[error("Failed to resample audio: {0}")]
    Resample(#[from] ResampleError),

    #[error("No decoder for '{0}' files")]
    UnsupportedExtension(String),
}

/// Loads sources and writes variations
///
/// Implementations must be shareable across worker threads.
pub trait AudioCodec: Send + Sync {
    /// Decode a file into a mono clip at the processing rate
    fn load(&self, path: &Path) -> Result<AudioClip, CodecError>;

    /// Encode a clip to `path`
    fn write(&self, path: &Path, clip: &AudioClip) -> Result<(), CodecError>;

    /// File extension used for generated variations
    fn output_extension(&self) -> &'static str {
        "wav"
    }
}

/// WAV codec backed by hound
///
/// Reads any PCM/float WAV, downmixes to mono and resamples to
/// [`SAMPLE_RATE`]. Writes 32-bit float mono WAV.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec;

impl AudioCodec for WavCodec {
    fn load(&self, path: &Path) -> Result<AudioClip, CodecError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if extension != "wav" {
            return Err(CodecError::UnsupportedExtension(extension));
        }

        let data = ingest_wav_file(path)?;
        let mono = data.to_mono();
        let samples = if data.sample_rate == SAMPLE_RATE {
            mono
        } else {
            resample(&mono, SAMPLE_RATE as f64 / data.sample_rate as f64)?
        };

        Ok(AudioClip::new(samples))
    }

    fn write(&self, path: &Path, clip: &AudioClip) -> Result<(), CodecError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: clip.sample_rate(),
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let mut writer = WavWriter::create(path, spec)?;
        for &sample in clip.samples() {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }
}
