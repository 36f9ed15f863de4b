// Audio processing module
// Clip representation, WAV ingestion, resampling and the codec seam

pub mod clip;
pub mod codec;
pub mod ingest;
pub mod resample;

pub use clip::{AudioClip, SAMPLE_RATE};
pub use codec::{AudioCodec, CodecError, WavCodec};
pub use ingest::{ingest_wav, AudioData, AudioError};
pub use resample::{resample, ResampleError};
