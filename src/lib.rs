// Drumcorpus - percussion dataset augmentation
// Module declarations

pub mod audio;
pub mod compose;
pub mod config;
pub mod dsp;
pub mod noise;
pub mod pipeline;
pub mod transforms;

pub use audio::{AudioClip, AudioCodec, WavCodec, SAMPLE_RATE};
pub use compose::{Variation, VariationComposer, VariationRecord};
pub use config::AugmentationConfig;
pub use pipeline::{DatasetAugmenter, DatasetOptions, DatasetSummary, PipelineError};
