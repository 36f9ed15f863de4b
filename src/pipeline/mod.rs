// Augmentation pipeline
// Dataset -> category -> variation orchestration and provenance logging

pub mod category;
pub mod dataset;
pub mod error;
pub mod trace;

pub use category::{variations_per_source, CategoryProcessor, CategoryReport, CategoryStatus};
pub use dataset::{
    default_output_root, derive_seed, DatasetAugmenter, DatasetOptions, DatasetSummary,
    AUDIO_EXTENSIONS, DEFAULT_TARGET, PROVENANCE_DIR,
};
pub use error::PipelineError;
pub use trace::{file_sha256, read_trace_file, ProvenanceEntry, TraceError, TraceWriter};
