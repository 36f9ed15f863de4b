// Signal transform library
// Stateless clip -> clip transforms used to build variations

pub mod dynamics;
pub mod eq;
pub mod mix;
pub mod reverb;
pub mod stretch;

use thiserror::Error;

use crate::audio::ResampleError;
use crate::dsp::{FilterError, StftError};

pub use dynamics::{compress, db_to_linear, volume};
pub use eq::{peaking_filter, shelf_filter, ShelfKind, PEAKING_MIN_GAIN_DB};
pub use mix::add_noise;
pub use reverb::{reverb, REFLECTION_COUNT};
pub use stretch::{pitch_shift, time_stretch, PITCH_SHIFT_MIN_SEMITONES};

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("STFT error: {0}")]
    Stft(#[from] StftError),

    #[error("Resample error: {0}")]
    Resample(#[from] ResampleError),
}
