// Signal processing primitives
// IIR filter design/application and STFT-based phase vocoding

pub mod filter;
pub mod stft;

pub use filter::{filtfilt, FilterError, Iir};
pub use stft::{phase_vocoder_stretch, StftError};
