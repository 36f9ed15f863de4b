//! Sample rate conversion using rubato
//!
//! Sinc interpolation with an arbitrary (non-integer) ratio, used by the
//! loader to bring sources to the processing rate and by pitch shifting.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use thiserror::Error;

const CHUNK_SIZE: usize = 1024;

#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("Invalid resample ratio: {0}")]
    InvalidRatio(f64),

    #[error("Failed to build resampler: {0}")]
    Construction(String),

    #[error("Resampling failed: {0}")]
    Process(String),
}

impl From<rubato::ResamplerConstructionError> for ResampleError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        ResampleError::Construction(e.to_string())
    }
}

impl From<rubato::ResampleError> for ResampleError {
    fn from(e: rubato::ResampleError) -> Self {
        ResampleError::Process(e.to_string())
    }
}

fn interpolation_parameters() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    }
}

/// Resample a mono signal by `ratio` (output rate / input rate)
///
/// The output holds exactly `round(len * ratio)` samples with the filter
/// delay removed.
pub fn resample(input: &[f32], ratio: f64) -> Result<Vec<f32>, ResampleError> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(ResampleError::InvalidRatio(ratio));
    }
    if input.is_empty() || (ratio - 1.0).abs() < 1e-12 {
        return Ok(input.to_vec());
    }

    let expected = (input.len() as f64 * ratio).round() as usize;
    let mut resampler =
        SincFixedIn::<f32>::new(ratio, 1.0, interpolation_parameters(), CHUNK_SIZE, 1)?;
    let delay = resampler.output_delay();

    let mut output = Vec::with_capacity(expected + delay + CHUNK_SIZE);
    let mut pos = 0;

    while input.len() - pos >= resampler.input_frames_next() {
        let needed = resampler.input_frames_next();
        let block: [&[f32]; 1] = [&input[pos..pos + needed]];
        let processed = resampler.process(&block[..], None)?;
        output.extend_from_slice(&processed[0]);
        pos += needed;
    }

    if pos < input.len() {
        let block: [&[f32]; 1] = [&input[pos..]];
        let processed = resampler.process_partial(Some(&block[..]), None)?;
        output.extend_from_slice(&processed[0]);
    }

    // Flush the interpolation delay line
    while output.len() < expected + delay {
        let processed = resampler.process_partial::<&[f32]>(None, None)?;
        if processed[0].is_empty() {
            break;
        }
        output.extend_from_slice(&processed[0]);
    }

    let mut output: Vec<f32> = output.into_iter().skip(delay).take(expected).collect();
    output.resize(expected, 0.0);
    Ok(output)
}
