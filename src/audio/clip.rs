// Mono audio clip at the fixed processing rate
// Every transform consumes a clip by reference and returns a new one

use serde::{Deserialize, Serialize};

/// Processing sample rate for every clip in the pipeline (Hz)
pub const SAMPLE_RATE: u32 = 22050;

/// An immutable mono signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioClip {
    /// Wrap samples recorded at the standard processing rate
    pub fn new(samples: Vec<f32>) -> Self {
        Self::with_rate(samples, SAMPLE_RATE)
    }

    pub fn with_rate(samples: Vec<f32>, sample_rate: u32) -> Self {
        AudioClip {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds (sample count / rate)
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Build a new clip at the same rate from processed samples
    pub fn derive(&self, samples: Vec<f32>) -> Self {
        AudioClip::with_rate(samples, self.sample_rate)
    }

    /// Peak absolute amplitude
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Mean signal power (mean of squared samples)
    pub fn power(&self) -> f64 {
        mean_power(&self.samples)
    }
}

/// Mean of squared samples, zero for an empty slice
pub fn mean_power(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>() / samples.len() as f64
}
