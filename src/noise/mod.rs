//! Noise synthesizer
//!
//! Five background textures generated from Gaussian white noise. Every
//! generator returns exactly the requested number of samples and draws
//! only from the random source it is handed.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::dsp::{filtfilt, Iir};

/// 1/f approximation applied to white noise for pink noise
const PINK_B: [f64; 4] = [0.049922035, -0.095993537, 0.050612699, -0.004408786];
const PINK_A: [f64; 4] = [1.0, -2.494956002, 2.017265875, -0.522189400];

/// Mains hum partials of the room tone: (frequency Hz, amplitude)
const ROOM_HUM: [(f32, f32); 3] = [(60.0, 0.02), (120.0, 0.01), (300.0, 0.005)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseType {
    Pink,
    Brown,
    RoomTone,
    VinylNoise,
    TapeHiss,
}

impl NoiseType {
    pub const ALL: [NoiseType; 5] = [
        NoiseType::Pink,
        NoiseType::Brown,
        NoiseType::RoomTone,
        NoiseType::VinylNoise,
        NoiseType::TapeHiss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseType::Pink => "pink",
            NoiseType::Brown => "brown",
            NoiseType::RoomTone => "room_tone",
            NoiseType::VinylNoise => "vinyl_noise",
            NoiseType::TapeHiss => "tape_hiss",
        }
    }

    /// Uniform pick among `choices`; `None` when empty
    pub fn choose<R: Rng + ?Sized>(choices: &[NoiseType], rng: &mut R) -> Option<NoiseType> {
        if choices.is_empty() {
            return None;
        }
        Some(choices[rng.random_range(0..choices.len())])
    }
}

/// Generate `len` samples of the given texture
pub fn generate<R: Rng + ?Sized>(
    noise_type: NoiseType,
    len: usize,
    sample_rate: u32,
    rng: &mut R,
) -> Vec<f32> {
    match noise_type {
        NoiseType::Pink => pink(len, rng),
        NoiseType::Brown => brown(len, rng),
        NoiseType::RoomTone => room_tone(len, sample_rate, rng),
        NoiseType::VinylNoise => vinyl(len, sample_rate, rng),
        NoiseType::TapeHiss => tape_hiss(len, sample_rate, rng),
    }
}

/// Standard normal white noise
pub fn white<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<f32> {
    (0..len).map(|_| rng.sample::<f32, _>(StandardNormal)).collect()
}

/// Population standard deviation
fn std_dev(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n;
    let variance = samples
        .iter()
        .map(|&s| (s as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    variance.sqrt()
}

fn scaled(samples: Vec<f32>, factor: f32) -> Vec<f32> {
    samples.into_iter().map(|s| s * factor).collect()
}

/// Pink (1/f) noise normalized to unit standard deviation
///
/// Falls back to white noise at 0.1 amplitude when the filter cannot run
/// (signal shorter than its edge padding) or produces a degenerate result.
pub fn pink<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<f32> {
    let white_noise = white(len, rng);

    let filtered = Iir::new(&PINK_B, &PINK_A).and_then(|f| filtfilt(&f, &white_noise));
    match filtered {
        Ok(pink) => {
            let sd = std_dev(&pink);
            if sd > 0.0 && sd.is_finite() {
                scaled(pink, (1.0 / sd) as f32)
            } else {
                scaled(white_noise, 0.1)
            }
        }
        Err(e) => {
            log::debug!("Pink filter unavailable for {} samples: {}", len, e);
            scaled(white_noise, 0.1)
        }
    }
}

/// Brown (1/f^2) noise: integrated white noise at 0.1 standard deviation
pub fn brown<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<f32> {
    let mut sum = 0.0f64;
    let walk: Vec<f32> = white(len, rng)
        .into_iter()
        .map(|s| {
            sum += s as f64;
            sum as f32
        })
        .collect();

    let sd = std_dev(&walk);
    if sd > 0.0 && sd.is_finite() {
        scaled(walk, (0.1 / sd) as f32)
    } else {
        vec![0.0; len]
    }
}

/// Low-level pink noise plus 60/120/300 Hz hum
pub fn room_tone<R: Rng + ?Sized>(len: usize, sample_rate: u32, rng: &mut R) -> Vec<f32> {
    let base = pink(len, rng);
    base.into_iter()
        .enumerate()
        .map(|(i, noise)| {
            let t = i as f32 / sample_rate as f32;
            let hum: f32 = ROOM_HUM
                .iter()
                .map(|&(freq, amp)| amp * (2.0 * PI * freq * t).sin())
                .sum();
            noise * 0.05 + hum
        })
        .collect()
}

/// Quiet white noise high-passed at 1 kHz (record surface noise)
pub fn vinyl<R: Rng + ?Sized>(len: usize, sample_rate: u32, rng: &mut R) -> Vec<f32> {
    let noise = scaled(white(len, rng), 0.02);
    match Iir::butter_highpass(1000.0, sample_rate).and_then(|f| filtfilt(&f, &noise)) {
        Ok(filtered) => filtered,
        Err(e) => {
            log::debug!("Vinyl filter unavailable for {} samples: {}", len, e);
            noise
        }
    }
}

/// Quiet white noise band-passed to 2-8 kHz
pub fn tape_hiss<R: Rng + ?Sized>(len: usize, sample_rate: u32, rng: &mut R) -> Vec<f32> {
    let noise = scaled(white(len, rng), 0.03);
    let filtered = Iir::butter_bandpass(2000.0, 8000.0, sample_rate)
        .and_then(|band| filtfilt(&band, &noise));
    match filtered {
        Ok(filtered) => filtered,
        Err(e) => {
            log::debug!("Tape hiss filter unavailable for {} samples: {}", len, e);
            noise
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const RATE: u32 = 22050;

    #[test]
    fn test_every_generator_returns_requested_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for noise_type in NoiseType::ALL {
            for len in [0, 1, 5, 12, 13, 1000, 22050] {
                let noise = generate(noise_type, len, RATE, &mut rng);
                assert_eq!(noise.len(), len, "{:?} with {} samples", noise_type, len);
                assert!(noise.iter().all(|s| s.is_finite()));
            }
        }
    }

    #[test]
    fn test_pink_unit_deviation() {
        let mut rng = StdRng::seed_from_u64(1);
        let noise = pink(20000, &mut rng);
        assert!((std_dev(&noise) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_pink_short_fallback() {
        let mut rng = StdRng::seed_from_u64(1);
        let noise = pink(8, &mut rng);

        let mut rng = StdRng::seed_from_u64(1);
        let expected = scaled(white(8, &mut rng), 0.1);
        assert_eq!(noise, expected);
    }

    #[test]
    fn test_brown_deviation() {
        let mut rng = StdRng::seed_from_u64(3);
        let noise = brown(5000, &mut rng);
        assert!((std_dev(&noise) - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_room_tone_contains_hum() {
        let mut rng = StdRng::seed_from_u64(4);
        let tone = room_tone(22050, RATE, &mut rng);

        // Correlate against the 60 Hz partial
        let correlation: f32 = tone
            .iter()
            .enumerate()
            .map(|(i, s)| s * (2.0 * PI * 60.0 * i as f32 / RATE as f32).sin())
            .sum::<f32>()
            / tone.len() as f32;
        assert!((correlation - 0.01).abs() < 0.008, "correlation {}", correlation);
    }

    #[test]
    fn test_vinyl_and_hiss_are_quiet() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(std_dev(&vinyl(10000, RATE, &mut rng)) < 0.025);
        assert!(std_dev(&tape_hiss(10000, RATE, &mut rng)) < 0.03);
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate(NoiseType::TapeHiss, 512, RATE, &mut StdRng::seed_from_u64(9));
        let b = generate(NoiseType::TapeHiss, 512, RATE, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_choose() {
        let mut rng = StdRng::seed_from_u64(11);
        assert_eq!(NoiseType::choose(&[], &mut rng), None);
        assert_eq!(
            NoiseType::choose(&[NoiseType::Brown], &mut rng),
            Some(NoiseType::Brown)
        );

        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(NoiseType::choose(&NoiseType::ALL, &mut rng).unwrap());
        }
        assert_eq!(seen.len(), 5);
    }
}
