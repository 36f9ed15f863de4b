//! Early-reflection reverb
//!
//! A handful of delayed, geometrically decaying copies of the dry signal.
//! Not a convolution reverb; the tail is cut at the original length.

use rand::Rng;

use crate::audio::AudioClip;

/// Number of delayed copies
pub const REFLECTION_COUNT: usize = 8;

/// Amplitude ratio between successive reflections
const REFLECTION_DECAY: f32 = 0.7;

/// Shortest reflection delay in seconds
const MIN_DELAY_SECS: f64 = 0.01;

/// Sum the dry signal with delayed copies
///
/// Delays are drawn uniformly from `(0.01, decay_secs)` seconds; reflection
/// `i` has amplitude `room_size * 0.7^i`. Delays that round to zero samples
/// or reach the decay length are skipped.
pub fn reverb<R: Rng + ?Sized>(
    clip: &AudioClip,
    room_size: f32,
    decay_secs: f32,
    rng: &mut R,
) -> AudioClip {
    let decay_secs = decay_secs as f64;
    if decay_secs <= MIN_DELAY_SECS {
        return clip.clone();
    }

    let rate = clip.sample_rate() as f64;
    let impulse_len = (decay_secs * rate) as usize;
    let dry = clip.samples();
    let mut wet = dry.to_vec();

    let mut amplitude = room_size;
    for _ in 0..REFLECTION_COUNT {
        let delay = (rng.random_range(MIN_DELAY_SECS..decay_secs) * rate) as usize;
        if delay > 0 && delay < impulse_len && delay < dry.len() {
            for (out, &src) in wet[delay..].iter_mut().zip(dry.iter()) {
                *out += src * amplitude;
            }
        }
        amplitude *= REFLECTION_DECAY;
    }

    clip.derive(wet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_keeps_length() {
        let clip = AudioClip::new(vec![0.3; 5000]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(reverb(&clip, 0.5, 1.5, &mut rng).len(), 5000);
    }

    #[test]
    fn test_impulse_reflections_decay() {
        let mut samples = vec![0.0; 44100];
        samples[0] = 1.0;
        let clip = AudioClip::new(samples);

        let mut rng = StdRng::seed_from_u64(5);
        let wet = reverb(&clip, 0.5, 1.0, &mut rng);

        assert_eq!(wet.samples()[0], 1.0);
        let taps: Vec<f32> = wet.samples()[1..]
            .iter()
            .copied()
            .filter(|s| *s != 0.0)
            .collect();
        assert!(!taps.is_empty());
        assert!(taps.len() <= REFLECTION_COUNT);

        // Reflections land inside the decay window with bounded amplitude
        let last_nonzero = wet.samples().iter().rposition(|s| *s != 0.0).unwrap();
        assert!(last_nonzero < 22050);
        let total: f32 = taps.iter().sum();
        let bound: f32 = (0..REFLECTION_COUNT as i32).map(|i| 0.5 * 0.7f32.powi(i)).sum();
        assert!(total <= bound + 1e-6);
    }

    #[test]
    fn test_zero_room_is_dry() {
        let clip = AudioClip::new((0..3000).map(|i| (i as f32 * 0.01).sin()).collect());
        let mut rng = StdRng::seed_from_u64(8);
        assert_eq!(reverb(&clip, 0.0, 0.5, &mut rng), clip);
    }

    #[test]
    fn test_degenerate_decay_is_dry() {
        let clip = AudioClip::new(vec![0.2; 100]);
        let mut rng = StdRng::seed_from_u64(8);
        assert_eq!(reverb(&clip, 0.8, 0.005, &mut rng), clip);
    }
}
