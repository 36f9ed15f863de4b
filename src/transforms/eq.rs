//! Shelf and peaking EQ
//!
//! Both are approximations: a Butterworth low/high/band-pass result is
//! blended with the dry signal instead of designing a true shelving or
//! parametric section. The resulting artifacts are part of the expected
//! output and are kept as is.

use serde::{Deserialize, Serialize};

use crate::audio::AudioClip;
use crate::dsp::{filtfilt, Iir};
use crate::transforms::dynamics::db_to_linear;
use crate::transforms::TransformError;

/// Peaking gains smaller than this (in dB) are skipped
pub const PEAKING_MIN_GAIN_DB: f32 = 0.5;

/// Band edges of the peaking filter are clamped to this fraction of Nyquist
const EDGE_MIN: f64 = 0.01;
const EDGE_MAX: f64 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShelfKind {
    Low,
    High,
}

/// Shelf approximation: `x + (lp_or_hp(x) - x) * (gain - 1)`
///
/// The filter passband tracks the dry signal; the stopband is scaled by
/// `2 - gain`.
pub fn shelf_filter(
    clip: &AudioClip,
    freq_hz: f32,
    gain_db: f32,
    kind: ShelfKind,
) -> Result<AudioClip, TransformError> {
    let filter = match kind {
        ShelfKind::Low => Iir::butter_lowpass(freq_hz as f64, clip.sample_rate())?,
        ShelfKind::High => Iir::butter_highpass(freq_hz as f64, clip.sample_rate())?,
    };
    let filtered = filtfilt(&filter, clip.samples())?;

    let blend = db_to_linear(gain_db) - 1.0;
    let samples = clip
        .samples()
        .iter()
        .zip(filtered.iter())
        .map(|(&dry, &wet)| dry + (wet - dry) * blend)
        .collect();

    Ok(clip.derive(samples))
}

/// Band boost/cut around `freq_hz`: `x + bp(x) * (gain - 1)`
///
/// The band spans `freq / (2q)` to `freq * 2q`. Returns the input unchanged
/// when `|gain_db|` is below [`PEAKING_MIN_GAIN_DB`] or the clamped edges
/// collapse.
pub fn peaking_filter(
    clip: &AudioClip,
    freq_hz: f32,
    gain_db: f32,
    q: f32,
) -> Result<AudioClip, TransformError> {
    if gain_db.abs() < PEAKING_MIN_GAIN_DB {
        return Ok(clip.clone());
    }

    let nyquist = clip.sample_rate() as f64 / 2.0;
    let q = q as f64;
    let low_norm = (freq_hz as f64 / (2.0 * q) / nyquist).clamp(EDGE_MIN, EDGE_MAX);
    let high_norm = (freq_hz as f64 * (2.0 * q) / nyquist).clamp(EDGE_MIN, EDGE_MAX);
    if low_norm >= high_norm {
        return Ok(clip.clone());
    }

    let band = Iir::butter_bandpass(low_norm * nyquist, high_norm * nyquist, clip.sample_rate())?;
    let filtered = filtfilt(&band, clip.samples())?;

    let blend = db_to_linear(gain_db) - 1.0;
    let samples = clip
        .samples()
        .iter()
        .zip(filtered.iter())
        .map(|(&dry, &band)| dry + band * blend)
        .collect();

    Ok(clip.derive(samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone(freq: f32) -> AudioClip {
        AudioClip::new(
            (0..4000)
                .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / 22050.0).sin())
                .collect(),
        )
    }

    fn interior_rms(clip: &AudioClip) -> f32 {
        let s = &clip.samples()[500..3500];
        (s.iter().map(|x| x * x).sum::<f32>() / s.len() as f32).sqrt()
    }

    #[test]
    fn test_peaking_below_threshold_is_identity() {
        let clip = tone(800.0);
        let out = peaking_filter(&clip, 800.0, 0.3, 1.0).unwrap();
        assert_eq!(out, clip);

        let out = peaking_filter(&clip, 800.0, -0.49, 1.0).unwrap();
        assert_eq!(out, clip);
    }

    #[test]
    fn test_peaking_boosts_centre() {
        let clip = tone(800.0);
        let boosted = peaking_filter(&clip, 800.0, 3.0, 1.0).unwrap();
        let cut = peaking_filter(&clip, 800.0, -3.0, 1.0).unwrap();

        assert!(interior_rms(&boosted) > interior_rms(&clip) * 1.2);
        assert!(interior_rms(&cut) < interior_rms(&clip) * 0.85);
    }

    #[test]
    fn test_peaking_centre_gain_matches_request() {
        let clip = tone(800.0);
        for gain_db in [3.0, -3.0, 1.5] {
            let out = peaking_filter(&clip, 800.0, gain_db, 1.0).unwrap();
            let ratio = interior_rms(&out) / interior_rms(&clip);
            assert!(
                (ratio - db_to_linear(gain_db)).abs() < 0.01,
                "{} dB gave ratio {}",
                gain_db,
                ratio
            );
        }
    }

    #[test]
    fn test_peaking_leaves_distant_band() {
        let clip = tone(60.0);
        let boosted = peaking_filter(&clip, 2500.0, 2.0, 2.0).unwrap();
        let ratio = interior_rms(&boosted) / interior_rms(&clip);
        assert!((ratio - 1.0).abs() < 0.02, "ratio {}", ratio);
    }

    #[test]
    fn test_low_shelf_blend() {
        let low = tone(60.0);
        let high = tone(6000.0);

        let low_out = shelf_filter(&low, 200.0, 4.0, ShelfKind::Low).unwrap();
        let high_out = shelf_filter(&high, 200.0, 4.0, ShelfKind::Low).unwrap();

        // Passband follows the dry signal, the stopband is scaled by (2 - gain)
        let expected_stop = 2.0 - db_to_linear(4.0);
        assert!((interior_rms(&low_out) / interior_rms(&low) - 1.0).abs() < 0.02);
        assert!((interior_rms(&high_out) / interior_rms(&high) - expected_stop).abs() < 0.02);
    }

    #[test]
    fn test_high_shelf_blend() {
        let high = tone(8000.0);
        let low = tone(500.0);

        let high_out = shelf_filter(&high, 4000.0, -4.0, ShelfKind::High).unwrap();
        let low_out = shelf_filter(&low, 4000.0, -4.0, ShelfKind::High).unwrap();

        let expected_stop = 2.0 - db_to_linear(-4.0);
        assert!((interior_rms(&high_out) / interior_rms(&high) - 1.0).abs() < 0.02);
        assert!((interior_rms(&low_out) / interior_rms(&low) - expected_stop).abs() < 0.02);
    }

    #[test]
    fn test_shelf_zero_gain_is_identity() {
        let clip = tone(440.0);
        let out = shelf_filter(&clip, 200.0, 0.0, ShelfKind::Low).unwrap();
        for (a, b) in clip.samples().iter().zip(out.samples()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_short_clip_reports_error() {
        let clip = AudioClip::new(vec![0.1; 5]);
        assert!(shelf_filter(&clip, 200.0, 3.0, ShelfKind::Low).is_err());
    }
}
