// Pitch-preserving time stretch and duration-preserving pitch shift

use crate::audio::{resample, AudioClip};
use crate::dsp::phase_vocoder_stretch;
use crate::transforms::TransformError;

/// Pitch shifts smaller than this (in semitones) are inaudible and skipped
pub const PITCH_SHIFT_MIN_SEMITONES: f32 = 0.1;

/// Change duration by `1 / rate` while keeping pitch
///
/// `rate < 1` lengthens the clip, `rate > 1` shortens it.
pub fn time_stretch(clip: &AudioClip, rate: f32) -> Result<AudioClip, TransformError> {
    let stretched = phase_vocoder_stretch(clip.samples(), rate as f64)?;
    Ok(clip.derive(stretched))
}

/// Shift pitch by `semitones` while keeping the clip length
///
/// Never fails: shifts below [`PITCH_SHIFT_MIN_SEMITONES`] and any internal
/// failure return the input unchanged.
pub fn pitch_shift(clip: &AudioClip, semitones: f32) -> AudioClip {
    if semitones.abs() < PITCH_SHIFT_MIN_SEMITONES {
        return clip.clone();
    }

    match try_pitch_shift(clip, semitones) {
        Ok(shifted) => shifted,
        Err(e) => {
            log::warn!("Pitch shift by {:.2} semitones failed: {}", semitones, e);
            clip.clone()
        }
    }
}

fn try_pitch_shift(clip: &AudioClip, semitones: f32) -> Result<AudioClip, TransformError> {
    let rate = 2f64.powf(-semitones as f64 / 12.0);

    // Stretch to len / rate, then resample back by rate: pitch moves by 1 / rate
    let stretched = phase_vocoder_stretch(clip.samples(), rate)?;
    let mut shifted = resample(&stretched, rate)?;
    shifted.resize(clip.len(), 0.0);

    Ok(clip.derive(shifted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone(freq: f32, len: usize) -> AudioClip {
        AudioClip::new(
            (0..len)
                .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / 22050.0).sin())
                .collect(),
        )
    }

    fn crossing_frequency(clip: &AudioClip) -> f32 {
        let s = clip.samples();
        let interior = &s[s.len() / 4..3 * s.len() / 4];
        let crossings = interior
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count();
        crossings as f32 * 22050.0 / (2.0 * interior.len() as f32)
    }

    #[test]
    fn test_time_stretch_unit_rate_round_trip() {
        let clip = tone(220.0, 10000);
        let out = time_stretch(&clip, 1.0).unwrap();

        assert_eq!(out.len(), clip.len());
        assert!((out.duration_secs() - clip.duration_secs()).abs() < 1e-9);
        for (a, b) in clip.samples().iter().zip(out.samples()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_time_stretch_duration() {
        let clip = tone(220.0, 22050);
        assert_eq!(time_stretch(&clip, 0.75).unwrap().len(), 29400);
        assert_eq!(time_stretch(&clip, 1.25).unwrap().len(), 17640);
        assert!(time_stretch(&clip, -1.0).is_err());
    }

    #[test]
    fn test_pitch_shift_below_threshold_is_identity() {
        let clip = tone(440.0, 4000);
        assert_eq!(pitch_shift(&clip, 0.05), clip);
        assert_eq!(pitch_shift(&clip, -0.09), clip);
    }

    #[test]
    fn test_pitch_shift_keeps_length_and_moves_pitch() {
        let clip = tone(440.0, 22050);

        let up = pitch_shift(&clip, 0.5);
        assert_eq!(up.len(), clip.len());
        let expected = 440.0 * 2f32.powf(0.5 / 12.0);
        let measured = crossing_frequency(&up);
        assert!((measured - expected).abs() < 6.0, "measured {}", measured);

        let down = pitch_shift(&clip, -0.5);
        assert_eq!(down.len(), clip.len());
        assert!(crossing_frequency(&down) < 440.0);
    }

    #[test]
    fn test_pitch_shift_empty_clip() {
        let clip = AudioClip::new(vec![]);
        assert!(pitch_shift(&clip, 0.4).is_empty());
    }
}
