// Gain and dynamic range compression

use crate::audio::AudioClip;

/// Decibels to linear amplitude
pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Scale every sample by `db` decibels
///
/// Peaks may exceed unity; clip prevention happens after composition.
pub fn volume(clip: &AudioClip, db: f32) -> AudioClip {
    let gain = db_to_linear(db);
    clip.derive(clip.samples().iter().map(|s| s * gain).collect())
}

/// Reduce the part of each sample above `threshold_db` by `ratio`
///
/// Samples at or below the threshold pass through untouched and the sign
/// of every sample is kept.
pub fn compress(clip: &AudioClip, ratio: f32, threshold_db: f32) -> AudioClip {
    let threshold = db_to_linear(threshold_db);
    let samples = clip
        .samples()
        .iter()
        .map(|&s| {
            let magnitude = s.abs();
            if magnitude > threshold {
                s.signum() * (threshold + (magnitude - threshold) / ratio)
            } else {
                s
            }
        })
        .collect();
    clip.derive(samples)
}
