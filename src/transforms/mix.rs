// Background noise mixing

use rand::Rng;

use crate::audio::clip::mean_power;
use crate::audio::AudioClip;
use crate::noise::{self, NoiseType};
use crate::transforms::dynamics::db_to_linear;

/// Add noise at `level_db` relative to the signal power
///
/// The added noise satisfies `10 * log10(noise_power / signal_power) == level_db`,
/// so -30 means the noise carries a thousandth of the signal power. A silent
/// clip stays silent.
pub fn add_noise<R: Rng + ?Sized>(
    clip: &AudioClip,
    level_db: f32,
    noise_type: NoiseType,
    rng: &mut R,
) -> AudioClip {
    let noise = noise::generate(noise_type, clip.len(), clip.sample_rate(), rng);

    let signal_power = clip.power();
    let noise_power = mean_power(&noise);
    let scale = db_to_linear(level_db) as f64 * (signal_power / (noise_power + 1e-10)).sqrt();
    let scale = scale as f32;

    let samples = clip
        .samples()
        .iter()
        .zip(noise.iter())
        .map(|(&s, &n)| s + n * scale)
        .collect();
    clip.derive(samples)
}
