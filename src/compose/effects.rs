// Effect catalogue of the variation composer
// Parameter sampling from the config and application of resolved parameters

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::audio::AudioClip;
use crate::config::{AugmentationConfig, BandShape, EffectProbabilities, EqBand};
use crate::noise::NoiseType;
use crate::transforms::{
    self, ShelfKind, TransformError, PEAKING_MIN_GAIN_DB,
};

/// The effects the composer knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    TimeStretch,
    Volume,
    Equalizer,
    Noise,
    Reverb,
    PitchShift,
    Compression,
}

impl EffectKind {
    /// Default evaluation order of the chain
    pub const CHAIN_ORDER: [EffectKind; 7] = [
        EffectKind::TimeStretch,
        EffectKind::Volume,
        EffectKind::Equalizer,
        EffectKind::Noise,
        EffectKind::Reverb,
        EffectKind::PitchShift,
        EffectKind::Compression,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::TimeStretch => "time_stretch",
            EffectKind::Volume => "volume",
            EffectKind::Equalizer => "equalizer",
            EffectKind::Noise => "noise",
            EffectKind::Reverb => "reverb",
            EffectKind::PitchShift => "pitch_shift",
            EffectKind::Compression => "compression",
        }
    }

    pub fn probability(&self, probabilities: &EffectProbabilities) -> f64 {
        match self {
            EffectKind::TimeStretch => probabilities.time_stretch,
            EffectKind::Volume => probabilities.volume,
            EffectKind::Equalizer => probabilities.equalizer,
            EffectKind::Noise => probabilities.noise,
            EffectKind::Reverb => probabilities.reverb,
            EffectKind::PitchShift => probabilities.pitch_shift,
            EffectKind::Compression => probabilities.compression,
        }
    }

    /// Draw this effect's parameters uniformly from the configured ranges
    pub fn sample<R: Rng + ?Sized>(
        &self,
        config: &AugmentationConfig,
        rng: &mut R,
    ) -> AppliedEffect {
        match self {
            EffectKind::TimeStretch => AppliedEffect::TimeStretch {
                rate: config.time_stretch.rate.sample(rng),
            },
            EffectKind::Volume => AppliedEffect::Volume {
                db: config.volume.db.sample(rng),
            },
            EffectKind::Equalizer => AppliedEffect::Equalizer {
                bands: config
                    .equalizer
                    .bands
                    .iter()
                    .map(|band| BandGain::sample(band, rng))
                    .collect(),
            },
            EffectKind::Noise => {
                let noise_type =
                    NoiseType::choose(&config.noise.types, rng).unwrap_or(NoiseType::Pink);
                AppliedEffect::Noise {
                    noise_type,
                    level_db: config.noise.level_db.sample(rng),
                }
            }
            EffectKind::Reverb => AppliedEffect::Reverb {
                room_size: config.reverb.room_size.sample(rng),
                decay_secs: config.reverb.decay_secs.sample(rng),
            },
            EffectKind::PitchShift => AppliedEffect::PitchShift {
                semitones: config.pitch_shift.semitones.sample(rng),
            },
            EffectKind::Compression => AppliedEffect::Compression {
                ratio: config.compression.ratio.sample(rng),
                threshold_db: config.compression.threshold_db.sample(rng),
            },
        }
    }
}

/// Resolved gain of one EQ band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandGain {
    pub band: String,
    pub shape: BandShape,
    pub freq_hz: f32,
    pub q: f32,
    pub gain_db: f32,
    /// False when the gain was too small to be worth filtering
    pub applied: bool,
}

impl BandGain {
    fn sample<R: Rng + ?Sized>(band: &EqBand, rng: &mut R) -> Self {
        let gain_db = band.gain_db.sample(rng);
        BandGain {
            band: band.name.clone(),
            shape: band.shape,
            freq_hz: band.freq_hz,
            q: band.q,
            gain_db,
            applied: gain_db.abs() > PEAKING_MIN_GAIN_DB,
        }
    }

    fn apply(&self, clip: &AudioClip) -> Result<AudioClip, TransformError> {
        if !self.applied {
            return Ok(clip.clone());
        }
        match self.shape {
            BandShape::LowShelf => {
                transforms::shelf_filter(clip, self.freq_hz, self.gain_db, ShelfKind::Low)
            }
            BandShape::HighShelf => {
                transforms::shelf_filter(clip, self.freq_hz, self.gain_db, ShelfKind::High)
            }
            BandShape::Peaking => {
                transforms::peaking_filter(clip, self.freq_hz, self.gain_db, self.q)
            }
        }
    }
}

/// One effect with its resolved parameters, as recorded in provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum AppliedEffect {
    TimeStretch { rate: f32 },
    Volume { db: f32 },
    Equalizer { bands: Vec<BandGain> },
    Noise { noise_type: NoiseType, level_db: f32 },
    Reverb { room_size: f32, decay_secs: f32 },
    PitchShift { semitones: f32 },
    Compression { ratio: f32, threshold_db: f32 },
}

impl AppliedEffect {
    pub fn kind(&self) -> EffectKind {
        match self {
            AppliedEffect::TimeStretch { .. } => EffectKind::TimeStretch,
            AppliedEffect::Volume { .. } => EffectKind::Volume,
            AppliedEffect::Equalizer { .. } => EffectKind::Equalizer,
            AppliedEffect::Noise { .. } => EffectKind::Noise,
            AppliedEffect::Reverb { .. } => EffectKind::Reverb,
            AppliedEffect::PitchShift { .. } => EffectKind::PitchShift,
            AppliedEffect::Compression { .. } => EffectKind::Compression,
        }
    }

    /// Apply to `clip`
    ///
    /// Noise and reverb draw further randomness (noise samples, tap delays)
    /// from `rng`. EQ bands are applied in order; the first failing band
    /// fails the whole effect.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        clip: &AudioClip,
        rng: &mut R,
    ) -> Result<AudioClip, TransformError> {
        match self {
            AppliedEffect::TimeStretch { rate } => transforms::time_stretch(clip, *rate),
            AppliedEffect::Volume { db } => Ok(transforms::volume(clip, *db)),
            AppliedEffect::Equalizer { bands } => {
                let mut current = clip.clone();
                for band in bands {
                    current = band.apply(&current)?;
                }
                Ok(current)
            }
            AppliedEffect::Noise {
                noise_type,
                level_db,
            } => Ok(transforms::add_noise(clip, *level_db, *noise_type, rng)),
            AppliedEffect::Reverb {
                room_size,
                decay_secs,
            } => Ok(transforms::reverb(clip, *room_size, *decay_secs, rng)),
            AppliedEffect::PitchShift { semitones } => Ok(transforms::pitch_shift(clip, *semitones)),
            AppliedEffect::Compression {
                ratio,
                threshold_db,
            } => Ok(transforms::compress(clip, *ratio, *threshold_db)),
        }
    }

    /// Short human-readable form, e.g. `stretch_1.07`
    pub fn label(&self) -> String {
        match self {
            AppliedEffect::TimeStretch { rate } => format!("stretch_{:.2}", rate),
            AppliedEffect::Volume { db } => format!("vol_{:+.1}dB", db),
            AppliedEffect::Equalizer { bands } => {
                let active = bands.iter().filter(|b| b.applied).count();
                format!("eq_{}band", active)
            }
            AppliedEffect::Noise {
                noise_type,
                level_db,
            } => format!("noise_{}_{:.0}dB", noise_type.as_str(), level_db),
            AppliedEffect::Reverb {
                room_size,
                decay_secs,
            } => format!("reverb_{:.2}_{:.2}s", room_size, decay_secs),
            AppliedEffect::PitchShift { semitones } => format!("pitch_{:+.2}st", semitones),
            AppliedEffect::Compression {
                ratio,
                threshold_db,
            } => format!("comp_{:.1}:1_{:.0}dB", ratio, threshold_db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tone() -> AudioClip {
        AudioClip::new(
            (0..6000)
                .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 300.0 * i as f32 / 22050.0).sin())
                .collect(),
        )
    }

    #[test]
    fn test_sampled_parameters_stay_in_range() {
        let config = AugmentationConfig::default();
        let mut rng = StdRng::seed_from_u64(21);

        for _ in 0..200 {
            for kind in EffectKind::CHAIN_ORDER {
                let effect = kind.sample(&config, &mut rng);
                assert_eq!(effect.kind(), kind);
                match effect {
                    AppliedEffect::TimeStretch { rate } => {
                        assert!(config.time_stretch.rate.contains(rate))
                    }
                    AppliedEffect::Volume { db } => assert!(config.volume.db.contains(db)),
                    AppliedEffect::Equalizer { bands } => {
                        assert_eq!(bands.len(), config.equalizer.bands.len());
                        for (gain, band) in bands.iter().zip(&config.equalizer.bands) {
                            assert!(band.gain_db.contains(gain.gain_db));
                            assert_eq!(gain.applied, gain.gain_db.abs() > 0.5);
                        }
                    }
                    AppliedEffect::Noise { level_db, .. } => {
                        assert!(config.noise.level_db.contains(level_db))
                    }
                    AppliedEffect::Reverb {
                        room_size,
                        decay_secs,
                    } => {
                        assert!(config.reverb.room_size.contains(room_size));
                        assert!(config.reverb.decay_secs.contains(decay_secs));
                    }
                    AppliedEffect::PitchShift { semitones } => {
                        assert!(config.pitch_shift.semitones.contains(semitones))
                    }
                    AppliedEffect::Compression {
                        ratio,
                        threshold_db,
                    } => {
                        assert!(config.compression.ratio.contains(ratio));
                        assert!(config.compression.threshold_db.contains(threshold_db));
                    }
                }
            }
        }
    }

    #[test]
    fn test_eq_with_no_active_band_is_identity() {
        let clip = tone();
        let effect = AppliedEffect::Equalizer {
            bands: vec![BandGain {
                band: "mid_boost".to_string(),
                shape: BandShape::Peaking,
                freq_hz: 800.0,
                q: 1.0,
                gain_db: 0.2,
                applied: false,
            }],
        };
        let out = effect.apply(&clip, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(out, clip);
    }

    #[test]
    fn test_eq_on_tiny_clip_fails() {
        let clip = AudioClip::new(vec![0.1; 4]);
        let effect = AppliedEffect::Equalizer {
            bands: vec![BandGain {
                band: "low_shelf".to_string(),
                shape: BandShape::LowShelf,
                freq_hz: 200.0,
                q: 1.0,
                gain_db: 3.0,
                applied: true,
            }],
        };
        assert!(effect.apply(&clip, &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn test_time_stretch_effect_changes_length() {
        let clip = tone();
        let effect = AppliedEffect::TimeStretch { rate: 1.25 };
        let out = effect.apply(&clip, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(out.len(), 4800);
    }

    #[test]
    fn test_provenance_serialization() {
        let effect = AppliedEffect::Noise {
            noise_type: NoiseType::TapeHiss,
            level_db: -30.0,
        };
        let json = serde_json::to_value(&effect).unwrap();
        assert_eq!(json["effect"], "noise");
        assert_eq!(json["noise_type"], "tape_hiss");

        let parsed: AppliedEffect = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, effect);
    }

    #[test]
    fn test_labels() {
        assert_eq!(AppliedEffect::TimeStretch { rate: 1.07 }.label(), "stretch_1.07");
        assert_eq!(AppliedEffect::Volume { db: 3.0 }.label(), "vol_+3.0dB");
        assert_eq!(
            AppliedEffect::PitchShift { semitones: -0.25 }.label(),
            "pitch_-0.25st"
        );
    }
}
