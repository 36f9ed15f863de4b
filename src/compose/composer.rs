// Variation composer
// Bernoulli-gated effect chain applied to one source clip

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::audio::AudioClip;
use crate::compose::effects::{AppliedEffect, EffectKind};
use crate::config::{AugmentationConfig, ConfigError};

/// Peak amplitude above which a finished variation is rescaled
pub const PEAK_LIMIT: f32 = 0.95;

/// One link of the chain: an effect and its chance of being applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainStep {
    pub kind: EffectKind,
    pub probability: f64,
}

/// Ordered effects applied to produce one variation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariationRecord {
    pub effects: Vec<AppliedEffect>,
    /// True when the output was scaled down to [`PEAK_LIMIT`]
    pub peak_rescaled: bool,
}

impl VariationRecord {
    pub fn labels(&self) -> Vec<String> {
        self.effects.iter().map(|e| e.label()).collect()
    }

    pub fn summary(&self) -> String {
        if self.effects.is_empty() {
            return "clean".to_string();
        }
        self.labels().join(" -> ")
    }
}

#[derive(Debug, Clone)]
pub struct Variation {
    pub clip: AudioClip,
    pub record: VariationRecord,
}

/// Produces variations of a source clip
///
/// Holds only immutable configuration; all randomness comes from the
/// caller's random source so a seeded source reproduces a variation exactly.
#[derive(Debug, Clone)]
pub struct VariationComposer {
    config: AugmentationConfig,
    chain: Vec<ChainStep>,
}

impl VariationComposer {
    /// Chain in the standard order with probabilities from the config
    ///
    /// The config is validated, so configs built in code get the same
    /// checks as ones loaded from TOML.
    pub fn new(config: AugmentationConfig) -> Result<Self, ConfigError> {
        let chain = EffectKind::CHAIN_ORDER
            .iter()
            .map(|&kind| ChainStep {
                kind,
                probability: kind.probability(&config.probabilities),
            })
            .collect();
        Self::with_chain(config, chain)
    }

    pub fn with_chain(
        config: AugmentationConfig,
        chain: Vec<ChainStep>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        for step in &chain {
            if !(0.0..=1.0).contains(&step.probability) {
                return Err(ConfigError::InvalidProbability {
                    name: step.kind.as_str(),
                    value: step.probability,
                });
            }
        }
        Ok(VariationComposer { config, chain })
    }

    pub fn config(&self) -> &AugmentationConfig {
        &self.config
    }

    pub fn chain(&self) -> &[ChainStep] {
        &self.chain
    }

    /// Build one variation of `source`
    ///
    /// Each step is kept with its probability, its parameters are drawn and
    /// it is applied to the running output. A step that fails leaves the
    /// running output untouched and is left out of the record. The result
    /// never peaks above [`PEAK_LIMIT`].
    pub fn compose<R: Rng + ?Sized>(&self, source: &AudioClip, rng: &mut R) -> Variation {
        let mut current = source.clone();
        let mut record = VariationRecord::default();

        for step in &self.chain {
            if rng.random::<f64>() >= step.probability {
                continue;
            }

            let effect = step.kind.sample(&self.config, rng);
            match effect.apply(&current, rng) {
                Ok(next) => {
                    current = next;
                    record.effects.push(effect);
                }
                Err(e) => {
                    log::warn!("Skipping {} on {} samples: {}", effect.label(), current.len(), e);
                }
            }
        }

        let peak = current.peak();
        if peak > PEAK_LIMIT {
            let scale = PEAK_LIMIT / peak;
            current = current.derive(current.samples().iter().map(|s| s * scale).collect());
            record.peak_rescaled = true;
        }

        Variation {
            clip: current,
            record,
        }
    }
}
