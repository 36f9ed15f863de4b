// Augmentation configuration
// Parameter ranges and effect probabilities, loaded once and read-only after

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::noise::NoiseType;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid range for {name}: [{low}, {high}]")]
    InvalidRange { name: String, low: f32, high: f32 },

    #[error("Probability for {name} must be in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("{0}")]
    Invalid(String),
}

/// Closed interval `[low, high]`, written as a two-element array
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct ParamRange {
    pub low: f32,
    pub high: f32,
}

impl ParamRange {
    pub const fn new(low: f32, high: f32) -> Self {
        ParamRange { low, high }
    }

    pub fn is_valid(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low <= self.high
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.low && value <= self.high
    }

    /// Uniform draw from the interval
    ///
    /// Bounds given in the wrong order are swapped. A non-finite bound is
    /// ignored in favour of the other one, and a range with no finite bound
    /// yields 0.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let (low, high) = match (self.low.is_finite(), self.high.is_finite()) {
            (true, true) => (self.low.min(self.high), self.low.max(self.high)),
            (true, false) => return self.low,
            (false, true) => return self.high,
            (false, false) => return 0.0,
        };
        if low == high {
            return low;
        }
        rng.random_range(low..=high)
    }

    fn check(&self, name: &str) -> Result<(), ConfigError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ConfigError::InvalidRange {
                name: name.to_string(),
                low: self.low,
                high: self.high,
            })
        }
    }
}

impl From<[f32; 2]> for ParamRange {
    fn from([low, high]: [f32; 2]) -> Self {
        ParamRange { low, high }
    }
}

impl From<ParamRange> for [f32; 2] {
    fn from(range: ParamRange) -> Self {
        [range.low, range.high]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeStretchParams {
    /// Stretch rate; < 1 lengthens, > 1 shortens
    pub rate: ParamRange,
}

impl Default for TimeStretchParams {
    fn default() -> Self {
        TimeStretchParams {
            rate: ParamRange::new(0.75, 1.25),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeParams {
    pub db: ParamRange,
}

impl Default for VolumeParams {
    fn default() -> Self {
        VolumeParams {
            db: ParamRange::new(-8.0, 8.0),
        }
    }
}

/// How an EQ band shapes the signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandShape {
    LowShelf,
    HighShelf,
    Peaking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqBand {
    pub name: String,
    pub shape: BandShape,
    pub freq_hz: f32,
    /// Only used by peaking bands
    #[serde(default = "default_q")]
    pub q: f32,
    pub gain_db: ParamRange,
}

fn default_q() -> f32 {
    1.0
}

impl EqBand {
    fn new(name: &str, shape: BandShape, freq_hz: f32, q: f32, gain: f32) -> Self {
        EqBand {
            name: name.to_string(),
            shape,
            freq_hz,
            q,
            gain_db: ParamRange::new(-gain, gain),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualizerParams {
    pub bands: Vec<EqBand>,
}

impl Default for EqualizerParams {
    fn default() -> Self {
        EqualizerParams {
            bands: vec![
                EqBand::new("low_shelf", BandShape::LowShelf, 200.0, 1.0, 4.0),
                EqBand::new("mid_boost", BandShape::Peaking, 800.0, 1.0, 3.0),
                EqBand::new("high_shelf", BandShape::HighShelf, 4000.0, 1.0, 4.0),
                EqBand::new("presence", BandShape::Peaking, 2500.0, 2.0, 2.0),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    /// Noise level relative to the signal (dB)
    pub level_db: ParamRange,
    pub types: Vec<NoiseType>,
}

impl Default for NoiseParams {
    fn default() -> Self {
        NoiseParams {
            level_db: ParamRange::new(-45.0, -25.0),
            types: NoiseType::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbParams {
    pub room_size: ParamRange,
    pub decay_secs: ParamRange,
}

impl Default for ReverbParams {
    fn default() -> Self {
        ReverbParams {
            room_size: ParamRange::new(0.05, 0.8),
            decay_secs: ParamRange::new(0.1, 2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchShiftParams {
    pub semitones: ParamRange,
}

impl Default for PitchShiftParams {
    fn default() -> Self {
        PitchShiftParams {
            semitones: ParamRange::new(-0.5, 0.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionParams {
    pub ratio: ParamRange,
    pub threshold_db: ParamRange,
}

impl Default for CompressionParams {
    fn default() -> Self {
        CompressionParams {
            ratio: ParamRange::new(1.5, 4.0),
            threshold_db: ParamRange::new(-20.0, -5.0),
        }
    }
}

/// Chance that each effect is applied to a variation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectProbabilities {
    pub time_stretch: f64,
    pub volume: f64,
    pub equalizer: f64,
    pub noise: f64,
    pub reverb: f64,
    pub pitch_shift: f64,
    pub compression: f64,
}

impl Default for EffectProbabilities {
    fn default() -> Self {
        EffectProbabilities {
            time_stretch: 0.8,
            volume: 0.85,
            equalizer: 0.7,
            noise: 0.5,
            reverb: 0.4,
            pitch_shift: 0.2,
            compression: 0.3,
        }
    }
}

impl EffectProbabilities {
    fn entries(&self) -> [(&'static str, f64); 7] {
        [
            ("time_stretch", self.time_stretch),
            ("volume", self.volume),
            ("equalizer", self.equalizer),
            ("noise", self.noise),
            ("reverb", self.reverb),
            ("pitch_shift", self.pitch_shift),
            ("compression", self.compression),
        ]
    }
}

/// Every tunable of the variation composer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentationConfig {
    pub time_stretch: TimeStretchParams,
    pub volume: VolumeParams,
    pub equalizer: EqualizerParams,
    pub noise: NoiseParams,
    pub reverb: ReverbParams,
    pub pitch_shift: PitchShiftParams,
    pub compression: CompressionParams,
    pub probabilities: EffectProbabilities,
}

impl AugmentationConfig {
    /// Read and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML; keys not present keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AugmentationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.time_stretch.rate.check("time_stretch.rate")?;
        if self.time_stretch.rate.low <= 0.0 {
            return Err(ConfigError::Invalid(
                "time_stretch.rate must be positive".to_string(),
            ));
        }

        self.volume.db.check("volume.db")?;

        for band in &self.equalizer.bands {
            band.gain_db.check(&format!("equalizer.{}.gain_db", band.name))?;
            if !(band.freq_hz > 0.0 && band.freq_hz.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "equalizer.{} frequency must be positive",
                    band.name
                )));
            }
            if band.shape == BandShape::Peaking && !(band.q > 0.0 && band.q.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "equalizer.{} q must be positive",
                    band.name
                )));
            }
        }

        self.noise.level_db.check("noise.level_db")?;
        if self.noise.types.is_empty() {
            return Err(ConfigError::Invalid(
                "noise.types must name at least one noise type".to_string(),
            ));
        }

        self.reverb.room_size.check("reverb.room_size")?;
        self.reverb.decay_secs.check("reverb.decay_secs")?;
        if self.reverb.decay_secs.low <= 0.01 {
            return Err(ConfigError::Invalid(
                "reverb.decay_secs must stay above 0.01 s".to_string(),
            ));
        }

        self.pitch_shift.semitones.check("pitch_shift.semitones")?;

        self.compression.ratio.check("compression.ratio")?;
        if self.compression.ratio.low < 1.0 {
            return Err(ConfigError::Invalid(
                "compression.ratio must be at least 1".to_string(),
            ));
        }
        self.compression.threshold_db.check("compression.threshold_db")?;

        for (name, value) in self.probabilities.entries() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }

        Ok(())
    }
}
