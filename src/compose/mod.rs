// Variation composer
// Turns one source clip into randomized, label-preserving variations

pub mod composer;
pub mod effects;

pub use composer::{ChainStep, Variation, VariationComposer, VariationRecord, PEAK_LIMIT};
pub use effects::{AppliedEffect, BandGain, EffectKind};
