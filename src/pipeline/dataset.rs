// Dataset orchestrator
// Runs the category processor over every category folder and aggregates the results

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::audio::AudioCodec;
use crate::compose::VariationComposer;
use crate::pipeline::category::{CategoryProcessor, CategoryReport, CategoryStatus};
use crate::pipeline::error::PipelineError;

/// Clips per category when no target is given
pub const DEFAULT_TARGET: usize = 150;

/// File extensions treated as audio sources
pub const AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "wav", "m4a", "aac"];

/// Folder under the output root holding the provenance logs
pub const PROVENANCE_DIR: &str = ".provenance";

/// `<parent>/augmented_<name>` next to the input folder
pub fn default_output_root(input_root: &Path) -> PathBuf {
    let name = input_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    let parent = input_root.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("augmented_{}", name))
}

/// Per-category seed: first 8 bytes of SHA-256(base seed || category name)
pub fn derive_seed(base: u64, category: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(category.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOptions {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub target_per_category: usize,
    /// Restrict the run to one category
    pub category: Option<String>,
    /// Base seed; drawn from the OS when absent
    pub seed: Option<u64>,
    pub parallel: bool,
    pub provenance: bool,
    pub extensions: Vec<String>,
}

impl DatasetOptions {
    pub fn new(input_root: impl Into<PathBuf>) -> Self {
        let input_root = input_root.into();
        DatasetOptions {
            output_root: default_output_root(&input_root),
            input_root,
            target_per_category: DEFAULT_TARGET,
            category: None,
            seed: None,
            parallel: false,
            provenance: true,
            extensions: AUDIO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Result of a full run, keyed by category name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub seed: u64,
    pub target_per_category: usize,
    pub categories: BTreeMap<String, CategoryReport>,
}

impl DatasetSummary {
    /// Category name to clips produced
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.categories
            .iter()
            .map(|(name, report)| (name.clone(), report.produced()))
            .collect()
    }

    pub fn total_produced(&self) -> usize {
        self.categories.values().map(|r| r.produced()).sum()
    }

    pub fn total_variations(&self) -> usize {
        self.categories.values().map(|r| r.variations_written).sum()
    }

    /// Categories that produced nothing, with their status
    pub fn unproductive(&self) -> Vec<(&str, &CategoryStatus)> {
        self.categories
            .values()
            .filter(|r| r.produced() == 0)
            .map(|r| (r.category.as_str(), &r.status))
            .collect()
    }

    pub fn to_json_pretty(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Augments a whole dataset tree
pub struct DatasetAugmenter<C: AudioCodec> {
    codec: C,
    composer: VariationComposer,
    options: DatasetOptions,
}

impl<C: AudioCodec> DatasetAugmenter<C> {
    pub fn new(codec: C, composer: VariationComposer, options: DatasetOptions) -> Self {
        DatasetAugmenter {
            codec,
            composer,
            options,
        }
    }

    pub fn options(&self) -> &DatasetOptions {
        &self.options
    }

    /// Category folder names in sorted order, hidden folders excluded
    pub fn list_categories(&self) -> Result<Vec<String>, PipelineError> {
        let root = &self.options.input_root;
        let read_err = |source| PipelineError::ReadInput {
            path: root.clone(),
            source,
        };

        let mut categories = Vec::new();
        for entry in std::fs::read_dir(root).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            categories.push(name);
        }
        categories.sort();
        Ok(categories)
    }

    /// Process every category
    ///
    /// Fails only when the dataset root cannot be read or the output root
    /// cannot be created. Everything that goes wrong inside a category ends
    /// up in that category's report.
    pub fn run(&self) -> Result<DatasetSummary, PipelineError> {
        let options = &self.options;
        if !options.input_root.is_dir() {
            return Err(PipelineError::InputNotFound(options.input_root.clone()));
        }

        let categories = match &options.category {
            Some(category) => vec![category.clone()],
            None => self.list_categories()?,
        };

        std::fs::create_dir_all(&options.output_root).map_err(|source| {
            PipelineError::CreateOutput {
                path: options.output_root.clone(),
                source,
            }
        })?;

        let seed = options.seed.unwrap_or_else(rand::random);
        log::info!(
            "Augmenting {} categories from {} into {} (target {}, seed {})",
            categories.len(),
            options.input_root.display(),
            options.output_root.display(),
            options.target_per_category,
            seed
        );

        let provenance_dir = options
            .provenance
            .then(|| options.output_root.join(PROVENANCE_DIR));
        let processor = CategoryProcessor::new(
            &self.codec,
            &self.composer,
            options.target_per_category,
            &options.extensions,
        )
        .with_provenance(provenance_dir);

        let process = |category: &String| {
            let mut rng = StdRng::seed_from_u64(derive_seed(seed, category));
            processor.process(
                category,
                &options.input_root.join(category),
                &options.output_root.join(category),
                &mut rng,
            )
        };

        let reports: Vec<CategoryReport> = if options.parallel {
            categories.par_iter().map(process).collect()
        } else {
            categories.iter().map(process).collect()
        };

        let summary = DatasetSummary {
            seed,
            target_per_category: options.target_per_category,
            categories: reports
                .into_iter()
                .map(|report| (report.category.clone(), report))
                .collect(),
        };

        for (category, status) in summary.unproductive() {
            log::warn!("Category {} produced no samples ({})", category, status.label());
        }
        log::info!("Produced {} samples in total", summary.total_produced());

        Ok(summary)
    }
}
