// Category processor
// Copies originals and fills one category up to its target with variations

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::AudioCodec;
use crate::compose::VariationComposer;
use crate::pipeline::trace::{file_sha256, ProvenanceEntry, TraceWriter};

/// Variations generated for every source file of a category
///
/// `max(1, floor((target - sources) / sources))`, the same for every file.
pub fn variations_per_source(sources: usize, target: usize) -> usize {
    if sources == 0 {
        return 0;
    }
    (target.saturating_sub(sources) / sources).max(1)
}

/// Name under which an original is copied
pub fn original_output_name(file_name: &str) -> String {
    format!("original_{}", file_name.replace(' ', "_"))
}

/// Name of variation `variation_idx` of source `file_idx`
pub fn variation_output_name(stem: &str, file_idx: usize, variation_idx: usize, ext: &str) -> String {
    format!(
        "{}_aug_{:02}_{:03}.{}",
        stem.replace(' ', "_"),
        file_idx,
        variation_idx,
        ext
    )
}

/// Outcome of one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryStatus {
    Completed,
    /// Folder exists but holds no accepted audio files
    Empty,
    /// Folder does not exist
    Missing,
    Failed { reason: String },
}

impl CategoryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CategoryStatus::Completed => "completed",
            CategoryStatus::Empty => "empty",
            CategoryStatus::Missing => "missing",
            CategoryStatus::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: String,
    pub status: CategoryStatus,
    /// Accepted audio files found in the category folder
    pub sources: usize,
    pub originals_copied: usize,
    pub variations_per_source: usize,
    pub variations_written: usize,
    pub load_failures: usize,
    pub write_failures: usize,
}

impl CategoryReport {
    fn new(category: &str, status: CategoryStatus) -> Self {
        CategoryReport {
            category: category.to_string(),
            status,
            sources: 0,
            originals_copied: 0,
            variations_per_source: 0,
            variations_written: 0,
            load_failures: 0,
            write_failures: 0,
        }
    }

    /// Clips present in the output folder for this category
    pub fn produced(&self) -> usize {
        self.originals_copied + self.variations_written
    }
}

/// Processes one category folder at a time
pub struct CategoryProcessor<'a, C: AudioCodec + ?Sized> {
    codec: &'a C,
    composer: &'a VariationComposer,
    target: usize,
    extensions: &'a [String],
    provenance_dir: Option<PathBuf>,
}

impl<'a, C: AudioCodec + ?Sized> CategoryProcessor<'a, C> {
    pub fn new(
        codec: &'a C,
        composer: &'a VariationComposer,
        target: usize,
        extensions: &'a [String],
    ) -> Self {
        CategoryProcessor {
            codec,
            composer,
            target,
            extensions,
            provenance_dir: None,
        }
    }

    /// Log every variation to `<dir>/<category>.jsonl`
    pub fn with_provenance(mut self, dir: Option<PathBuf>) -> Self {
        self.provenance_dir = dir;
        self
    }

    fn is_accepted(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|a| a.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    /// Accepted audio files of a folder, sorted by file name
    pub fn list_sources(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && self.is_accepted(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn open_trace(&self, category: &str) -> Option<TraceWriter> {
        let dir = self.provenance_dir.as_ref()?;
        match TraceWriter::create(dir.join(format!("{}.jsonl", category))) {
            Ok(writer) => Some(writer),
            Err(e) => {
                log::warn!("Provenance log disabled for {}: {}", category, e);
                None
            }
        }
    }

    /// Copy originals and write variations for one category
    ///
    /// Never fails: a missing or empty folder, unreadable sources and
    /// failed writes are all reflected in the returned report.
    pub fn process<R: Rng + ?Sized>(
        &self,
        category: &str,
        input_dir: &Path,
        output_dir: &Path,
        rng: &mut R,
    ) -> CategoryReport {
        if !input_dir.is_dir() {
            log::warn!("Category folder {} not found", input_dir.display());
            return CategoryReport::new(category, CategoryStatus::Missing);
        }

        let sources = match self.list_sources(input_dir) {
            Ok(sources) => sources,
            Err(e) => {
                log::error!("Failed to list {}: {}", input_dir.display(), e);
                return CategoryReport::new(
                    category,
                    CategoryStatus::Failed {
                        reason: e.to_string(),
                    },
                );
            }
        };

        if sources.is_empty() {
            log::warn!("No audio files found in category {}", category);
            return CategoryReport::new(category, CategoryStatus::Empty);
        }

        if let Err(e) = std::fs::create_dir_all(output_dir) {
            log::error!("Failed to create {}: {}", output_dir.display(), e);
            let mut report = CategoryReport::new(
                category,
                CategoryStatus::Failed {
                    reason: e.to_string(),
                },
            );
            report.sources = sources.len();
            return report;
        }

        let per_source = variations_per_source(sources.len(), self.target);
        let mut report = CategoryReport::new(category, CategoryStatus::Completed);
        report.sources = sources.len();
        report.variations_per_source = per_source;

        log::info!(
            "Processing {}: {} sources, {} variations each (target {})",
            category,
            sources.len(),
            per_source,
            self.target
        );

        for path in &sources {
            let file_name = file_name_of(path);
            let destination = output_dir.join(original_output_name(&file_name));
            match std::fs::copy(path, &destination) {
                Ok(_) => report.originals_copied += 1,
                Err(e) => {
                    log::error!("Failed to copy {}: {}", path.display(), e);
                    report.write_failures += 1;
                }
            }
        }

        let trace = self.open_trace(category);

        for (file_idx, path) in sources.iter().enumerate() {
            let clip = match self.codec.load(path) {
                Ok(clip) => clip,
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    report.load_failures += 1;
                    continue;
                }
            };

            let file_name = file_name_of(path);
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let source_hash = match &trace {
                Some(_) => file_sha256(path).unwrap_or_else(|e| {
                    log::warn!("Failed to hash {}: {}", path.display(), e);
                    String::new()
                }),
                None => String::new(),
            };

            for variation_idx in 0..per_source {
                let variation = self.composer.compose(&clip, rng);
                let output_name = variation_output_name(
                    &stem,
                    file_idx,
                    variation_idx,
                    self.codec.output_extension(),
                );

                if let Err(e) = self.codec.write(&output_dir.join(&output_name), &variation.clip) {
                    log::error!("Failed to write {}: {}", output_name, e);
                    report.write_failures += 1;
                    continue;
                }
                report.variations_written += 1;
                log::debug!("{}: {}", output_name, variation.record.summary());

                if let Some(trace) = &trace {
                    let entry = ProvenanceEntry::new(
                        category,
                        file_name.as_str(),
                        source_hash.as_str(),
                        output_name,
                        &variation.record,
                    );
                    if let Err(e) = trace.write(&entry) {
                        log::warn!("Failed to log provenance for {}: {}", category, e);
                    }
                }
            }
        }

        log::info!(
            "Finished {}: {} clips ({} originals, {} variations)",
            category,
            report.produced(),
            report.originals_copied,
            report.variations_written
        );

        report
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
