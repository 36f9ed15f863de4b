//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

use drumcorpus::pipeline::{default_output_root, DatasetOptions, DEFAULT_TARGET};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "drumcorpus")]
#[command(about = "Multiply a labeled percussion dataset with randomized augmentations", long_about = None)]
pub struct Args {
    /// Dataset folder; every subfolder is one category
    #[arg(short, long, value_name = "DIR")]
    pub input: PathBuf,

    /// Output folder (default: augmented_<input name> next to the input)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Samples per category, originals included
    #[arg(short, long, value_name = "COUNT", default_value_t = DEFAULT_TARGET)]
    pub target: usize,

    /// Only process this category
    #[arg(short, long, value_name = "NAME")]
    pub category: Option<String>,

    /// TOML file overriding augmentation ranges and probabilities
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base random seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Process categories in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Do not write .provenance logs
    #[arg(long)]
    pub no_provenance: bool,

    /// Also write the run summary as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub summary_json: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn dataset_options(&self) -> DatasetOptions {
        let mut options = DatasetOptions::new(&self.input);
        options.output_root = self
            .output
            .clone()
            .unwrap_or_else(|| default_output_root(&self.input));
        options.target_per_category = self.target;
        options.category = self.category.clone();
        options.seed = self.seed;
        options.parallel = self.parallel;
        options.provenance = !self.no_provenance;
        options
    }
}
