// Drumcorpus CLI
// Augments every category of a dataset folder and prints the summary

mod cli;

use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;

use cli::Args;
use drumcorpus::{
    AugmentationConfig, DatasetAugmenter, DatasetSummary, PipelineError, VariationComposer,
    WavCodec,
};

fn init_logging(quiet: bool) {
    let default_filter = if quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn print_summary(summary: &DatasetSummary) {
    println!();
    println!("Augmentation summary (seed {})", summary.seed);
    println!("{}", "=".repeat(48));
    for report in summary.categories.values() {
        println!(
            "  {:<12} {:>4} original -> {:>5} total ({} augmented) [{}]",
            report.category,
            report.sources,
            report.produced(),
            report.variations_written,
            report.status.label()
        );
        if report.load_failures > 0 || report.write_failures > 0 {
            println!(
                "  {:<12} {} unreadable, {} failed writes",
                "", report.load_failures, report.write_failures
            );
        }
    }
    println!();
    println!("Total samples: {}", summary.total_produced());
}

fn run(args: &Args) -> Result<DatasetSummary, PipelineError> {
    let config = match &args.config {
        Some(path) => AugmentationConfig::load(path)?,
        None => AugmentationConfig::default(),
    };

    let options = args.dataset_options();
    let output_root = options.output_root.clone();
    let composer = VariationComposer::new(config)?;
    let augmenter = DatasetAugmenter::new(WavCodec, composer, options);
    let summary = augmenter.run()?;

    if let Some(path) = &args.summary_json {
        std::fs::write(path, summary.to_json_pretty()?).map_err(|source| {
            PipelineError::CreateOutput {
                path: path.clone(),
                source,
            }
        })?;
    }

    println!("Augmented dataset saved to {}", output_root.display());
    Ok(summary)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.quiet);

    let started = Instant::now();
    match run(&args) {
        Ok(summary) => {
            print_summary(&summary);
            println!("Finished in {:.1}s", started.elapsed().as_secs_f64());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Augmentation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
