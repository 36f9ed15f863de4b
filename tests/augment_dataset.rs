// End-to-end augmentation of a small temporary dataset

use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use drumcorpus::pipeline::{read_trace_file, CategoryStatus, PROVENANCE_DIR};
use drumcorpus::{
    AugmentationConfig, DatasetAugmenter, DatasetOptions, DatasetSummary, VariationComposer,
    WavCodec,
};

fn write_hit(path: &Path, sample_rate: u32, freq: f32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    let len = sample_rate as usize / 2;
    for i in 0..len {
        let t = i as f32 / sample_rate as f32;
        let s = 0.8 * (-t * 8.0).exp() * (2.0 * std::f32::consts::PI * freq * t).sin();
        writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Do: two good hits, Re: empty, Mi: one corrupt and one good hit
fn build_dataset(root: &Path) {
    let do_dir = root.join("Do");
    let re_dir = root.join("Re");
    let mi_dir = root.join("Mi");
    for dir in [&do_dir, &re_dir, &mi_dir] {
        fs::create_dir_all(dir).unwrap();
    }
    fs::create_dir_all(root.join(".git")).unwrap();

    write_hit(&do_dir.join("low hit.wav"), 22050, 140.0);
    write_hit(&do_dir.join("high_hit.wav"), 44100, 220.0);
    fs::write(re_dir.join("notes.txt"), b"no audio here").unwrap();
    fs::write(mi_dir.join("broken.wav"), b"definitely not a wav file").unwrap();
    write_hit(&mi_dir.join("slap.wav"), 22050, 330.0);
}

fn run(input: &Path, output: &Path, seed: u64, parallel: bool) -> DatasetSummary {
    let mut options = DatasetOptions::new(input);
    options.output_root = output.to_path_buf();
    options.target_per_category = 6;
    options.seed = Some(seed);
    options.parallel = parallel;

    DatasetAugmenter::new(
        WavCodec,
        VariationComposer::new(AugmentationConfig::default()).unwrap(),
        options,
    )
    .run()
    .unwrap()
}

fn sorted_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_full_dataset_run() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("dataset");
    let output = temp_dir.path().join("augmented");
    build_dataset(&input);

    let summary = run(&input, &output, 2024, false);

    assert_eq!(summary.categories.len(), 3);
    assert!(!summary.categories.contains_key(".git"));

    let do_report = &summary.categories["Do"];
    assert_eq!(do_report.status, CategoryStatus::Completed);
    assert_eq!(do_report.variations_per_source, 2);
    assert_eq!(do_report.produced(), 6);

    let re_report = &summary.categories["Re"];
    assert_eq!(re_report.status, CategoryStatus::Empty);
    assert_eq!(re_report.produced(), 0);

    let mi_report = &summary.categories["Mi"];
    assert_eq!(mi_report.load_failures, 1);
    assert_eq!(mi_report.produced(), 4);

    assert_eq!(summary.total_produced(), 10);
    assert_eq!(summary.counts()["Do"], 6);

    assert_eq!(
        sorted_names(&output.join("Do")),
        vec![
            "high_hit_aug_00_000.wav",
            "high_hit_aug_00_001.wav",
            "low_hit_aug_01_000.wav",
            "low_hit_aug_01_001.wav",
            "original_high_hit.wav",
            "original_low_hit.wav",
        ]
    );
}

#[test]
fn test_variations_are_mono_float_and_bounded() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("dataset");
    let output = temp_dir.path().join("augmented");
    build_dataset(&input);

    run(&input, &output, 7, false);

    let mut reader = hound::WavReader::open(output.join("Do").join("high_hit_aug_00_000.wav")).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 22050);
    assert_eq!(spec.sample_format, SampleFormat::Float);

    let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
    assert!(!samples.is_empty());
    assert!(samples.iter().all(|s| s.abs() <= 0.95 + 1e-5));
}

#[test]
fn test_provenance_log() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("dataset");
    let output = temp_dir.path().join("augmented");
    build_dataset(&input);

    run(&input, &output, 11, false);

    let entries = read_trace_file(&output.join(PROVENANCE_DIR).join("Do.jsonl")).unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|e| e.category == "Do"));
    assert!(entries.iter().all(|e| e.source_sha256.len() == 64));
    assert_eq!(entries[0].source, "high_hit.wav");
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("dataset");
    build_dataset(&input);

    let sequential = temp_dir.path().join("a");
    let repeated = temp_dir.path().join("b");
    let parallel = temp_dir.path().join("c");
    run(&input, &sequential, 99, false);
    run(&input, &repeated, 99, false);
    run(&input, &parallel, 99, true);

    for category in ["Do", "Mi"] {
        for name in sorted_names(&sequential.join(category)) {
            let expected = fs::read(sequential.join(category).join(&name)).unwrap();
            assert_eq!(fs::read(repeated.join(category).join(&name)).unwrap(), expected);
            assert_eq!(fs::read(parallel.join(category).join(&name)).unwrap(), expected);
        }
    }
}

#[test]
fn test_single_category_run() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("dataset");
    let output = temp_dir.path().join("augmented");
    build_dataset(&input);

    let mut options = DatasetOptions::new(&input);
    options.output_root = output.clone();
    options.target_per_category = 3;
    options.category = Some("Mi".to_string());
    options.seed = Some(5);
    options.provenance = false;

    let summary = DatasetAugmenter::new(
        WavCodec,
        VariationComposer::new(AugmentationConfig::default()).unwrap(),
        options,
    )
    .run()
    .unwrap();

    assert_eq!(summary.categories.len(), 1);
    assert_eq!(summary.categories["Mi"].produced(), 3);
    assert!(!output.join("Do").exists());
    assert!(!output.join(PROVENANCE_DIR).exists());
}
