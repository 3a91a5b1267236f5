use cascade_detector::config::train::{self, TrainToolConfig};
use cascade_detector::dataset::{LabeledImage, NegativeSamples, PositiveSamples};
use cascade_detector::image::io::{load_grayscale_image, write_json_file};
use cascade_detector::train_to_file;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::env;
use std::path::Path;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = train::load_config(Path::new(&config_path))?;
    let images = load_images(&config)?;

    if images.iter().all(|img| img.regions.is_empty()) {
        return Err("No annotated regions in the training images".to_string());
    }

    let sampling = &config.sampling;
    let (cascade, report) = train_to_file(config.params.clone(), &config.model, |cascade| {
        let positives = PositiveSamples::new(
            &images,
            cascade.wh_ratio,
            sampling.jitter,
            Xoshiro256PlusPlus::seed_from_u64(sampling.seed),
        );
        let negatives = NegativeSamples::new(
            &images,
            sampling.negative_min_size,
            cascade.wh_ratio,
            Xoshiro256PlusPlus::seed_from_u64(sampling.seed.wrapping_add(1)),
        )?;
        Ok((positives, negatives))
    })
    .map_err(|e| format!("Training failed: {e}"))?;

    println!("Training summary");
    println!("  model: {}", config.model.display());
    println!("  resumed at stage: {}", report.start_stage);
    println!("  stages added: {}", report.stages_added());
    println!("  stages total: {}", cascade.stage_count());
    println!("  trees total: {}", cascade.trees.len());
    println!("  stop reason: {:?}", report.stop_reason);
    println!("  elapsed_ms: {:.1}", report.total_ms);

    if let Some(path) = &config.report_json {
        write_json_file(path, &report)?;
        println!("JSON report written to {}", path.display());
    }
    Ok(())
}

fn load_images(config: &TrainToolConfig) -> Result<Vec<LabeledImage>, String> {
    config
        .images
        .iter()
        .map(|entry| {
            let image = load_grayscale_image(&entry.path)?;
            Ok(LabeledImage::new(image, entry.regions.clone()))
        })
        .collect()
}

fn usage() -> String {
    "Usage: train_cascade <config.json>".to_string()
}
