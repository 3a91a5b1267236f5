use cascade_detector::config::detect;
use cascade_detector::diagnostics::ScanReport;
use cascade_detector::image::io::{load_grayscale_image, save_grayscale_u8, write_json_file};
use cascade_detector::{load_cascade, Detector};
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = detect::load_config(Path::new(&config_path))?;

    let cascade = load_cascade(&config.model)
        .map_err(|e| format!("Failed to load model {}: {e}", config.model.display()))?;
    let detector = Detector::new(cascade, config.detector).map_err(|e| e.to_string())?;

    let gray = load_grayscale_image(&config.input)?;
    let report = detector.detect_with_report(&gray.as_view());
    print_text_summary(&report);

    if let Some(path) = &config.output.json_out {
        write_json_file(path, &report)?;
        println!("JSON report written to {}", path.display());
    }
    if let Some(path) = &config.output.overlay_png {
        let mut overlay = gray.clone();
        for det in &report.detections {
            overlay.draw_rect(det.rect, 255);
        }
        save_grayscale_u8(&overlay, path)?;
        println!("Overlay written to {}", path.display());
    }
    Ok(())
}

fn print_text_summary(report: &ScanReport) {
    println!("Detection summary");
    println!("  image: {}x{}", report.image_width, report.image_height);
    println!("  scales: {}", report.scales.len());
    println!("  windows: {}", report.windows_evaluated);
    println!("  detections: {}", report.detections.len());
    println!("  latency_ms: {:.3}", report.latency_ms);
    for det in &report.detections {
        println!(
            "    x={} y={} w={} h={} confidence={:.3}",
            det.rect.x, det.rect.y, det.rect.w, det.rect.h, det.confidence
        );
    }
}

fn usage() -> String {
    "Usage: detect_objects <config.json>".to_string()
}
