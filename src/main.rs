use cascade_detector::dataset::{LabeledImage, NegativeSamples, PositiveSamples, RoiJitter};
use cascade_detector::image::GrayImageU8;
use cascade_detector::{Cascade, CascadeTrainer, Detector, DetectorParams, Rect, TrainParams};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

/// Demo: train a small cascade on synthetic scenes holding one bright square
/// each, then scan an unseen scene.
fn run() -> Result<(), String> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
    let scenes: Vec<LabeledImage> = (0..24).map(|_| synthetic_scene(&mut rng)).collect();

    let params = TrainParams {
        tree_depth: 3,
        max_trees: 8,
        min_tprs: vec![0.99; 4],
        candidate_count: 256,
        target_fpr: 0.01,
        ..Default::default()
    };
    let mut positives = PositiveSamples::new(
        &scenes,
        params.wh_ratio,
        Some(RoiJitter::default()),
        Xoshiro256PlusPlus::seed_from_u64(1),
    );
    let mut negatives =
        NegativeSamples::new(&scenes, 32, params.wh_ratio, Xoshiro256PlusPlus::seed_from_u64(2))
            .map_err(|e| e.to_string())?;

    let mut cascade = Cascade::new(params.wh_ratio, params.tree_depth);
    let trainer = CascadeTrainer::new(params).map_err(|e| e.to_string())?;
    let report = trainer
        .train(&mut cascade, &mut positives, &mut negatives, |_| Ok(()))
        .map_err(|e| e.to_string())?;
    println!(
        "trained stages={} trees={} stop={:?} in {:.1} ms",
        report.total_stages, report.total_trees, report.stop_reason, report.total_ms
    );

    let test = synthetic_scene(&mut rng);
    let detector = Detector::new(
        cascade,
        DetectorParams {
            min_size: 32,
            ..Default::default()
        },
    )
    .map_err(|e| e.to_string())?;
    let scan = detector.detect_with_report(&test.image.as_view());
    let truth = test.regions[0];
    let best = scan
        .detections
        .iter()
        .max_by(|a, b| a.rect.iou(&truth).total_cmp(&b.rect.iou(&truth)));
    println!(
        "windows={} detections={} latency_ms={:.3}",
        scan.windows_evaluated,
        scan.detections.len(),
        scan.latency_ms
    );
    if let Some(det) = best {
        println!(
            "best match {:?} iou={:.2} confidence={:.3}",
            det.rect,
            det.rect.iou(&truth),
            det.confidence
        );
    }
    Ok(())
}

fn synthetic_scene<R: Rng>(rng: &mut R) -> LabeledImage {
    let (w, h) = (160usize, 120usize);
    let data: Vec<u8> = (0..w * h).map(|_| rng.gen_range(0..110)).collect();
    let mut image = GrayImageU8::new(w, h, data);
    let side = rng.gen_range(36..56);
    let (x0, y0) = (rng.gen_range(4..w - side - 4), rng.gen_range(4..h - side - 4));
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            image.set(x, y, rng.gen_range(170..=255));
        }
    }
    LabeledImage::new(image, vec![Rect::new(x0, y0, side, side)])
}
