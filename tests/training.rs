mod common;

use cascade_detector::dataset::{
    LabeledImage, NegativeSamples, PatchSource, PositiveSamples, RoiJitter,
};
use cascade_detector::diagnostics::StopReason;
use cascade_detector::image::ImageView;
use cascade_detector::model::save_cascade;
use cascade_detector::{
    load_cascade, train_to_file, Cascade, Detector, DetectorParams, Result, TrainParams,
};
use common::synthetic_image::noisy_scene;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::fs;
use std::path::PathBuf;

fn model_path(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "cascade_detector_{tag}_{}.bin",
        std::process::id()
    ));
    let _ = fs::remove_file(&path);
    path
}

/// Sample sources sized to the resolved cascade, seeded by `seed`.
fn sources<'a>(
    scenes: &'a [LabeledImage],
    cascade: &Cascade,
    seed: u64,
) -> Result<(
    PositiveSamples<'a, Xoshiro256PlusPlus>,
    NegativeSamples<'a, Xoshiro256PlusPlus>,
)> {
    let positives = PositiveSamples::new(
        scenes,
        cascade.wh_ratio,
        Some(RoiJitter::default()),
        Xoshiro256PlusPlus::seed_from_u64(seed),
    );
    let negatives = NegativeSamples::new(
        scenes,
        32,
        cascade.wh_ratio,
        Xoshiro256PlusPlus::seed_from_u64(seed + 1),
    )?;
    Ok((positives, negatives))
}

fn params(stages: usize) -> TrainParams {
    TrainParams {
        tree_depth: 2,
        max_trees: 6,
        min_tprs: vec![0.95; stages],
        candidate_count: 128,
        target_fpr: 0.05,
        seed: 1,
        ..Default::default()
    }
}

#[test]
fn trains_persists_and_resumes() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
    let scenes: Vec<_> = (0..16).map(|_| noisy_scene(&mut rng, 96, 96, 32)).collect();
    let path = model_path("resume");

    let (first, report) =
        train_to_file(params(2), &path, |c| sources(&scenes, c, 7)).unwrap();
    assert_eq!(report.start_stage, 0);
    assert!(first.stage_count() >= 1);
    assert_eq!(first.stage_count(), report.total_stages);
    assert_eq!(load_cascade(&path).unwrap(), first);

    // Unjittered annotations mostly survive the cascade.
    let accepted = scenes
        .iter()
        .filter(|s| {
            let view = s.image.as_view().sub_view(s.regions[0]).unwrap();
            first.predict(&view).passed
        })
        .count();
    assert!(accepted * 2 >= scenes.len(), "{accepted} of {} accepted", scenes.len());

    let (second, resumed) =
        train_to_file(params(4), &path, |c| sources(&scenes, c, 9)).unwrap();
    assert_eq!(resumed.start_stage, first.stage_count());
    assert!(second.trees.len() >= first.trees.len());
    assert_eq!(&second.trees[..first.trees.len()], &first.trees[..]);
    if resumed.stop_reason == StopReason::ScheduleExhausted {
        assert_eq!(second.stage_count(), 4);
    }
    assert_eq!(load_cascade(&path).unwrap(), second);

    let _ = fs::remove_file(&path);
}

#[test]
fn trained_cascade_finds_unseen_object() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
    let scenes: Vec<_> = (0..16).map(|_| noisy_scene(&mut rng, 96, 96, 32)).collect();
    let path = model_path("detect");

    let (cascade, _) = train_to_file(params(3), &path, |c| sources(&scenes, c, 1)).unwrap();
    let _ = fs::remove_file(&path);

    let test = noisy_scene(&mut rng, 96, 96, 32);
    let truth = test.regions[0];
    let params = DetectorParams {
        min_size: 32,
        ..Default::default()
    };
    let detections = Detector::new(cascade, params)
        .unwrap()
        .detect(&test.image.as_view());
    let best = detections
        .iter()
        .map(|d| d.rect.iou(&truth))
        .fold(0.0f32, f32::max);
    assert!(best > 0.3, "best IoU {best} over {} detections", detections.len());
}

#[test]
fn stored_ratio_sizes_resumed_samples() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
    let scenes: Vec<_> = (0..4).map(|_| noisy_scene(&mut rng, 96, 96, 32)).collect();
    let path = model_path("ratio");
    save_cascade(&Cascade::new(0.5, 2), &path).unwrap();

    let mut seen = None;
    let (cascade, _) = train_to_file(params(0), &path, |c| {
        seen = Some(c.wh_ratio);
        sources(&scenes, c, 4)
    })
    .unwrap();
    let _ = fs::remove_file(&path);

    assert_eq!(seen, Some(0.5));
    assert_eq!(cascade.wh_ratio, 0.5);

    let (mut positives, mut negatives) = sources(&scenes, &cascade, 4).unwrap();
    // Jitter rounds the width, so allow one pixel.
    let pos = positives.patch(0).unwrap();
    assert!(pos.width().abs_diff(pos.height() / 2) <= 1, "{}x{}", pos.width(), pos.height());
    for idx in 0..20 {
        let neg = negatives.patch(idx).unwrap();
        assert_eq!(neg.width(), neg.height() / 2);
    }
}
