//! Cascade-filtered sampling: keep only the patches the current cascade
//! still accepts.

use crate::dataset::PatchSource;
use crate::error::Result;
use crate::image::GrayImageU8;
use crate::model::Cascade;
use log::warn;

/// Patches that passed the cascade together with their confidences.
#[derive(Clone, Debug, Default)]
pub struct Sampled {
    pub patches: Vec<GrayImageU8>,
    pub confidences: Vec<f32>,
    /// Accepted patches over patches tried.
    pub hit_rate: f32,
    pub trials: usize,
}

impl Sampled {
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

/// Walk `source` in index order and keep up to `pick_count` patches accepted
/// by `cascade`.
///
/// Every `pick_count` trials the running hit rate is compared to
/// `min_hit_rate`; sampling stops early once it falls below. An empty cascade
/// accepts everything.
pub fn sample_passing<S>(
    cascade: &Cascade,
    source: &mut S,
    pick_count: usize,
    min_hit_rate: f32,
) -> Result<Sampled>
where
    S: PatchSource + ?Sized,
{
    let mut out = Sampled::default();
    if pick_count == 0 {
        return Ok(out);
    }

    let mut trials = 0usize;
    while out.patches.len() < pick_count && trials < source.len() {
        let patch = source.patch(trials)?;
        let pred = cascade.try_predict(&patch)?;
        if pred.passed {
            out.patches.push(patch);
            out.confidences.push(pred.confidence);
        }
        trials += 1;

        if trials % pick_count == 0 {
            let rate = out.patches.len() as f32 / trials as f32;
            if rate < min_hit_rate {
                warn!(
                    "sampling stopped after {trials} trials: hit rate {rate:.6} below {min_hit_rate}"
                );
                break;
            }
        }
    }

    out.trials = trials;
    out.hit_rate = if trials == 0 {
        0.0
    } else {
        out.patches.len() as f32 / trials as f32
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryPatches;
    use crate::model::{Feature, Tree};
    use approx::assert_abs_diff_eq;

    /// One-stage cascade accepting patches whose centre is at least as bright
    /// as their top-left corner.
    fn brightness_cascade() -> Cascade {
        let mut c = Cascade::new(1.0, 1);
        let tree = Tree::from_parts(vec![Feature::new(-127, -127, 0, 0)], vec![-1.0, 1.0], 0.5)
            .unwrap();
        c.push_tree(tree).unwrap();
        c
    }

    fn centred(centre: u8, corner: u8) -> GrayImageU8 {
        let mut img = GrayImageU8::filled(9, 9, centre);
        img.set(0, 0, corner);
        img
    }

    #[test]
    fn keeps_only_accepted_patches() {
        let mut src = InMemoryPatches::new(vec![
            centred(200, 10),
            centred(10, 200),
            centred(150, 20),
            centred(5, 90),
        ]);
        let s = sample_passing(&brightness_cascade(), &mut src, 10, 0.0).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.trials, 4);
        assert_abs_diff_eq!(s.hit_rate, 0.5);
        assert!(s.confidences.iter().all(|&c| c == 1.0));
    }

    #[test]
    fn stops_at_pick_count() {
        let mut src = InMemoryPatches::new(vec![centred(200, 10); 10]);
        let s = sample_passing(&Cascade::new(1.0, 1), &mut src, 3, 0.0).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.trials, 3);
    }

    #[test]
    fn hit_rate_floor_aborts_early() {
        let mut patches = vec![centred(10, 200); 40];
        patches.push(centred(200, 10));
        let mut src = InMemoryPatches::new(patches);
        let s = sample_passing(&brightness_cascade(), &mut src, 4, 0.1).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.trials, 4);
        assert_abs_diff_eq!(s.hit_rate, 0.0);
    }
}
