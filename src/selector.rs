//! Best-fit capture resolution selection.
//!
//! Candidates are ordered by how close their aspect ratio is to the target's,
//! then by how close their area is. Aspect always dominates area, so a 16:9
//! target prefers any 16:9 size over a 4:3 size of nearly identical area.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::Size;

/// Returned when the device reports no usable sizes.
pub const FALLBACK_SIZE: Size = Size::new(320, 200);

/// How the target's aspect ratio is computed before comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectPolicy {
    /// Target and candidate both use short side over long side.
    #[default]
    Normalized,
    /// Target uses width over height as given; candidates stay normalized.
    /// Portrait targets then score every candidate against a ratio below 1
    /// and landscape targets against a ratio above 1.
    Unnormalized,
}

impl AspectPolicy {
    fn target_aspect(self, target: Size) -> f64 {
        match self {
            AspectPolicy::Normalized => target.normalized_aspect(),
            AspectPolicy::Unnormalized => target.raw_aspect(),
        }
    }
}

/// Sort key of one candidate against a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitScore {
    pub aspect_distance: f64,
    pub area_distance: u64,
}

impl FitScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.aspect_distance
            .total_cmp(&other.aspect_distance)
            .then(self.area_distance.cmp(&other.area_distance))
    }
}

pub fn score(candidate: Size, target: Size, policy: AspectPolicy) -> FitScore {
    FitScore {
        aspect_distance: (candidate.normalized_aspect() - policy.target_aspect(target)).abs(),
        area_distance: target.area().abs_diff(candidate.area()),
    }
}

/// All usable candidates, closest first. Ties keep enumeration order.
pub fn rank(candidates: &[Size], target: Size, policy: AspectPolicy) -> Vec<Size> {
    let mut scored: Vec<(FitScore, Size)> = candidates
        .iter()
        .copied()
        .filter(Size::is_valid)
        .map(|c| (score(c, target, policy), c))
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0));
    scored.into_iter().map(|(_, size)| size).collect()
}

/// Pick the candidate closest to `target` using the default aspect policy.
pub fn select(candidates: &[Size], target: Size) -> Size {
    select_with_policy(candidates, target, AspectPolicy::default())
}

pub fn select_with_policy(candidates: &[Size], target: Size, policy: AspectPolicy) -> Size {
    if !target.is_valid() {
        log::warn!("Invalid target size {}, using fallback {}", target, FALLBACK_SIZE);
        return FALLBACK_SIZE;
    }

    match rank(candidates, target, policy).first() {
        Some(best) => *best,
        None => {
            log::warn!(
                "No supported sizes reported, using fallback {}",
                FALLBACK_SIZE
            );
            FALLBACK_SIZE
        }
    }
}
