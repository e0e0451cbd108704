//! Coarse signature matching by circular correlation.
//!
//! Rotating a room about +Y shifts its yaw histogram circularly, so trying
//! every shift of the live histogram against the saved one yields a ranked
//! set of yaw hypotheses. Translation comes from the bounds centers and is
//! refined later by the [`AlignmentRefiner`](crate::alignment::AlignmentRefiner).

use serde::{Deserialize, Serialize};

use crate::alignment::{HypothesisSource, RelocalizationHypothesis};
use crate::core::math::clamp01;

use super::MeshSignatureDescriptor;

/// Configuration for coarse matching.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoarseMatcherConfig {
    /// Bonus added when the first occupancy words match exactly.
    /// Default: 0.1
    #[serde(default = "default_occupancy_bonus")]
    pub occupancy_bonus: f32,

    /// Number of hypotheses returned.
    /// Default: 3
    #[serde(default = "default_max_hypotheses")]
    pub max_hypotheses: usize,
}

fn default_occupancy_bonus() -> f32 {
    0.1
}
fn default_max_hypotheses() -> usize {
    3
}

impl Default for CoarseMatcherConfig {
    fn default() -> Self {
        Self {
            occupancy_bonus: default_occupancy_bonus(),
            max_hypotheses: default_max_hypotheses(),
        }
    }
}

/// Ranks yaw/translation hypotheses from two descriptors.
#[derive(Clone, Debug, Default)]
pub struct CoarseSignatureMatcher {
    config: CoarseMatcherConfig,
}

impl CoarseSignatureMatcher {
    /// Create a matcher.
    pub fn new(config: CoarseMatcherConfig) -> Self {
        Self { config }
    }

    /// Get configuration.
    pub fn config(&self) -> &CoarseMatcherConfig {
        &self.config
    }

    /// Match live against saved.
    ///
    /// Returns up to `max_hypotheses` results sorted by descending confidence,
    /// or an empty list when either descriptor carries no yaw bins.
    pub fn match_descriptors(
        &self,
        saved: &MeshSignatureDescriptor,
        live: &MeshSignatureDescriptor,
    ) -> Vec<RelocalizationHypothesis> {
        let count = saved.yaw_histogram.len().min(live.yaw_histogram.len());
        if count == 0 {
            return Vec::new();
        }

        let bonus = match (saved.occupancy.first(), live.occupancy.first()) {
            (Some(a), Some(b)) if a == b => self.config.occupancy_bonus,
            _ => 0.0,
        };

        let (saved_cx, saved_cz) = saved.bounds.center();
        let (live_cx, live_cz) = live.bounds.center();
        let tx = saved_cx - live_cx;
        let tz = saved_cz - live_cz;
        let step_deg = 360.0 / count as f32;

        let mut hypotheses: Vec<RelocalizationHypothesis> = (0..count)
            .map(|shift| {
                let correlation = circular_correlation(
                    &saved.yaw_histogram[..count],
                    &live.yaw_histogram[..count],
                    shift,
                );
                RelocalizationHypothesis {
                    yaw_deg: shift as f32 * step_deg,
                    tx,
                    tz,
                    confidence: clamp01(correlation + bonus),
                    source: HypothesisSource::CoarseSignature,
                }
            })
            .collect();

        // Stable sort keeps the smallest shift first on ties.
        hypotheses.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hypotheses.truncate(self.config.max_hypotheses);

        log::debug!(
            "Coarse match: best yaw {:.0}° conf {:.3} ({} shifts)",
            hypotheses.first().map_or(0.0, |h| h.yaw_deg),
            hypotheses.first().map_or(0.0, |h| h.confidence),
            count
        );

        hypotheses
    }
}

/// Σ saved[i] · live[(i + shift) mod n]
fn circular_correlation(saved: &[f32], live: &[f32], shift: usize) -> f32 {
    let n = saved.len();
    saved
        .iter()
        .enumerate()
        .map(|(i, s)| s * live[(i + shift) % n])
        .sum()
}
