//! Lightweight hypothesis refinement ("ICP-lite").
//!
//! Not a full ICP: the yaw of each coarse hypothesis is kept, its translation
//! is pulled halfway toward the point-cloud centroid offset, and the score is
//! penalized for disagreeing with the device heading and for extent
//! mismatch between the saved and live footprints.
//!
//! # Scoring
//!
//! ```text
//! t_refined = 0.5 · t_hypothesis + 0.5 · (c_saved − c_live)
//! score     = conf − 0.25 · |Δyaw_device| / 180 − 0.05 · min(extent_mismatch, 3 m)
//!
//! confidence = clamp(0.4 · best_coarse + 0.6 · best_score)
//! residual   = (1 − confidence) · 0.35 + 0.03
//! overlap    = confidence · 0.75 + 0.15
//! yaw_conf   = max(6°, 25° − confidence · 18°)
//! ```

use serde::{Deserialize, Serialize};

use crate::core::math::{clamp01, wrap_degrees};
use crate::core::{MeshAnchor, collect_surface_points};
use crate::io::MeshMapArtifact;
use crate::signature::{MeshSignatureDescriptor, downsample};

use super::types::{
    AlignmentNote, AreaHint, HypothesisSource, MeshRelocalizationResult, RelocalizationHypothesis,
};

/// Configuration for the refiner.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefinerConfig {
    /// Maximum points per cloud after down-sampling.
    /// Default: 1200
    #[serde(default = "default_max_points")]
    pub max_points: usize,

    /// Weight of the hypothesis translation in the blend (rest goes to the
    /// centroid offset).
    /// Default: 0.5
    #[serde(default = "default_translation_blend")]
    pub translation_blend: f32,

    /// Penalty per 180° of device-heading disagreement.
    /// Default: 0.25
    #[serde(default = "default_yaw_penalty_weight")]
    pub yaw_penalty_weight: f32,

    /// Penalty per meter of extent mismatch.
    /// Default: 0.05
    #[serde(default = "default_extent_penalty_weight")]
    pub extent_penalty_weight: f32,

    /// Extent mismatch cap (meters).
    /// Default: 3.0
    #[serde(default = "default_extent_mismatch_cap_m")]
    pub extent_mismatch_cap_m: f32,

    /// Weight of the best coarse confidence in the final confidence.
    /// Default: 0.4 (refined score gets the remaining 0.6)
    #[serde(default = "default_coarse_weight")]
    pub coarse_weight: f32,

    /// Residual slope (meters at zero confidence, before the floor).
    /// Default: 0.35
    #[serde(default = "default_residual_scale_m")]
    pub residual_scale_m: f32,

    /// Residual floor noise (meters).
    /// Default: 0.03
    #[serde(default = "default_residual_floor_m")]
    pub residual_floor_m: f32,

    /// Overlap slope.
    /// Default: 0.75
    #[serde(default = "default_overlap_scale")]
    pub overlap_scale: f32,

    /// Overlap offset.
    /// Default: 0.15
    #[serde(default = "default_overlap_offset")]
    pub overlap_offset: f32,

    /// Yaw uncertainty at zero confidence (degrees).
    /// Default: 25.0
    #[serde(default = "default_yaw_confidence_base_deg")]
    pub yaw_confidence_base_deg: f32,

    /// Yaw uncertainty reduction per unit confidence (degrees).
    /// Default: 18.0
    #[serde(default = "default_yaw_confidence_slope_deg")]
    pub yaw_confidence_slope_deg: f32,

    /// Yaw uncertainty floor (degrees).
    /// Default: 6.0
    #[serde(default = "default_yaw_confidence_min_deg")]
    pub yaw_confidence_min_deg: f32,

    /// Margin around the saved bounds that still counts as "near" (meters).
    /// Default: 0.5
    #[serde(default = "default_boundary_margin_m")]
    pub boundary_margin_m: f32,
}

fn default_max_points() -> usize {
    1200
}
fn default_translation_blend() -> f32 {
    0.5
}
fn default_yaw_penalty_weight() -> f32 {
    0.25
}
fn default_extent_penalty_weight() -> f32 {
    0.05
}
fn default_extent_mismatch_cap_m() -> f32 {
    3.0
}
fn default_coarse_weight() -> f32 {
    0.4
}
fn default_residual_scale_m() -> f32 {
    0.35
}
fn default_residual_floor_m() -> f32 {
    0.03
}
fn default_overlap_scale() -> f32 {
    0.75
}
fn default_overlap_offset() -> f32 {
    0.15
}
fn default_yaw_confidence_base_deg() -> f32 {
    25.0
}
fn default_yaw_confidence_slope_deg() -> f32 {
    18.0
}
fn default_yaw_confidence_min_deg() -> f32 {
    6.0
}
fn default_boundary_margin_m() -> f32 {
    0.5
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
            translation_blend: default_translation_blend(),
            yaw_penalty_weight: default_yaw_penalty_weight(),
            extent_penalty_weight: default_extent_penalty_weight(),
            extent_mismatch_cap_m: default_extent_mismatch_cap_m(),
            coarse_weight: default_coarse_weight(),
            residual_scale_m: default_residual_scale_m(),
            residual_floor_m: default_residual_floor_m(),
            overlap_scale: default_overlap_scale(),
            overlap_offset: default_overlap_offset(),
            yaw_confidence_base_deg: default_yaw_confidence_base_deg(),
            yaw_confidence_slope_deg: default_yaw_confidence_slope_deg(),
            yaw_confidence_min_deg: default_yaw_confidence_min_deg(),
            boundary_margin_m: default_boundary_margin_m(),
        }
    }
}

/// Down-sampled cloud summary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudSummary {
    /// XZ centroid
    pub centroid: (f32, f32),
    /// Points after down-sampling
    pub point_count: usize,
}

impl CloudSummary {
    /// Summarize anchors. `None` if no points survive down-sampling.
    pub fn from_anchors(anchors: &[MeshAnchor], max_points: usize) -> Option<Self> {
        let points = downsample(&collect_surface_points(anchors), max_points);
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f32;
        let (sx, sz) = points.iter().fold((0.0f32, 0.0f32), |(sx, sz), p| {
            (sx + p.position[0], sz + p.position[2])
        });
        Some(Self {
            centroid: (sx / n, sz / n),
            point_count: points.len(),
        })
    }
}

/// Saved-map side of refinement, computed once per map load.
#[derive(Clone, Debug)]
pub struct SavedMeshReference {
    /// Descriptor stored in the artifact.
    pub descriptor: MeshSignatureDescriptor,
    /// Down-sampled cloud summary; `None` for an empty artifact.
    pub cloud: Option<CloudSummary>,
}

impl SavedMeshReference {
    /// Precompute from an artifact.
    pub fn from_artifact(artifact: &MeshMapArtifact, max_points: usize) -> Self {
        Self {
            descriptor: artifact.descriptor.clone(),
            cloud: CloudSummary::from_anchors(&artifact.anchors, max_points),
        }
    }
}

/// Live side of refinement for one fallback tick.
#[derive(Clone, Copy, Debug)]
pub struct LiveMeshFrame<'a> {
    /// Live mesh anchors.
    pub anchors: &'a [MeshAnchor],
    /// Descriptor built from `anchors`.
    pub descriptor: &'a MeshSignatureDescriptor,
    /// Current device heading (degrees).
    pub device_yaw_deg: f32,
    /// Frame timestamp (seconds).
    pub timestamp: f64,
}

/// Scores and refines coarse hypotheses into one estimate.
#[derive(Clone, Debug, Default)]
pub struct AlignmentRefiner {
    config: RefinerConfig,
}

impl AlignmentRefiner {
    /// Create a refiner.
    pub fn new(config: RefinerConfig) -> Self {
        Self { config }
    }

    /// Get configuration.
    pub fn config(&self) -> &RefinerConfig {
        &self.config
    }

    /// Refine ranked hypotheses against the saved map.
    ///
    /// Returns `None` if there are no hypotheses or either cloud is empty.
    pub fn refine(
        &self,
        hypotheses: &[RelocalizationHypothesis],
        live: &LiveMeshFrame<'_>,
        saved: &SavedMeshReference,
    ) -> Option<MeshRelocalizationResult> {
        let best_coarse = hypotheses.first()?;
        let saved_cloud = saved.cloud?;
        let live_cloud = CloudSummary::from_anchors(live.anchors, self.config.max_points)?;

        let centroid_dx = saved_cloud.centroid.0 - live_cloud.centroid.0;
        let centroid_dz = saved_cloud.centroid.1 - live_cloud.centroid.1;

        let extent_mismatch = ((saved.descriptor.bounds.width() - live.descriptor.bounds.width())
            .abs()
            + (saved.descriptor.bounds.depth() - live.descriptor.bounds.depth()).abs())
        .min(self.config.extent_mismatch_cap_m);
        let extent_penalty = self.config.extent_penalty_weight * extent_mismatch;

        let blend = self.config.translation_blend;
        let mut best: Option<(RelocalizationHypothesis, f32)> = None;

        for hypothesis in hypotheses {
            let yaw_delta = wrap_degrees(hypothesis.yaw_deg - live.device_yaw_deg).abs();
            let yaw_penalty = self.config.yaw_penalty_weight * yaw_delta / 180.0;
            // Ranked unclamped so penalties still order weak hypotheses.
            let score = hypothesis.confidence - yaw_penalty - extent_penalty;

            let refined = RelocalizationHypothesis {
                yaw_deg: hypothesis.yaw_deg,
                tx: blend * hypothesis.tx + (1.0 - blend) * centroid_dx,
                tz: blend * hypothesis.tz + (1.0 - blend) * centroid_dz,
                confidence: clamp01(score),
                source: HypothesisSource::CentroidRefined,
            };

            if best.as_ref().is_none_or(|(_, s)| score > *s) {
                best = Some((refined, score));
            }
        }

        let (refined, refined_score) = best?;

        let yaw_penalty =
            self.config.yaw_penalty_weight * wrap_degrees(refined.yaw_deg - live.device_yaw_deg).abs()
                / 180.0;
        let note = if yaw_penalty > 0.1 {
            AlignmentNote::LargeYawPenalty
        } else if extent_mismatch >= 1.0 {
            AlignmentNote::ExtentMismatch
        } else {
            AlignmentNote::Refined
        };

        let confidence = clamp01(
            self.config.coarse_weight * best_coarse.confidence
                + (1.0 - self.config.coarse_weight) * refined_score,
        );
        let residual_m = ((1.0 - confidence) * self.config.residual_scale_m
            + self.config.residual_floor_m)
            .max(self.config.residual_floor_m);
        let overlap = clamp01(confidence * self.config.overlap_scale + self.config.overlap_offset);
        let yaw_confidence_deg = (self.config.yaw_confidence_base_deg
            - confidence * self.config.yaw_confidence_slope_deg)
            .max(self.config.yaw_confidence_min_deg);

        let area_hint = self.area_hint(&refined, live_cloud.centroid, &saved.descriptor);

        log::debug!(
            "Refined: yaw {:.0}° t=({:.2}, {:.2}) conf {:.3} residual {:.3}m",
            refined.yaw_deg,
            refined.tx,
            refined.tz,
            confidence,
            residual_m
        );

        Some(MeshRelocalizationResult {
            coarse: best_coarse.clone(),
            orientation_hint_deg: wrap_degrees(refined.yaw_deg),
            refined: Some(refined),
            area_hint,
            confidence,
            residual_m,
            overlap,
            yaw_confidence_deg,
            supporting_points: saved_cloud.point_count.min(live_cloud.point_count),
            is_stable: false,
            note,
            timestamp: live.timestamp,
        })
    }

    fn area_hint(
        &self,
        refined: &RelocalizationHypothesis,
        live_centroid: (f32, f32),
        saved: &MeshSignatureDescriptor,
    ) -> AreaHint {
        let (x, z) = refined
            .transform()
            .apply_point(live_centroid.0, live_centroid.1);
        if saved.bounds.contains(x, z, 0.0) {
            AreaHint::WithinMappedArea
        } else if saved.bounds.contains(x, z, self.config.boundary_margin_m) {
            AreaHint::NearBoundary
        } else {
            AreaHint::OutsideMappedArea
        }
    }
}
