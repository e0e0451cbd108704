//! Mesh alignment type definitions.

use serde::{Deserialize, Serialize};

use crate::core::PlanarTransform;
use crate::core::math::wrap_degrees;

/// Where a hypothesis came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HypothesisSource {
    /// Circular correlation of signature descriptors.
    CoarseSignature,
    /// Coarse hypothesis blended with the point-cloud centroid offset.
    CentroidRefined,
}

/// A candidate map-from-session alignment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelocalizationHypothesis {
    /// Yaw offset (degrees).
    pub yaw_deg: f32,
    /// X translation (meters).
    pub tx: f32,
    /// Z translation (meters).
    pub tz: f32,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Provenance.
    pub source: HypothesisSource,
}

impl RelocalizationHypothesis {
    /// As a planar transform.
    pub fn transform(&self) -> PlanarTransform {
        PlanarTransform::new(self.yaw_deg, self.tx, self.tz)
    }

    /// Wrapped yaw difference to another hypothesis (degrees, absolute).
    pub fn yaw_distance(&self, other: &RelocalizationHypothesis) -> f32 {
        wrap_degrees(other.yaw_deg - self.yaw_deg).abs()
    }

    /// Planar translation difference to another hypothesis (meters).
    pub fn translation_distance(&self, other: &RelocalizationHypothesis) -> f32 {
        let dx = self.tx - other.tx;
        let dz = self.tz - other.tz;
        (dx * dx + dz * dz).sqrt()
    }
}

/// Whether the live centroid falls inside the saved map's footprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaHint {
    /// Inside the saved bounds.
    WithinMappedArea,
    /// Inside the bounds expanded by the boundary margin.
    NearBoundary,
    /// Outside the saved footprint.
    OutsideMappedArea,
}

/// Diagnostic note attached to a refinement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentNote {
    /// Best hypothesis kept its coarse yaw and gained a refined translation.
    Refined,
    /// Device heading disagreed strongly with the winning yaw.
    LargeYawPenalty,
    /// Saved and live extents differ substantially.
    ExtentMismatch,
}

/// Output of one mesh matching attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshRelocalizationResult {
    /// Best coarse hypothesis.
    pub coarse: RelocalizationHypothesis,
    /// Refined pose seed, if refinement produced one.
    pub refined: Option<RelocalizationHypothesis>,
    /// Signed yaw the user/session is off by (degrees).
    pub orientation_hint_deg: f32,
    /// Live centroid relative to the saved footprint.
    pub area_hint: AreaHint,
    /// Overall confidence in [0, 1].
    pub confidence: f32,
    /// Estimated residual alignment error (meters).
    pub residual_m: f32,
    /// Estimated overlap ratio in [0, 1].
    pub overlap: f32,
    /// Yaw uncertainty (degrees, smaller is better).
    pub yaw_confidence_deg: f32,
    /// Points supporting the estimate.
    pub supporting_points: usize,
    /// Whether the result passed the single-frame acceptance gate.
    pub is_stable: bool,
    /// Diagnostic note.
    pub note: AlignmentNote,
    /// Timestamp of the frame this was computed from (seconds).
    pub timestamp: f64,
}

/// A mesh alignment that passed single-frame and multi-frame checks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshAlignmentAcceptance {
    /// Map-from-session correction.
    pub map_from_session: PlanarTransform,
    /// Mean confidence of the supporting results.
    pub confidence: f32,
    /// Mean residual (meters).
    pub residual_m: f32,
    /// Mean overlap.
    pub overlap: f32,
    /// Mean yaw uncertainty (degrees).
    pub yaw_confidence_deg: f32,
    /// Timestamp of acceptance (seconds).
    pub timestamp: f64,
    /// Number of frames that agreed.
    pub supporting_frames: usize,
}
