//! Native-vs-mesh conflict detection with hysteresis.

use serde::{Deserialize, Serialize};

use crate::core::math::angle_diff_degrees;
use crate::core::{PlanarPose, TrackingState};

/// Configuration for the conflict reconciler.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConflictConfig {
    /// Position delta still counted as agreement (meters, inclusive).
    /// Default: 0.75
    #[serde(default = "default_max_position_delta_m")]
    pub max_position_delta_m: f32,

    /// Yaw delta still counted as agreement (degrees, inclusive).
    /// Default: 25.0
    #[serde(default = "default_max_yaw_delta_deg")]
    pub max_yaw_delta_deg: f32,

    /// Native confidence above which the native tracker is trusted over a
    /// weak mesh acceptance.
    /// Default: 0.9
    #[serde(default = "default_trust_native_confidence")]
    pub trust_native_confidence: f32,

    /// Acceptance confidence below which the mesh is considered weak.
    /// Default: 0.82
    #[serde(default = "default_weak_mesh_confidence")]
    pub weak_mesh_confidence: f32,

    /// Consecutive disagreeing frames that declare a conflict.
    /// Default: 5
    #[serde(default = "default_conflict_frames")]
    pub conflict_frames: u32,
}

fn default_max_position_delta_m() -> f32 {
    0.75
}
fn default_max_yaw_delta_deg() -> f32 {
    25.0
}
fn default_trust_native_confidence() -> f32 {
    0.9
}
fn default_weak_mesh_confidence() -> f32 {
    0.82
}
fn default_conflict_frames() -> u32 {
    5
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            max_position_delta_m: default_max_position_delta_m(),
            max_yaw_delta_deg: default_max_yaw_delta_deg(),
            trust_native_confidence: default_trust_native_confidence(),
            weak_mesh_confidence: default_weak_mesh_confidence(),
            conflict_frames: default_conflict_frames(),
        }
    }
}

/// Recorded disagreement between the two sources.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalizationConflictSnapshot {
    /// Planar position delta (meters).
    pub position_delta_m: f32,
    /// Wrapped yaw delta in [-180, 180] (degrees).
    pub yaw_delta_deg: f32,
    /// Native tracking state when the conflict was declared.
    pub native_state: TrackingState,
    /// Mesh confidence at acceptance time.
    pub mesh_confidence: f32,
    /// Detection time (seconds).
    pub timestamp: f64,
}

/// One comparison between native and mesh estimates.
#[derive(Clone, Copy, Debug)]
pub struct ConflictObservation {
    /// Pose reported by the native tracker.
    pub native_pose: PlanarPose,
    /// Pose implied by the accepted mesh alignment.
    pub mesh_pose: PlanarPose,
    /// Native tracking state.
    pub native_state: TrackingState,
    /// Native confidence estimate.
    pub native_confidence: f32,
    /// Mesh confidence at acceptance time.
    pub mesh_confidence: f32,
    /// Frame time (seconds).
    pub timestamp: f64,
}

/// Outcome of one comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum ConflictVerdict {
    /// Sources agree; counter reset.
    Consistent,
    /// Sources disagree but the native tracker is confident and the mesh is
    /// weak; counter reset.
    TrustNative,
    /// Sources disagree; not yet a conflict.
    Disagreeing {
        /// Consecutive disagreeing frames so far.
        count: u32,
    },
    /// Sources disagreed for long enough.
    Conflict(LocalizationConflictSnapshot),
}

/// Compares native and mesh estimates with a consecutive-frame counter.
#[derive(Clone, Debug, Default)]
pub struct ConflictReconciler {
    config: ConflictConfig,
    disagreements: u32,
}

impl ConflictReconciler {
    /// Create a reconciler.
    pub fn new(config: ConflictConfig) -> Self {
        Self {
            config,
            disagreements: 0,
        }
    }

    /// Get configuration.
    pub fn config(&self) -> &ConflictConfig {
        &self.config
    }

    /// Consecutive disagreeing frames.
    pub fn disagreement_count(&self) -> u32 {
        self.disagreements
    }

    /// Compare one observation.
    pub fn evaluate(&mut self, obs: &ConflictObservation) -> ConflictVerdict {
        let position_delta_m = obs.native_pose.distance(&obs.mesh_pose);
        let yaw_delta_deg = angle_diff_degrees(obs.mesh_pose.yaw_deg, obs.native_pose.yaw_deg);

        if position_delta_m <= self.config.max_position_delta_m
            && yaw_delta_deg.abs() <= self.config.max_yaw_delta_deg
        {
            self.disagreements = 0;
            return ConflictVerdict::Consistent;
        }

        self.disagreements += 1;

        if obs.native_confidence > self.config.trust_native_confidence
            && obs.mesh_confidence < self.config.weak_mesh_confidence
        {
            log::info!(
                "Conflict: trusting native tracker (native {:.2}, mesh {:.2})",
                obs.native_confidence,
                obs.mesh_confidence
            );
            self.disagreements = 0;
            return ConflictVerdict::TrustNative;
        }

        if self.disagreements >= self.config.conflict_frames {
            log::warn!(
                "Conflict: {} consecutive disagreements (Δpos {:.2}m, Δyaw {:.1}°)",
                self.disagreements,
                position_delta_m,
                yaw_delta_deg
            );
            return ConflictVerdict::Conflict(LocalizationConflictSnapshot {
                position_delta_m,
                yaw_delta_deg,
                native_state: obs.native_state,
                mesh_confidence: obs.mesh_confidence,
                timestamp: obs.timestamp,
            });
        }

        ConflictVerdict::Disagreeing {
            count: self.disagreements,
        }
    }

    /// Clear the disagreement counter.
    pub fn reset(&mut self) {
        self.disagreements = 0;
    }
}
