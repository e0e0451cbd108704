//! Pose-jump monitor and native confidence estimate.
//!
//! The native tracker reports no confidence of its own during
//! relocalization, so a number is derived from its discrete states.

use serde::{Deserialize, Serialize};

use crate::core::math::saturating_ratio;
use crate::core::{PlanarPose, TrackingState, WorldMappingStatus};

/// Configuration for the pose-jump monitor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoseStabilityConfig {
    /// Largest inter-frame position jump still considered stable (meters).
    /// Default: 0.25
    #[serde(default = "default_max_jump_m")]
    pub max_jump_m: f32,

    /// Largest inter-frame heading jump still considered stable (degrees).
    /// Default: 20.0
    #[serde(default = "default_max_yaw_jump_deg")]
    pub max_yaw_jump_deg: f32,
}

fn default_max_jump_m() -> f32 {
    0.25
}
fn default_max_yaw_jump_deg() -> f32 {
    20.0
}

impl Default for PoseStabilityConfig {
    fn default() -> Self {
        Self {
            max_jump_m: default_max_jump_m(),
            max_yaw_jump_deg: default_max_yaw_jump_deg(),
        }
    }
}

/// Flags frames where the device pose teleports or tracking is gone.
#[derive(Clone, Debug, Default)]
pub struct PoseStabilityMonitor {
    config: PoseStabilityConfig,
    last_pose: Option<PlanarPose>,
    stable: bool,
}

impl PoseStabilityMonitor {
    /// Create a monitor.
    pub fn new(config: PoseStabilityConfig) -> Self {
        Self {
            config,
            last_pose: None,
            stable: false,
        }
    }

    /// Result of the most recent update.
    pub fn is_stable(&self) -> bool {
        self.stable
    }

    /// Feed one frame and return whether the pose is stable.
    ///
    /// The first frame after a reset is stable unless tracking is
    /// unavailable.
    pub fn update(&mut self, pose: PlanarPose, tracking: TrackingState) -> bool {
        let jump_ok = self.last_pose.is_none_or(|last| {
            last.distance(&pose) <= self.config.max_jump_m
                && last.yaw_delta(&pose) <= self.config.max_yaw_jump_deg
        });
        self.last_pose = Some(pose);
        self.stable = tracking != TrackingState::NotAvailable && jump_ok;
        self.stable
    }

    /// Forget the previous pose.
    pub fn reset(&mut self) {
        self.last_pose = None;
        self.stable = false;
    }
}

/// Configuration for the native confidence estimate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NativeConfidenceConfig {
    /// Confidence of `Normal` tracking with no stable history.
    /// Default: 0.6
    #[serde(default = "default_normal_base")]
    pub normal_base: f32,

    /// Confidence added once the stable-frame count saturates.
    /// Default: 0.4
    #[serde(default = "default_stable_bonus")]
    pub stable_bonus: f32,

    /// Stable frames that saturate the bonus.
    /// Default: 20
    #[serde(default = "default_stable_frames")]
    pub stable_frames: u32,

    /// Confidence while tracking is limited.
    /// Default: 0.3
    #[serde(default = "default_limited_confidence")]
    pub limited_confidence: f32,
}

fn default_normal_base() -> f32 {
    0.6
}
fn default_stable_bonus() -> f32 {
    0.4
}
fn default_stable_frames() -> u32 {
    20
}
fn default_limited_confidence() -> f32 {
    0.3
}

impl Default for NativeConfidenceConfig {
    fn default() -> Self {
        Self {
            normal_base: default_normal_base(),
            stable_bonus: default_stable_bonus(),
            stable_frames: default_stable_frames(),
            limited_confidence: default_limited_confidence(),
        }
    }
}

impl NativeConfidenceConfig {
    /// Estimate native confidence in [0, 1].
    pub fn estimate(
        &self,
        tracking: TrackingState,
        mapping: WorldMappingStatus,
        stable_frames: u32,
    ) -> f32 {
        let value = match tracking {
            TrackingState::Normal => {
                let stable = saturating_ratio(stable_frames as f32, self.stable_frames as f32);
                (self.normal_base + self.stable_bonus * stable) * mapping.confidence_factor()
            }
            TrackingState::Limited(_) => self.limited_confidence,
            TrackingState::NotAvailable => 0.0,
        };
        value.clamp(0.0, 1.0)
    }
}
