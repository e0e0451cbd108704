//! Attempt escalation state machine.

use serde::{Deserialize, Serialize};

use crate::core::math::{angle_diff_degrees, median_u32, saturating_ratio};
use crate::core::{BoundedHistory, FrameInput};

/// Slack on the sweep threshold for yaw read back through trig.
const ROTATION_TOLERANCE_DEG: f64 = 0.01;

/// Guidance/strategy mode of the current attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptMode {
    /// Stand still and turn a full circle.
    #[default]
    Stationary360,
    /// Small translations around the room; fallbacks become eligible.
    MicroMovementFallback,
}

/// Configuration for the attempt state machine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttemptConfig {
    /// Rotation required before escalating (degrees).
    /// Default: 330.0
    #[serde(default = "default_escalation_rotation_deg")]
    pub escalation_rotation_deg: f32,

    /// Time in the sweep mode before escalating (seconds). Also the sweep
    /// mode timeout.
    /// Default: 10.0
    #[serde(default = "default_escalation_min_elapsed_s")]
    pub escalation_min_elapsed_s: f64,

    /// Feature-point median required to escalate.
    /// Default: 120
    #[serde(default = "default_escalation_min_feature_median")]
    pub escalation_min_feature_median: u32,

    /// Micro-movement time after which fallbacks trigger regardless of
    /// features (seconds). Also the micro-movement mode timeout.
    /// Default: 14.0
    #[serde(default = "default_fallback_timeout_s")]
    pub fallback_timeout_s: f64,

    /// Micro-movement time after which fallbacks trigger early if features
    /// are rich (seconds).
    /// Default: 8.0
    #[serde(default = "default_fallback_early_elapsed_s")]
    pub fallback_early_elapsed_s: f64,

    /// Feature-point median required for the early trigger.
    /// Default: 180
    #[serde(default = "default_fallback_early_feature_median")]
    pub fallback_early_feature_median: u32,

    /// Feature-count median window (samples).
    /// Default: 60
    #[serde(default = "default_feature_window")]
    pub feature_window: usize,

    /// Stable frames that saturate the quality term.
    /// Default: 20
    #[serde(default = "default_quality_stable_frames")]
    pub quality_stable_frames: u32,

    /// Feature median that saturates the quality term.
    /// Default: 300
    #[serde(default = "default_quality_feature_median")]
    pub quality_feature_median: u32,

    /// Rotation that saturates the quality term (degrees).
    /// Default: 360.0
    #[serde(default = "default_quality_rotation_deg")]
    pub quality_rotation_deg: f32,
}

fn default_escalation_rotation_deg() -> f32 {
    330.0
}
fn default_escalation_min_elapsed_s() -> f64 {
    10.0
}
fn default_escalation_min_feature_median() -> u32 {
    120
}
fn default_fallback_timeout_s() -> f64 {
    14.0
}
fn default_fallback_early_elapsed_s() -> f64 {
    8.0
}
fn default_fallback_early_feature_median() -> u32 {
    180
}
fn default_feature_window() -> usize {
    60
}
fn default_quality_stable_frames() -> u32 {
    20
}
fn default_quality_feature_median() -> u32 {
    300
}
fn default_quality_rotation_deg() -> f32 {
    360.0
}

impl Default for AttemptConfig {
    fn default() -> Self {
        Self {
            escalation_rotation_deg: default_escalation_rotation_deg(),
            escalation_min_elapsed_s: default_escalation_min_elapsed_s(),
            escalation_min_feature_median: default_escalation_min_feature_median(),
            fallback_timeout_s: default_fallback_timeout_s(),
            fallback_early_elapsed_s: default_fallback_early_elapsed_s(),
            fallback_early_feature_median: default_fallback_early_feature_median(),
            feature_window: default_feature_window(),
            quality_stable_frames: default_quality_stable_frames(),
            quality_feature_median: default_quality_feature_median(),
            quality_rotation_deg: default_quality_rotation_deg(),
        }
    }
}

/// Snapshot of the attempt's bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelocalizationAttemptState {
    /// Current mode.
    pub mode: AttemptMode,
    /// Attempt start (seconds).
    pub attempt_started_at: f64,
    /// Mode start (seconds).
    pub mode_started_at: f64,
    /// Accumulated absolute yaw change (degrees).
    pub accumulated_rotation_deg: f32,
    /// Median feature-point count over the window.
    pub feature_median: u32,
    /// Native tracker reported `Limited(Relocalizing)` at least once.
    pub saw_relocalizing: bool,
    /// Consecutive `Normal` tracking frames.
    pub stable_frames: u32,
    /// Timeout of the current mode (seconds).
    pub mode_timeout_s: f64,
}

/// External conditions for a fallback trigger.
#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackContext {
    /// A saved artifact for this fallback exists.
    pub artifact_available: bool,
    /// The native tracker already restored the map.
    pub native_localized: bool,
    /// This fallback is already running.
    pub already_active: bool,
    /// The mesh fallback is running (room fallback yields to it).
    pub mesh_active: bool,
}

/// Decides when to escalate guidance and when fallbacks may run.
///
/// `Stationary360 → MicroMovementFallback` is one-way within an attempt;
/// only [`start`](Self::start) goes back.
#[derive(Clone, Debug)]
pub struct RelocalizationAttemptStateMachine {
    config: AttemptConfig,
    started: bool,
    mode: AttemptMode,
    attempt_started_at: f64,
    mode_started_at: f64,
    accumulated_rotation_deg: f64,
    last_yaw_deg: Option<f32>,
    features: BoundedHistory<u32>,
    feature_median: u32,
    saw_relocalizing: bool,
    saw_not_normal: bool,
    stable_frames: u32,
}

impl Default for RelocalizationAttemptStateMachine {
    fn default() -> Self {
        Self::new(AttemptConfig::default())
    }
}

impl RelocalizationAttemptStateMachine {
    /// Create an idle state machine; call [`start`](Self::start) to begin.
    pub fn new(config: AttemptConfig) -> Self {
        let features = BoundedHistory::new(config.feature_window);
        Self {
            config,
            started: false,
            mode: AttemptMode::Stationary360,
            attempt_started_at: 0.0,
            mode_started_at: 0.0,
            accumulated_rotation_deg: 0.0,
            last_yaw_deg: None,
            features,
            feature_median: 0,
            saw_relocalizing: false,
            saw_not_normal: false,
            stable_frames: 0,
        }
    }

    /// Get configuration.
    pub fn config(&self) -> &AttemptConfig {
        &self.config
    }

    /// Whether an attempt is running.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Current mode.
    pub fn mode(&self) -> AttemptMode {
        self.mode
    }

    /// Whether the attempt has seen `Limited(Relocalizing)`.
    pub fn saw_relocalizing(&self) -> bool {
        self.saw_relocalizing
    }

    /// Consecutive `Normal` tracking frames.
    pub fn stable_frames(&self) -> u32 {
        self.stable_frames
    }

    /// Current feature-point median.
    pub fn feature_median(&self) -> u32 {
        self.feature_median
    }

    /// Accumulated rotation (degrees).
    pub fn accumulated_rotation_deg(&self) -> f32 {
        self.accumulated_rotation_deg as f32
    }

    /// Whether any frame since [`start`](Self::start) was not `Normal`.
    ///
    /// A `Normal` frame only counts as a restored map after the tracker
    /// has dropped out of `Normal` for the load.
    pub fn saw_not_normal(&self) -> bool {
        self.saw_not_normal
    }

    /// Seconds spent in the current mode.
    pub fn mode_elapsed(&self, now: f64) -> f64 {
        (now - self.mode_started_at).max(0.0)
    }

    /// Timeout of the current mode (seconds).
    pub fn mode_timeout_s(&self) -> f64 {
        match self.mode {
            AttemptMode::Stationary360 => self.config.escalation_min_elapsed_s,
            AttemptMode::MicroMovementFallback => self.config.fallback_timeout_s,
        }
    }

    /// Bookkeeping snapshot.
    pub fn state(&self) -> RelocalizationAttemptState {
        RelocalizationAttemptState {
            mode: self.mode,
            attempt_started_at: self.attempt_started_at,
            mode_started_at: self.mode_started_at,
            accumulated_rotation_deg: self.accumulated_rotation_deg(),
            feature_median: self.feature_median,
            saw_relocalizing: self.saw_relocalizing,
            stable_frames: self.stable_frames,
            mode_timeout_s: self.mode_timeout_s(),
        }
    }

    /// Begin a fresh attempt, discarding all metrics.
    pub fn start(&mut self, now: f64) {
        self.reset();
        self.started = true;
        self.attempt_started_at = now;
        self.mode_started_at = now;
        log::info!("Attempt: started at {:.2}s in {:?}", now, self.mode);
    }

    /// Return to idle.
    pub fn reset(&mut self) {
        self.started = false;
        self.mode = AttemptMode::Stationary360;
        self.attempt_started_at = 0.0;
        self.mode_started_at = 0.0;
        self.accumulated_rotation_deg = 0.0;
        self.last_yaw_deg = None;
        self.features.clear();
        self.feature_median = 0;
        self.saw_relocalizing = false;
        self.saw_not_normal = false;
        self.stable_frames = 0;
    }

    /// Fold one frame into the attempt metrics.
    pub fn update_metrics(&mut self, frame: &FrameInput) {
        let yaw = frame.device_pose.yaw_degrees();
        if let Some(last) = self.last_yaw_deg {
            self.accumulated_rotation_deg += f64::from(angle_diff_degrees(yaw, last).abs());
        }
        self.last_yaw_deg = Some(yaw);

        if frame.tracking.is_relocalizing() {
            self.saw_relocalizing = true;
        }

        if frame.tracking.is_normal() {
            self.stable_frames = self.stable_frames.saturating_add(1);
        } else {
            self.saw_not_normal = true;
            self.stable_frames = 0;
        }

        self.features.push(frame.feature_points);
        self.feature_median = median_u32(self.features.iter().copied());
    }

    /// Whether the sweep has done its job without the native tracker
    /// localizing.
    pub fn should_escalate(&self, now: f64, native_localized: bool) -> bool {
        self.started
            && self.mode == AttemptMode::Stationary360
            && !native_localized
            && self.accumulated_rotation_deg + ROTATION_TOLERANCE_DEG
                >= f64::from(self.config.escalation_rotation_deg)
            && self.mode_elapsed(now) >= self.config.escalation_min_elapsed_s
            && self.feature_median >= self.config.escalation_min_feature_median
    }

    /// Switch to micro-movement and restart the mode clock.
    pub fn escalate(&mut self, now: f64) {
        if self.mode == AttemptMode::MicroMovementFallback {
            return;
        }
        log::info!(
            "Attempt: escalating to micro-movement after {:.1}s ({:.0}° rotation, median {} features)",
            self.mode_elapsed(now),
            self.accumulated_rotation_deg,
            self.feature_median
        );
        self.mode = AttemptMode::MicroMovementFallback;
        self.mode_started_at = now;
    }

    /// Whether the mesh-geometry fallback should start now.
    pub fn should_trigger_mesh_fallback(&self, now: f64, ctx: FallbackContext) -> bool {
        ctx.artifact_available
            && !ctx.native_localized
            && !ctx.already_active
            && self.fallback_window_open(now)
    }

    /// Whether the room-signature fallback should start now.
    pub fn should_trigger_room_signature_fallback(&self, now: f64, ctx: FallbackContext) -> bool {
        ctx.artifact_available
            && !ctx.native_localized
            && !ctx.already_active
            && !ctx.mesh_active
            && self.fallback_window_open(now)
    }

    fn fallback_window_open(&self, now: f64) -> bool {
        if !self.started || self.mode != AttemptMode::MicroMovementFallback {
            return false;
        }
        let elapsed = self.mode_elapsed(now);
        elapsed >= self.config.fallback_timeout_s
            || (elapsed >= self.config.fallback_early_elapsed_s
                && self.feature_median >= self.config.fallback_early_feature_median)
    }

    /// Attempt quality in [0, 1].
    pub fn quality_score(&self) -> f32 {
        let relocalizing = if self.saw_relocalizing { 0.20 } else { 0.0 };
        let stable = saturating_ratio(
            self.stable_frames as f32,
            self.config.quality_stable_frames as f32,
        );
        let features = saturating_ratio(
            self.feature_median as f32,
            self.config.quality_feature_median as f32,
        );
        let rotation =
            saturating_ratio(self.accumulated_rotation_deg(), self.config.quality_rotation_deg);
        (relocalizing + 0.35 * stable + 0.25 * features + 0.20 * rotation).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LimitedReason, TrackingState, Transform3D};
    use approx::assert_relative_eq;

    fn frame(t: f64, yaw: f32, tracking: TrackingState, features: u32) -> FrameInput {
        FrameInput::new(
            t,
            Transform3D::from_yaw_translation(yaw, [0.0, 1.4, 0.0]),
            tracking,
        )
        .with_feature_points(features)
    }

    const RELOC: TrackingState = TrackingState::Limited(LimitedReason::Relocalizing);

    /// Sweep `total_deg` in 11 equal steps over 10 s.
    fn sweep(sm: &mut RelocalizationAttemptStateMachine, features: u32, total_deg: f32) {
        for i in 0..=11 {
            let yaw = i as f32 * total_deg / 11.0;
            sm.update_metrics(&frame(i as f64 * 10.0 / 11.0, yaw, RELOC, features));
        }
    }

    /// Sweep `steps` increments of `step_deg` over 10 s.
    fn sweep_steps(
        sm: &mut RelocalizationAttemptStateMachine,
        features: u32,
        steps: u32,
        step_deg: f32,
    ) {
        for i in 0..=steps {
            let t = i as f64 * 10.0 / steps as f64;
            sm.update_metrics(&frame(t, i as f32 * step_deg, RELOC, features));
        }
    }

    #[test]
    fn test_exact_sweep_escalates() {
        // Yaw read back from a pose matrix drifts a few ulps below the step.
        let mut coarse = RelocalizationAttemptStateMachine::default();
        coarse.start(0.0);
        sweep_steps(&mut coarse, 150, 11, 30.0);
        assert!(coarse.should_escalate(10.0, false));

        let mut fine = RelocalizationAttemptStateMachine::default();
        fine.start(0.0);
        sweep_steps(&mut fine, 150, 110, 3.0);
        assert_relative_eq!(fine.accumulated_rotation_deg(), 330.0, epsilon = 1e-2);
        assert!(fine.should_escalate(10.0, false));
    }

    #[test]
    fn test_exact_sweep_needs_features() {
        let mut sm = RelocalizationAttemptStateMachine::default();
        sm.start(0.0);
        sweep_steps(&mut sm, 100, 110, 3.0);
        assert!(!sm.should_escalate(10.0, false));
    }

    #[test]
    fn test_short_sweep_does_not_escalate() {
        let mut sm = RelocalizationAttemptStateMachine::default();
        sm.start(0.0);
        sweep(&mut sm, 150, 329.9);
        assert!(!sm.should_escalate(10.0, false));
    }

    #[test]
    fn test_saw_not_normal() {
        let mut sm = RelocalizationAttemptStateMachine::default();
        sm.start(0.0);
        sm.update_metrics(&frame(0.0, 0.0, TrackingState::Normal, 0));
        assert!(!sm.saw_not_normal());
        let initializing = TrackingState::Limited(LimitedReason::Initializing);
        sm.update_metrics(&frame(0.1, 0.0, initializing, 0));
        sm.update_metrics(&frame(0.2, 0.0, TrackingState::Normal, 0));
        assert!(sm.saw_not_normal());
        assert!(!sm.saw_relocalizing());

        sm.start(1.0);
        assert!(!sm.saw_not_normal());
    }

    #[test]
    fn test_escalation_boundaries() {
        let mut sm = RelocalizationAttemptStateMachine::default();
        sm.start(0.0);
        sweep(&mut sm, 150, 330.5);
        assert_relative_eq!(sm.accumulated_rotation_deg(), 330.5, epsilon = 1e-2);

        assert!(!sm.should_escalate(9.99, false));
        assert!(sm.should_escalate(10.0, false));
        assert!(!sm.should_escalate(10.0, true));

        sm.escalate(10.0);
        assert_eq!(sm.mode(), AttemptMode::MicroMovementFallback);
        assert_eq!(sm.mode_elapsed(10.0), 0.0);
        assert!(!sm.should_escalate(30.0, false));
    }

    #[test]
    fn test_low_features_block_escalation() {
        let mut sm = RelocalizationAttemptStateMachine::default();
        sm.start(0.0);
        sweep(&mut sm, 100, 330.5);
        assert_eq!(sm.feature_median(), 100);
        assert!(!sm.should_escalate(10.0, false));
    }

    #[test]
    fn test_insufficient_rotation_blocks_escalation() {
        let mut sm = RelocalizationAttemptStateMachine::default();
        sm.start(0.0);
        sweep(&mut sm, 200, 329.5);
        assert!(!sm.should_escalate(12.0, false));
    }

    #[test]
    fn test_fallback_triggers() {
        let mut sm = RelocalizationAttemptStateMachine::default();
        sm.start(0.0);
        let ctx = FallbackContext {
            artifact_available: true,
            ..Default::default()
        };
        // Not in micro mode yet.
        assert!(!sm.should_trigger_mesh_fallback(100.0, ctx));

        sm.escalate(10.0);
        sm.update_metrics(&frame(10.0, 0.0, RELOC, 100));
        assert!(!sm.should_trigger_mesh_fallback(23.9, ctx));
        assert!(sm.should_trigger_mesh_fallback(24.0, ctx));

        // Early path with rich features.
        sm.update_metrics(&frame(11.0, 0.0, RELOC, 200));
        sm.update_metrics(&frame(12.0, 0.0, RELOC, 200));
        assert!(sm.should_trigger_mesh_fallback(18.0, ctx));
        assert!(!sm.should_trigger_mesh_fallback(17.9, ctx));

        let localized = FallbackContext {
            native_localized: true,
            ..ctx
        };
        assert!(!sm.should_trigger_mesh_fallback(30.0, localized));
        let active = FallbackContext {
            already_active: true,
            ..ctx
        };
        assert!(!sm.should_trigger_mesh_fallback(30.0, active));
        let no_artifact = FallbackContext::default();
        assert!(!sm.should_trigger_mesh_fallback(30.0, no_artifact));
    }

    #[test]
    fn test_room_fallback_yields_to_mesh() {
        let mut sm = RelocalizationAttemptStateMachine::default();
        sm.start(0.0);
        sm.escalate(0.0);
        let ctx = FallbackContext {
            artifact_available: true,
            ..Default::default()
        };
        assert!(sm.should_trigger_room_signature_fallback(14.0, ctx));
        let mesh = FallbackContext {
            mesh_active: true,
            ..ctx
        };
        assert!(!sm.should_trigger_room_signature_fallback(14.0, mesh));
    }

    #[test]
    fn test_stable_frames_reset_and_relocalizing_flag() {
        let mut sm = RelocalizationAttemptStateMachine::default();
        sm.start(0.0);
        sm.update_metrics(&frame(0.0, 0.0, TrackingState::Normal, 0));
        sm.update_metrics(&frame(0.1, 0.0, TrackingState::Normal, 0));
        assert_eq!(sm.stable_frames(), 2);
        assert!(!sm.saw_relocalizing());
        sm.update_metrics(&frame(0.2, 0.0, RELOC, 0));
        assert_eq!(sm.stable_frames(), 0);
        assert!(sm.saw_relocalizing());
    }

    #[test]
    fn test_rotation_wraps() {
        let mut sm = RelocalizationAttemptStateMachine::default();
        sm.start(0.0);
        sm.update_metrics(&frame(0.0, 170.0, RELOC, 0));
        sm.update_metrics(&frame(0.1, -170.0, RELOC, 0));
        assert_relative_eq!(sm.accumulated_rotation_deg(), 20.0, epsilon = 1e-3);
    }

    #[test]
    fn test_quality_score() {
        let mut sm = RelocalizationAttemptStateMachine::default();
        sm.start(0.0);
        assert_relative_eq!(sm.quality_score(), 0.0);

        for i in 0..=12 {
            sm.update_metrics(&frame(i as f64, i as f32 * 30.0, RELOC, 300));
        }
        for i in 0..20 {
            sm.update_metrics(&frame(13.0 + i as f64, 0.0, TrackingState::Normal, 300));
        }
        assert_relative_eq!(sm.quality_score(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_start_resets() {
        let mut sm = RelocalizationAttemptStateMachine::default();
        sm.start(0.0);
        sweep(&mut sm, 150, 330.5);
        sm.escalate(10.0);
        sm.start(50.0);
        let state = sm.state();
        assert_eq!(state.mode, AttemptMode::Stationary360);
        assert_eq!(state.accumulated_rotation_deg, 0.0);
        assert_eq!(state.attempt_started_at, 50.0);
        assert!(!state.saw_relocalizing);
        assert_eq!(state.mode_timeout_s, 10.0);
    }
}
