//! App-level localization state machine.

use serde::{Deserialize, Serialize};

use crate::alignment::{
    AlignmentStabilizer, MeshAlignmentAcceptance, MeshRelocalizationResult, StabilizerConfig,
    StabilizerRejection,
};
use crate::core::math::clamp01;
use crate::core::{PlanarPose, PlanarTransform, TrackingState};

use super::conflict::{
    ConflictConfig, ConflictObservation, ConflictReconciler, ConflictVerdict,
    LocalizationConflictSnapshot,
};
use super::stability::{NativeConfidenceConfig, PoseStabilityConfig};

/// Localization state reported to the app.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppLocalizationState {
    /// No estimate yet.
    #[default]
    Searching,
    /// Mesh fallback running, no acceptance yet.
    MeshAligning,
    /// Mesh alignment accepted and applied provisionally.
    MeshAlignedOverride,
    /// Native tracker restored the map.
    ArkitConfirmed,
    /// Native and mesh estimates disagree persistently.
    Conflict,
    /// Mesh override lost its footing.
    Degraded,
}

/// Where the reported localization comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocalizationSource {
    /// Nothing yet.
    #[default]
    None,
    /// Mesh alignment only.
    MeshIcp,
    /// Native tracker only.
    ArkitWorldMap,
    /// Native tracker, agreeing with an earlier mesh acceptance.
    ArkitAndMeshConsistent,
}

/// Configuration for the app state machine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalizationConfig {
    /// Frames after the correction before demotion rules apply.
    /// Default: 5
    #[serde(default = "default_settle_frames")]
    pub settle_frames: u32,

    /// Consecutive limited, low-confidence frames that demote an override.
    /// Default: 5
    #[serde(default = "default_limited_frames")]
    pub limited_frames: u32,

    /// Confidence below which limited tracking counts toward demotion.
    /// Default: 0.30
    #[serde(default = "default_limited_confidence")]
    pub limited_confidence: f32,

    /// Confidence below which an unstable pose demotes immediately.
    /// Default: 0.35
    #[serde(default = "default_unstable_confidence")]
    pub unstable_confidence: f32,

    /// Conflict reconciler settings.
    #[serde(default)]
    pub conflict: ConflictConfig,

    /// Pose-jump monitor settings.
    #[serde(default)]
    pub pose_stability: PoseStabilityConfig,

    /// Native confidence estimate settings.
    #[serde(default)]
    pub native_confidence: NativeConfidenceConfig,

    /// Stabilizer settings, copied from the top-level `stabilizer` section.
    #[serde(skip)]
    pub stabilizer: StabilizerConfig,
}

fn default_settle_frames() -> u32 {
    5
}
fn default_limited_frames() -> u32 {
    5
}
fn default_limited_confidence() -> f32 {
    0.30
}
fn default_unstable_confidence() -> f32 {
    0.35
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            settle_frames: default_settle_frames(),
            limited_frames: default_limited_frames(),
            limited_confidence: default_limited_confidence(),
            unstable_confidence: default_unstable_confidence(),
            conflict: ConflictConfig::default(),
            pose_stability: PoseStabilityConfig::default(),
            native_confidence: NativeConfidenceConfig::default(),
            stabilizer: StabilizerConfig::default(),
        }
    }
}

/// Per-frame evidence for the state machine.
#[derive(Clone, Debug, Default)]
pub struct LocalizationInput {
    /// Frame time (seconds).
    pub timestamp: f64,
    /// Native tracker restored the requested map.
    pub native_localized: bool,
    /// Native tracking state.
    pub native_state: TrackingState,
    /// Native confidence estimate.
    pub native_confidence: f32,
    /// Native pose in the map frame.
    pub native_pose: PlanarPose,
    /// Device pose in the (corrected) session frame.
    pub device_pose: PlanarPose,
    /// Mesh fallback is running.
    pub mesh_fallback_active: bool,
    /// Fresh mesh result computed this frame.
    pub mesh_result: Option<MeshRelocalizationResult>,
    /// Mesh pipeline gave up.
    pub mesh_inconclusive: bool,
    /// Pose-jump monitor verdict.
    pub pose_stable: bool,
}

/// A state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateTransition {
    /// Previous state
    pub from: AppLocalizationState,
    /// New state
    pub to: AppLocalizationState,
}

/// What happened during one update.
#[derive(Clone, Debug, Default)]
pub struct LocalizationStep {
    /// Correction to apply to the session origin (at most once per attempt).
    pub correction: Option<PlanarTransform>,
    /// State change, if any.
    pub transition: Option<StateTransition>,
    /// Why a fed mesh result was not accepted.
    pub rejection: Option<StabilizerRejection>,
    /// Reconciler verdict, if it ran.
    pub verdict: Option<ConflictVerdict>,
}

/// Fuses native tracking and mesh acceptances into one app state.
///
/// Rules are evaluated in priority order every frame:
///
/// 1. Native localized: reconcile an override, only the trust rule leaves
///    a conflict, anything else is promoted to `ArkitConfirmed`.
/// 2. Mesh fallback running while searching: `MeshAligning`.
/// 3. Fresh mesh result before any correction: stabilize, and on
///    acceptance switch to `MeshAlignedOverride` and request the correction.
/// 4. Settled override with an inconclusive pipeline or sustained limited
///    tracking at low confidence: `Degraded`.
/// 5. Override with an unstable pose and low confidence: `Degraded`.
/// 6. `MeshAligning` with an inconclusive pipeline: `Searching`.
#[derive(Clone, Debug)]
pub struct AppLocalizationStateMachine {
    config: LocalizationConfig,
    state: AppLocalizationState,
    source: LocalizationSource,
    stabilizer: AlignmentStabilizer,
    reconciler: ConflictReconciler,
    acceptance: Option<MeshAlignmentAcceptance>,
    conflict: Option<LocalizationConflictSnapshot>,
    correction_requested: bool,
    frames_since_correction: u32,
    limited_low_frames: u32,
    latest_mesh_confidence: f32,
    native_confidence: f32,
}

impl Default for AppLocalizationStateMachine {
    fn default() -> Self {
        Self::new(LocalizationConfig::default())
    }
}

impl AppLocalizationStateMachine {
    /// Create a state machine in `Searching`.
    pub fn new(config: LocalizationConfig) -> Self {
        let stabilizer = AlignmentStabilizer::new(config.stabilizer.clone());
        let reconciler = ConflictReconciler::new(config.conflict.clone());
        Self {
            config,
            state: AppLocalizationState::Searching,
            source: LocalizationSource::None,
            stabilizer,
            reconciler,
            acceptance: None,
            conflict: None,
            correction_requested: false,
            frames_since_correction: 0,
            limited_low_frames: 0,
            latest_mesh_confidence: 0.0,
            native_confidence: 0.0,
        }
    }

    /// Get configuration.
    pub fn config(&self) -> &LocalizationConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> AppLocalizationState {
        self.state
    }

    /// Current source.
    pub fn source(&self) -> LocalizationSource {
        self.source
    }

    /// Accepted mesh alignment, if any.
    pub fn acceptance(&self) -> Option<&MeshAlignmentAcceptance> {
        self.acceptance.as_ref()
    }

    /// Active conflict, if any.
    pub fn conflict(&self) -> Option<&LocalizationConflictSnapshot> {
        self.conflict.as_ref()
    }

    /// Whether the correction was requested this attempt.
    pub fn correction_requested(&self) -> bool {
        self.correction_requested
    }

    /// Confidence of the most recent mesh result.
    pub fn latest_mesh_confidence(&self) -> f32 {
        self.latest_mesh_confidence
    }

    /// Stabilizer diagnostics.
    pub fn stabilizer(&self) -> &AlignmentStabilizer {
        &self.stabilizer
    }

    /// Source-appropriate confidence in [0, 1].
    pub fn confidence(&self) -> f32 {
        let value = match self.state {
            AppLocalizationState::Searching => 0.0,
            AppLocalizationState::MeshAligning
            | AppLocalizationState::MeshAlignedOverride
            | AppLocalizationState::Degraded => self.latest_mesh_confidence,
            AppLocalizationState::ArkitConfirmed => self
                .native_confidence
                .max(self.acceptance.as_ref().map_or(0.0, |a| a.confidence)),
            AppLocalizationState::Conflict => {
                let mesh = self
                    .conflict
                    .as_ref()
                    .map(|c| c.mesh_confidence)
                    .or(self.acceptance.as_ref().map(|a| a.confidence))
                    .unwrap_or(0.0);
                self.native_confidence.min(mesh)
            }
        };
        clamp01(value)
    }

    /// Run the rules for one frame.
    pub fn update(&mut self, input: LocalizationInput) -> LocalizationStep {
        let mut step = LocalizationStep::default();
        let before = self.state;
        self.native_confidence = clamp01(input.native_confidence);

        let confirmed_or_conflict = matches!(
            self.state,
            AppLocalizationState::ArkitConfirmed | AppLocalizationState::Conflict
        );
        if !confirmed_or_conflict {
            if let Some(result) = &input.mesh_result {
                self.latest_mesh_confidence = clamp01(result.confidence);
            }
        }

        if input.native_state.is_limited()
            && self.latest_mesh_confidence < self.config.limited_confidence
        {
            self.limited_low_frames = self.limited_low_frames.saturating_add(1);
        } else {
            self.limited_low_frames = 0;
        }

        if input.native_localized {
            self.apply_native(&input, &mut step);
            self.finish(before, &mut step);
            return step;
        }

        // Rule 2
        if input.mesh_fallback_active && self.state == AppLocalizationState::Searching {
            self.state = AppLocalizationState::MeshAligning;
        }

        // Rule 3
        let mut accepted_now = false;
        let feed_stabilizer = !self.correction_requested
            && !matches!(
                self.state,
                AppLocalizationState::ArkitConfirmed | AppLocalizationState::Conflict
            );
        if let Some(result) = input.mesh_result.filter(|_| feed_stabilizer) {
            match self.stabilizer.push(result) {
                Ok(acceptance) => {
                    step.correction = Some(acceptance.map_from_session);
                    self.acceptance = Some(acceptance);
                    self.correction_requested = true;
                    self.frames_since_correction = 0;
                    self.state = AppLocalizationState::MeshAlignedOverride;
                    self.source = LocalizationSource::MeshIcp;
                    accepted_now = true;
                }
                Err(reason) => step.rejection = Some(reason),
            }
        }

        if self.state == AppLocalizationState::MeshAlignedOverride && !accepted_now {
            self.frames_since_correction = self.frames_since_correction.saturating_add(1);

            // Rule 4
            if self.frames_since_correction >= self.config.settle_frames
                && (input.mesh_inconclusive
                    || self.limited_low_frames >= self.config.limited_frames)
            {
                log::warn!(
                    "Localization: mesh override degraded (inconclusive: {}, limited frames: {})",
                    input.mesh_inconclusive,
                    self.limited_low_frames
                );
                self.state = AppLocalizationState::Degraded;
            }
            // Rule 5
            else if !input.pose_stable
                && self.latest_mesh_confidence < self.config.unstable_confidence
            {
                log::warn!(
                    "Localization: unstable pose at confidence {:.2}, degrading",
                    self.latest_mesh_confidence
                );
                self.state = AppLocalizationState::Degraded;
            }
        }

        // Rule 6
        if self.state == AppLocalizationState::MeshAligning && input.mesh_inconclusive {
            self.state = AppLocalizationState::Searching;
        }

        self.finish(before, &mut step);
        step
    }

    fn apply_native(&mut self, input: &LocalizationInput, step: &mut LocalizationStep) {
        match self.state {
            AppLocalizationState::MeshAlignedOverride | AppLocalizationState::Conflict => {
                let Some(mesh_confidence) = self.acceptance.as_ref().map(|a| a.confidence) else {
                    self.promote();
                    return;
                };
                // The correction has been applied, so the session frame is
                // the map frame and the mesh estimate is the device pose.
                let verdict = self.reconciler.evaluate(&ConflictObservation {
                    native_pose: input.native_pose,
                    mesh_pose: input.device_pose,
                    native_state: input.native_state,
                    native_confidence: self.native_confidence,
                    mesh_confidence,
                    timestamp: input.timestamp,
                });
                let in_conflict = self.state == AppLocalizationState::Conflict;
                match &verdict {
                    ConflictVerdict::TrustNative => {
                        self.conflict = None;
                        self.state = AppLocalizationState::ArkitConfirmed;
                        self.source = LocalizationSource::ArkitWorldMap;
                    }
                    ConflictVerdict::Consistent if !in_conflict => self.promote(),
                    ConflictVerdict::Conflict(snapshot) if !in_conflict => {
                        self.conflict = Some(snapshot.clone());
                        self.state = AppLocalizationState::Conflict;
                    }
                    _ => {}
                }
                step.verdict = Some(verdict);
            }
            AppLocalizationState::ArkitConfirmed => {}
            _ => self.promote(),
        }
    }

    fn promote(&mut self) {
        self.state = AppLocalizationState::ArkitConfirmed;
        self.source = if self.acceptance.is_some() {
            LocalizationSource::ArkitAndMeshConsistent
        } else {
            LocalizationSource::ArkitWorldMap
        };
    }

    fn finish(&mut self, before: AppLocalizationState, step: &mut LocalizationStep) {
        if self.state != before {
            log::info!(
                "Localization: {:?} -> {:?} (source {:?}, confidence {:.2})",
                before,
                self.state,
                self.source,
                self.confidence()
            );
            step.transition = Some(StateTransition {
                from: before,
                to: self.state,
            });
        }
    }

    /// Back to `Searching` with nothing remembered.
    pub fn reset(&mut self) {
        self.state = AppLocalizationState::Searching;
        self.source = LocalizationSource::None;
        self.stabilizer.reset();
        self.reconciler.reset();
        self.acceptance = None;
        self.conflict = None;
        self.correction_requested = false;
        self.frames_since_correction = 0;
        self.limited_low_frames = 0;
        self.latest_mesh_confidence = 0.0;
        self.native_confidence = 0.0;
    }
}
