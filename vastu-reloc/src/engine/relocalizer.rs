//! Frame-tick owner wiring every component together.

use crate::alignment::{
    AlignmentRefiner, LiveMeshFrame, MeshRelocalizationResult, SavedMeshReference,
};
use crate::attempt::{FallbackContext, RelocalizationAttemptStateMachine};
use crate::config::RelocConfig;
use crate::core::{FrameInput, MeshAnchor};
use crate::error::RelocError;
use crate::io::{
    MESH_ARTIFACT_VERSION, MeshMapArtifact, RoomSignatureArtifact, check_same_map,
};
use crate::localization::{
    AppLocalizationState, AppLocalizationStateMachine, LocalizationInput, LocalizationStep,
    PoseStabilityMonitor,
};
use crate::readiness::{ReadinessReport, ScanReadinessScorer};
use crate::signature::{
    CoarseSignatureMatcher, MeshSignatureDescriptor, MeshSignatureDescriptorBuilder,
    compare_room_footprint,
};

use super::fallback::{MeshFallbackState, RoomFallbackState};
use super::types::{
    EngineEffect, EngineEvent, FrameOutput, LocalizationSnapshot, SessionMode,
};

/// Single-threaded relocalization reducer.
///
/// All state is owned here and mutated only from [`process_frame`] and
/// [`handle_event`]. Starting a scan or loading a map resets everything.
///
/// [`process_frame`]: Self::process_frame
/// [`handle_event`]: Self::handle_event
pub struct RelocalizationEngine {
    config: RelocConfig,
    mode: SessionMode,

    builder: MeshSignatureDescriptorBuilder,
    matcher: CoarseSignatureMatcher,
    refiner: AlignmentRefiner,

    attempt: RelocalizationAttemptStateMachine,
    localization: AppLocalizationStateMachine,
    readiness: ScanReadinessScorer,
    pose_monitor: PoseStabilityMonitor,

    mesh: MeshFallbackState,
    room: RoomFallbackState,
    saved_mesh: Option<SavedMeshReference>,
    saved_room: Option<RoomSignatureArtifact>,

    normal_streak: u32,
    native_confidence: f32,
    last_timestamp: f64,
    last_error: Option<String>,
}

impl Default for RelocalizationEngine {
    fn default() -> Self {
        Self::new(RelocConfig::default())
    }
}

impl RelocalizationEngine {
    /// Create an idle engine.
    pub fn new(config: RelocConfig) -> Self {
        Self {
            builder: MeshSignatureDescriptorBuilder::new(config.descriptor.clone()),
            matcher: CoarseSignatureMatcher::new(config.matcher.clone()),
            refiner: AlignmentRefiner::new(config.refiner.clone()),
            attempt: RelocalizationAttemptStateMachine::new(config.attempt.clone()),
            localization: AppLocalizationStateMachine::new(config.localization_config()),
            readiness: ScanReadinessScorer::new(config.readiness.clone()),
            pose_monitor: PoseStabilityMonitor::new(config.localization.pose_stability.clone()),
            mesh: MeshFallbackState::default(),
            room: RoomFallbackState::default(),
            saved_mesh: None,
            saved_room: None,
            normal_streak: 0,
            native_confidence: 0.0,
            last_timestamp: 0.0,
            last_error: None,
            mode: SessionMode::Idle,
            config,
        }
    }

    /// Get configuration.
    pub fn config(&self) -> &RelocConfig {
        &self.config
    }

    /// Current session mode.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Attempt state machine.
    pub fn attempt(&self) -> &RelocalizationAttemptStateMachine {
        &self.attempt
    }

    /// App localization state machine.
    pub fn localization(&self) -> &AppLocalizationStateMachine {
        &self.localization
    }

    /// Whether a saved mesh snapshot is loaded.
    pub fn has_saved_mesh(&self) -> bool {
        self.saved_mesh.is_some()
    }

    /// Whether a saved room signature is loaded.
    pub fn has_saved_room(&self) -> bool {
        self.saved_room.is_some()
    }

    fn reset(&mut self) {
        self.attempt.reset();
        self.localization.reset();
        self.readiness.reset();
        self.pose_monitor.reset();
        self.mesh = MeshFallbackState::default();
        self.room = RoomFallbackState::default();
        self.saved_mesh = None;
        self.saved_room = None;
        self.normal_streak = 0;
        self.native_confidence = 0.0;
        self.last_error = None;
    }

    /// Begin capturing a new map.
    pub fn start_scan(&mut self, now: f64) {
        self.reset();
        self.mode = SessionMode::Scanning;
        self.last_timestamp = now;
        log::info!("Engine: scan started at {:.2}s", now);
    }

    /// Load saved artifacts and start a relocalization attempt.
    ///
    /// A room signature that belongs to a different map than the mesh
    /// snapshot is dropped and the mismatch reported in the snapshot.
    pub fn load_map(
        &mut self,
        mesh: Option<MeshMapArtifact>,
        room: Option<RoomSignatureArtifact>,
        now: f64,
    ) {
        self.reset();

        let room = match (&mesh, room) {
            (Some(m), Some(r)) => match check_same_map(m, &r) {
                Ok(()) => Some(r),
                Err(e) => {
                    log::warn!("Engine: ignoring room signature: {}", e);
                    self.last_error = Some(e.to_string());
                    None
                }
            },
            (_, room) => room,
        };

        self.saved_mesh = mesh.map(|artifact| {
            SavedMeshReference::from_artifact(&artifact, self.config.refiner.max_points)
        });
        self.saved_room = room;
        self.mode = SessionMode::Relocalizing;
        self.last_timestamp = now;
        self.attempt.start(now);

        log::info!(
            "Engine: map loaded (mesh: {}, room signature: {})",
            self.saved_mesh.is_some(),
            self.saved_room.is_some()
        );
    }

    /// Apply an asynchronous collaborator event.
    ///
    /// Failures are recorded for the snapshot and never touch
    /// reconciliation state.
    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::MapLoaded {
                mesh,
                room,
                timestamp,
            } => self.load_map(mesh.map(|m| *m), room.map(|r| *r), timestamp),
            EngineEvent::MapSaved { map_name } => {
                log::info!("Engine: map '{}' saved", map_name);
                self.last_error = None;
            }
            EngineEvent::PersistenceFailed { message } => {
                let error = RelocError::Persistence(message);
                log::warn!("Engine: {}", error);
                self.last_error = Some(error.to_string());
            }
        }
    }

    /// Build the mesh artifact to save alongside a map.
    pub fn capture_mesh_artifact(
        &self,
        map_name: &str,
        captured_at: f64,
        anchors: Vec<MeshAnchor>,
    ) -> MeshMapArtifact {
        let descriptor = self.builder.build(&anchors);
        log::info!(
            "Engine: captured mesh artifact '{}' ({} anchors, {} points)",
            map_name,
            anchors.len(),
            descriptor.point_count
        );
        MeshMapArtifact {
            map_name: map_name.to_string(),
            captured_at,
            anchors,
            descriptor,
            version: MESH_ARTIFACT_VERSION,
        }
    }

    /// Readiness report while scanning.
    pub fn readiness_report(&self) -> Option<ReadinessReport> {
        (self.mode == SessionMode::Scanning).then(|| self.readiness.report())
    }

    /// Process one sensor frame.
    pub fn process_frame(&mut self, frame: &FrameInput) -> FrameOutput {
        self.last_timestamp = frame.timestamp;

        if frame.tracking.is_normal() {
            self.normal_streak = self.normal_streak.saturating_add(1);
        } else {
            self.normal_streak = 0;
        }
        self.native_confidence = self.config.localization.native_confidence.estimate(
            frame.tracking,
            frame.mapping,
            self.normal_streak,
        );
        let pose_stable = self
            .pose_monitor
            .update(frame.device_pose.to_planar(), frame.tracking);

        let mut effects = Vec::new();
        let mut transition = None;
        let mut rejection = None;

        match self.mode {
            SessionMode::Idle => {}
            SessionMode::Scanning => self.readiness.add_frame(frame),
            SessionMode::Relocalizing => {
                let step = self.relocalize(frame, pose_stable);
                if let Some(correction) = step.correction {
                    log::info!(
                        "Engine: requesting world origin correction (yaw {:.1}°, shift {:.2}m)",
                        correction.yaw_deg,
                        correction.translation_norm()
                    );
                    effects.push(EngineEffect::ApplyWorldOriginCorrection(correction));
                }
                transition = step.transition;
                rejection = step.rejection;
            }
        }

        FrameOutput {
            snapshot: self.snapshot(),
            effects,
            transition,
            rejection,
        }
    }

    fn relocalize(&mut self, frame: &FrameInput, pose_stable: bool) -> LocalizationStep {
        let now = frame.timestamp;
        self.attempt.update_metrics(frame);

        let native_localized = frame.tracking.is_normal() && self.attempt.saw_not_normal();
        let confirmed = self.localization.state() == AppLocalizationState::ArkitConfirmed;

        if self.attempt.should_escalate(now, native_localized) {
            self.attempt.escalate(now);
        }

        let mesh_ctx = FallbackContext {
            artifact_available: self.saved_mesh.is_some(),
            native_localized,
            already_active: self.mesh.is_active(),
            mesh_active: self.mesh.is_active(),
        };
        let cooling_down = self
            .mesh
            .cooling_down(now, self.config.engine.mesh_retry_backoff_s);
        if !confirmed && !cooling_down && self.attempt.should_trigger_mesh_fallback(now, mesh_ctx)
        {
            log::info!("Engine: mesh fallback triggered at {:.2}s", now);
            self.mesh.activate(now);
            if self.room.is_active() {
                log::info!("Engine: room-signature fallback yields to mesh");
                self.room.deactivate();
            }
        }

        let room_ctx = FallbackContext {
            artifact_available: self.saved_room.is_some(),
            native_localized,
            already_active: self.room.is_active(),
            mesh_active: self.mesh.is_active(),
        };
        if !confirmed && self.attempt.should_trigger_room_signature_fallback(now, room_ctx) {
            log::info!("Engine: room-signature fallback triggered at {:.2}s", now);
            self.room.activate();
        }

        let mesh_due = self.mesh.due(now, self.config.engine.mesh_tick_interval_s);
        let room_due = self.room.due(now, self.config.engine.room_tick_interval_s);
        let live = (mesh_due || room_due).then(|| self.builder.build(&frame.mesh_anchors));

        let mut mesh_result = None;
        if let (true, Some(descriptor)) = (mesh_due, &live) {
            mesh_result = self.run_mesh_pipeline(frame, descriptor);
            let usable = mesh_result
                .as_ref()
                .is_some_and(|r| r.confidence >= self.config.engine.usable_confidence);
            self.mesh.record(now, usable);
        }
        if let (true, Some(descriptor)) = (room_due, &live) {
            let hint = self
                .saved_room
                .as_ref()
                .and_then(|room| compare_room_footprint(room, descriptor));
            self.room.record(now, hint);
        }

        let mesh_inconclusive = self.mesh.is_inconclusive(now, &self.config.engine);

        let step = self.localization.update(LocalizationInput {
            timestamp: now,
            native_localized,
            native_state: frame.tracking,
            native_confidence: self.native_confidence,
            native_pose: frame.native_pose_or_device().to_planar(),
            device_pose: frame.device_pose.to_planar(),
            mesh_fallback_active: self.mesh.is_active(),
            mesh_result,
            mesh_inconclusive,
            pose_stable,
        });

        if step.correction.is_some() {
            self.mesh.mark_accepted();
        }
        if mesh_inconclusive && self.localization.acceptance().is_none() {
            log::info!(
                "Engine: mesh fallback inconclusive, retry in {:.1}s",
                self.config.engine.mesh_retry_backoff_s
            );
            self.mesh.give_up(now);
        }
        if self.localization.state() == AppLocalizationState::ArkitConfirmed
            && (self.mesh.is_active() || self.room.is_active())
        {
            self.mesh.deactivate();
            self.room.deactivate();
        }

        step
    }

    fn run_mesh_pipeline(
        &self,
        frame: &FrameInput,
        live_descriptor: &MeshSignatureDescriptor,
    ) -> Option<MeshRelocalizationResult> {
        let saved = self.saved_mesh.as_ref()?;
        if live_descriptor.is_empty() {
            log::debug!("Engine: no live mesh data");
            return None;
        }
        let hypotheses = self
            .matcher
            .match_descriptors(&saved.descriptor, live_descriptor);
        self.refiner.refine(
            &hypotheses,
            &LiveMeshFrame {
                anchors: &frame.mesh_anchors,
                descriptor: live_descriptor,
                device_yaw_deg: frame.device_pose.yaw_degrees(),
                timestamp: frame.timestamp,
            },
            saved,
        )
    }

    /// Current state for the presentation layer.
    pub fn snapshot(&self) -> LocalizationSnapshot {
        let relocalizing = self.mode == SessionMode::Relocalizing;
        LocalizationSnapshot {
            timestamp: self.last_timestamp,
            session_mode: self.mode,
            state: self.localization.state(),
            source: self.localization.source(),
            confidence: self.localization.confidence(),
            native_confidence: self.native_confidence,
            attempt_mode: relocalizing.then(|| self.attempt.mode()),
            attempt_quality: if relocalizing {
                self.attempt.quality_score()
            } else {
                0.0
            },
            mesh_fallback: self.mesh.status(self.last_timestamp, &self.config.engine),
            room_fallback_active: self.room.is_active(),
            room_hint: self.room.hint(),
            acceptance: self.localization.acceptance().cloned(),
            conflict: self.localization.conflict().cloned(),
            readiness_score: (self.mode == SessionMode::Scanning).then(|| self.readiness.score()),
            pose_stable: self.pose_monitor.is_stable(),
            last_error: self.last_error.clone(),
        }
    }
}
