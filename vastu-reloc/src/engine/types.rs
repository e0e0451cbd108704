//! Engine inputs, outputs and configuration.

use serde::{Deserialize, Serialize};

use crate::alignment::{MeshAlignmentAcceptance, StabilizerRejection};
use crate::attempt::AttemptMode;
use crate::core::PlanarTransform;
use crate::io::{MeshMapArtifact, RoomSignatureArtifact};
use crate::localization::{
    AppLocalizationState, LocalizationConflictSnapshot, LocalizationSource, StateTransition,
};
use crate::signature::RoomSignatureHint;

/// Configuration for the frame-tick owner.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum time between mesh pipeline runs (seconds).
    /// Default: 0.5
    #[serde(default = "default_mesh_tick_interval_s")]
    pub mesh_tick_interval_s: f64,

    /// Minimum time between room-signature comparisons (seconds).
    /// Default: 1.0
    #[serde(default = "default_room_tick_interval_s")]
    pub room_tick_interval_s: f64,

    /// Consecutive ticks without a usable result before the mesh pipeline
    /// is inconclusive.
    /// Default: 10
    #[serde(default = "default_inconclusive_miss_ticks")]
    pub inconclusive_miss_ticks: u32,

    /// Time since activation without an acceptance before the mesh
    /// pipeline is inconclusive (seconds).
    /// Default: 12.0
    #[serde(default = "default_inconclusive_timeout_s")]
    pub inconclusive_timeout_s: f64,

    /// Mesh confidence below which a result counts as a miss.
    /// Default: 0.30
    #[serde(default = "default_usable_confidence")]
    pub usable_confidence: f32,

    /// Time after an inconclusive mesh run before it may trigger again
    /// (seconds).
    /// Default: 12.0
    #[serde(default = "default_mesh_retry_backoff_s")]
    pub mesh_retry_backoff_s: f64,
}

fn default_mesh_tick_interval_s() -> f64 {
    0.5
}
fn default_room_tick_interval_s() -> f64 {
    1.0
}
fn default_inconclusive_miss_ticks() -> u32 {
    10
}
fn default_inconclusive_timeout_s() -> f64 {
    12.0
}
fn default_usable_confidence() -> f32 {
    0.30
}
fn default_mesh_retry_backoff_s() -> f64 {
    12.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mesh_tick_interval_s: default_mesh_tick_interval_s(),
            room_tick_interval_s: default_room_tick_interval_s(),
            inconclusive_miss_ticks: default_inconclusive_miss_ticks(),
            inconclusive_timeout_s: default_inconclusive_timeout_s(),
            usable_confidence: default_usable_confidence(),
            mesh_retry_backoff_s: default_mesh_retry_backoff_s(),
        }
    }
}

/// What the session is doing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionMode {
    /// Nothing started.
    #[default]
    Idle,
    /// Capturing a new map; readiness is scored.
    Scanning,
    /// Relocalizing against a loaded map.
    Relocalizing,
}

/// Asynchronous results from the persistence collaborator.
#[derive(Clone, Debug)]
pub enum EngineEvent {
    /// Map artifacts finished loading; starts a relocalization attempt.
    MapLoaded {
        /// Saved mesh snapshot, if one exists.
        mesh: Option<Box<MeshMapArtifact>>,
        /// Saved room signature, if one exists.
        room: Option<Box<RoomSignatureArtifact>>,
        /// Event time (seconds).
        timestamp: f64,
    },
    /// Map save finished.
    MapSaved {
        /// Name of the saved map.
        map_name: String,
    },
    /// A load or save failed.
    PersistenceFailed {
        /// Collaborator-provided description.
        message: String,
    },
}

/// Requests from the engine to the AR collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EngineEffect {
    /// Shift the session world origin by this map-from-session transform.
    ApplyWorldOriginCorrection(PlanarTransform),
}

/// Mesh fallback diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshFallbackStatus {
    /// Pipeline is running.
    pub active: bool,
    /// Pipeline runs so far this activation.
    pub ticks: u32,
    /// Consecutive runs without a usable result.
    pub consecutive_misses: u32,
    /// Pipeline gave up.
    pub inconclusive: bool,
}

/// Immutable per-tick state for the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocalizationSnapshot {
    /// Frame time (seconds).
    pub timestamp: f64,
    /// Session mode.
    pub session_mode: SessionMode,
    /// App localization state.
    pub state: AppLocalizationState,
    /// Where the localization comes from.
    pub source: LocalizationSource,
    /// Source-appropriate confidence in [0, 1].
    pub confidence: f32,
    /// Native confidence estimate.
    pub native_confidence: f32,
    /// Attempt guidance mode (relocalizing only).
    pub attempt_mode: Option<AttemptMode>,
    /// Attempt quality in [0, 1].
    pub attempt_quality: f32,
    /// Mesh fallback diagnostics.
    pub mesh_fallback: MeshFallbackStatus,
    /// Room-signature fallback is running.
    pub room_fallback_active: bool,
    /// Latest room footprint comparison.
    pub room_hint: Option<RoomSignatureHint>,
    /// Accepted mesh alignment.
    pub acceptance: Option<MeshAlignmentAcceptance>,
    /// Active conflict.
    pub conflict: Option<LocalizationConflictSnapshot>,
    /// Readiness score while scanning.
    pub readiness_score: Option<f32>,
    /// Pose-jump monitor verdict.
    pub pose_stable: bool,
    /// Latest persistence failure.
    pub last_error: Option<String>,
}

/// Result of one frame tick.
#[derive(Clone, Debug)]
pub struct FrameOutput {
    /// State after this frame.
    pub snapshot: LocalizationSnapshot,
    /// Requests for the collaborator.
    pub effects: Vec<EngineEffect>,
    /// State change this frame.
    pub transition: Option<StateTransition>,
    /// Why this frame's mesh result was not accepted.
    pub rejection: Option<StabilizerRejection>,
}
