//! # VastuReloc
//!
//! Dual-source indoor relocalization for AR sessions.
//!
//! ## Overview
//!
//! When an AR session reopens a saved map, the native tracker may take a
//! long time to relocalize, or never manage it. VastuReloc runs alongside
//! it and reconciles two sources:
//!
//! - **Native tracker** - the platform's own world-map relocalization
//! - **Mesh signature** - geometric matching of the live reconstruction
//!   against a saved mesh snapshot
//!
//! A mesh alignment is applied provisionally once it is stable over time.
//! Native confirmation wins when it arrives, unless the two persistently
//! disagree, in which case the session is flagged as conflicted.
//!
//! ## Features
//!
//! - **Guided Attempt**: stationary 360° sweep, escalation to micro-movement
//! - **Mesh Fallback**: yaw-histogram correlation, translation refinement,
//!   temporal consensus
//! - **Room Signature Hint**: saved room footprint vs live geometry
//! - **Conflict Reconciliation**: sustained disagreement detection
//! - **Scan Readiness**: save-time warning for thin maps
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vastu_reloc::{RelocConfig, RelocalizationEngine, EngineEffect};
//!
//! let mut engine = RelocalizationEngine::new(RelocConfig::load_default()?);
//! engine.load_map(Some(mesh_artifact), None, now);
//!
//! for frame in frames {
//!     let output = engine.process_frame(&frame);
//!     for effect in output.effects {
//!         match effect {
//!             EngineEffect::ApplyWorldOriginCorrection(t) => session.shift_origin(t),
//!         }
//!     }
//!     ui.render(&output.snapshot);
//! }
//! ```
//!
//! ## Coordinate System
//!
//! Follows the AR collaborator's convention:
//! - Y: Up
//! - X/Z: Floor plane, meters
//! - Yaw: Rotation about +Y in degrees

#![warn(missing_docs)]

// Core types
pub mod core;

// Unified configuration
pub mod config;

// Error types
pub mod error;

// Mesh signature descriptors and coarse matching
pub mod signature;

// Translation refinement and temporal consensus
pub mod alignment;

// Guided relocalization attempt
pub mod attempt;

// App-level localization state
pub mod localization;

// Scan readiness scoring
pub mod readiness;

// Frame-tick owner
pub mod engine;

// Artifacts and frame logs
pub mod io;

// Re-export commonly used types
pub use core::{
    FrameInput, LimitedReason, MeshAnchor, PlanarPose, PlanarTransform, TrackingState,
    Transform3D, WorldMappingStatus,
};

pub use config::{ConfigLoadError, RelocConfig};
pub use error::{RelocError, Result};

pub use alignment::{MeshAlignmentAcceptance, MeshRelocalizationResult};
pub use attempt::AttemptMode;
pub use engine::{
    EngineEffect, EngineEvent, FrameOutput, LocalizationSnapshot, RelocalizationEngine,
    SessionMode,
};
pub use io::{MeshMapArtifact, RoomSignatureArtifact};
pub use localization::{AppLocalizationState, LocalizationSource};
pub use readiness::{ReadinessReport, ScanReadinessScorer};
