//! Core types for the relocalization engine.
//!
//! All types follow the AR collaborator's Y-up convention:
//! - **X/Z**: floor plane (meters)
//! - **Y**: up (meters)
//! - **Yaw**: rotation about +Y, in degrees
//!
//! ## Type Categories
//!
//! ### Poses
//! - [`Transform3D`]: full 4×4 device or anchor pose
//! - [`PlanarPose`]: gravity-aligned position and heading
//! - [`PlanarTransform`]: map-from-session yaw + XZ correction
//!
//! ### Native Tracker
//! - [`TrackingState`] / [`LimitedReason`]: tri-state tracking quality
//! - [`WorldMappingStatus`]: mapping progress
//!
//! ### Frame Input
//! - [`MeshAnchor`]: collaborator-extracted mesh chunk
//! - [`FrameInput`]: everything consumed per sensor frame
//!
//! ### Buffers
//! - [`BoundedHistory`]: fixed-capacity FIFO used by every rolling window

mod frame;
mod history;
mod pose;
mod tracking;

pub mod math;

pub use frame::{FrameInput, MeshAnchor, SurfacePoint, collect_surface_points};
pub use history::BoundedHistory;
pub use pose::{PlanarPose, PlanarTransform, Transform3D};
pub use tracking::{LimitedReason, TrackingState, WorldMappingStatus};
