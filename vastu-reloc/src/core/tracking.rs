//! Native tracker state as reported by the AR collaborator.

use serde::{Deserialize, Serialize};

/// Why the native tracker reports limited tracking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimitedReason {
    /// Session is still starting up.
    Initializing,
    /// Device is moving too fast.
    ExcessiveMotion,
    /// Scene lacks visual texture.
    InsufficientFeatures,
    /// Native relocalization against a loaded map is in progress.
    Relocalizing,
}

/// Tri-state tracking quality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackingState {
    /// Full-quality tracking.
    Normal,
    /// Tracking with a reason code.
    Limited(LimitedReason),
    /// No usable tracking.
    NotAvailable,
}

impl Default for TrackingState {
    fn default() -> Self {
        Self::NotAvailable
    }
}

impl TrackingState {
    /// Full-quality tracking.
    #[inline]
    pub fn is_normal(&self) -> bool {
        matches!(self, TrackingState::Normal)
    }

    /// Any limited condition.
    #[inline]
    pub fn is_limited(&self) -> bool {
        matches!(self, TrackingState::Limited(_))
    }

    /// Limited because the native tracker is relocalizing.
    #[inline]
    pub fn is_relocalizing(&self) -> bool {
        matches!(self, TrackingState::Limited(LimitedReason::Relocalizing))
    }
}

/// World-mapping progress of the native session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldMappingStatus {
    /// No map yet.
    #[default]
    NotAvailable,
    /// Map is insufficient around the current position.
    Limited,
    /// Map is growing into new areas.
    Extending,
    /// Current surroundings are well mapped.
    Mapped,
}

impl WorldMappingStatus {
    /// Surroundings count as mapped for readiness purposes.
    #[inline]
    pub fn is_mapped(&self) -> bool {
        matches!(self, WorldMappingStatus::Mapped)
    }

    /// Weight applied to native confidence for this mapping state.
    pub fn confidence_factor(&self) -> f32 {
        match self {
            WorldMappingStatus::Mapped => 1.0,
            WorldMappingStatus::Extending => 0.9,
            WorldMappingStatus::Limited => 0.7,
            WorldMappingStatus::NotAvailable => 0.5,
        }
    }
}
