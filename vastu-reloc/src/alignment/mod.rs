//! Mesh alignment: refinement and multi-frame stabilization.
//!
//! ```text
//! coarse hypotheses ──► AlignmentRefiner ──► MeshRelocalizationResult
//!                                                     │
//!                                                     ▼
//!                                  AlignmentStabilizer (ring of 5)
//!                                                     │ 3 agreeing frames
//!                                                     ▼
//!                                          MeshAlignmentAcceptance
//! ```
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`AlignmentRefiner`] | Blend hypothesis with centroid offset, score, derive quality metrics |
//! | [`AlignmentStabilizer`] | Single-frame thresholds plus 3-frame seed consensus |

mod refiner;
mod stabilizer;
mod types;

pub use refiner::{
    AlignmentRefiner, CloudSummary, LiveMeshFrame, RefinerConfig, SavedMeshReference,
};
pub use stabilizer::{AlignmentStabilizer, StabilizerConfig, StabilizerRejection};
pub use types::{
    AlignmentNote, AreaHint, HypothesisSource, MeshAlignmentAcceptance, MeshRelocalizationResult,
    RelocalizationHypothesis,
};
