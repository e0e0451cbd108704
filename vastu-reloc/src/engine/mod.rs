//! Frame-tick owner for relocalization.
//!
//! The engine is a single-threaded reducer: the host feeds it one
//! [`FrameInput`](crate::core::FrameInput) per sensor frame and the
//! occasional [`EngineEvent`] from persistence, and reads back a
//! [`LocalizationSnapshot`] plus any [`EngineEffect`]s to apply.
//!
//! ## Per-Frame Flow
//!
//! ```text
//! FrameInput
//!     │
//!     ├──▶ pose stability / native confidence
//!     │
//!     ├──▶ Attempt State Machine ──▶ escalate? ──▶ trigger fallbacks
//!     │                                               │
//!     │            ┌──────────────────────────────────┤
//!     │            ▼                                  ▼
//!     │     Mesh pipeline (throttled)        Room signature (throttled)
//!     │     descriptor → match → refine      footprint comparison
//!     │            │
//!     ▼            ▼
//! App Localization State Machine ──▶ correction? ──▶ EngineEffect
//!     │
//!     ▼
//! LocalizationSnapshot
//! ```
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`RelocalizationEngine`] | Owns all state, runs the flow above |
//! | [`EngineConfig`] | Pipeline throttles and give-up limits |
//! | [`LocalizationSnapshot`] | Read-only view for the presentation layer |

mod fallback;
mod relocalizer;
mod types;

pub use relocalizer::RelocalizationEngine;
pub use types::{
    EngineConfig, EngineEffect, EngineEvent, FrameOutput, LocalizationSnapshot,
    MeshFallbackStatus, SessionMode,
};
