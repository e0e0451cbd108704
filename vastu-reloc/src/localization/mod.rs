//! App-level localization: fusing the native tracker with mesh acceptances.
//!
//! # State Machine
//!
//! ```text
//!                ┌───────────┐ mesh fallback ┌──────────────┐ acceptance ┌─────────────────────┐
//!   start ──────▶│ Searching │──────────────▶│ MeshAligning │───────────▶│ MeshAlignedOverride │
//!                └───────────┘◀──────────────└──────────────┘ correction └──────────┬──────────┘
//!                      │        inconclusive                    (once)      │       │
//!                      │                                                     │       │ inconclusive /
//!                      │ native localized               consistent /        │       │ unstable
//!                      ▼                                trust native        │       ▼
//!               ┌────────────────┐◀─────────────────────────────────────────┘  ┌──────────┐
//!               │ ArkitConfirmed │◀──────── native localized ──────────────────│ Degraded │
//!               └────────────────┘                                              └──────────┘
//!                      ▲ trust native     ┌──────────┐  5 disagreeing frames
//!                      └──────────────────│ Conflict │◀──── (from override)
//!                                         └──────────┘
//! ```
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`AppLocalizationStateMachine`] | Priority-ordered rules, correction request, reported confidence |
//! | [`ConflictReconciler`] | Native/mesh agreement with a consecutive-frame counter |
//! | [`PoseStabilityMonitor`] | Inter-frame jump check |
//! | [`NativeConfidenceConfig`] | Confidence estimate from discrete native states |

mod conflict;
mod stability;
mod state_machine;

pub use conflict::{
    ConflictConfig, ConflictObservation, ConflictReconciler, ConflictVerdict,
    LocalizationConflictSnapshot,
};
pub use stability::{NativeConfidenceConfig, PoseStabilityConfig, PoseStabilityMonitor};
pub use state_machine::{
    AppLocalizationState, AppLocalizationStateMachine, LocalizationConfig, LocalizationInput,
    LocalizationSource, LocalizationStep, StateTransition,
};
