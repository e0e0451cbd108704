//! Relocalization attempt escalation.
//!
//! Decides *when* the expensive fallbacks are allowed to run. The user is
//! first asked for a stationary 360° sweep; if the native tracker has not
//! restored the map by then, guidance escalates to micro-movement and the
//! mesh and room-signature fallbacks become eligible.
//!
//! # State Machine
//!
//! ```text
//! ┌───────────────┐  rotation ≥ 330°, elapsed ≥ 10 s,   ┌───────────────────────┐
//! │ Stationary360 │ ──median ≥ 120, native not ready──▶ │ MicroMovementFallback │
//! └───────────────┘                                     └───────────┬───────────┘
//!         ▲                                                         │ elapsed ≥ 14 s, or
//!         │ start()                                                 │ elapsed ≥ 8 s and median ≥ 180
//!         │                                                         ▼
//!                                                      mesh fallback (priority)
//!                                                      room-signature fallback
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut attempt = RelocalizationAttemptStateMachine::new(AttemptConfig::default());
//! attempt.start(frame.timestamp);
//!
//! attempt.update_metrics(&frame);
//! if attempt.should_escalate(frame.timestamp, native_localized) {
//!     attempt.escalate(frame.timestamp);
//! }
//! ```

mod state_machine;

pub use state_machine::{
    AttemptConfig, AttemptMode, FallbackContext, RelocalizationAttemptState,
    RelocalizationAttemptStateMachine,
};
