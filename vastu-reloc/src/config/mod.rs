//! Unified configuration loading for VastuReloc.
//!
//! Loads all tunables from a single YAML file. Every field has a default,
//! so a missing file or a partial file both work.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vastu_reloc::config::RelocConfig;
//! use vastu_reloc::engine::RelocalizationEngine;
//!
//! // Load from default path (configs/config.yaml)
//! let config = RelocConfig::load_default()?;
//!
//! // Or use built-in defaults (no file needed)
//! let config = RelocConfig::default();
//!
//! let engine = RelocalizationEngine::new(config);
//! ```
//!
//! ## Configuration Sections
//!
//! | Section | Description |
//! |---------|-------------|
//! | `descriptor` | Mesh signature sampling and histogram bins |
//! | `matcher` | Coarse yaw correlation |
//! | `refiner` | Translation blend, penalties, quality metrics |
//! | `stabilizer` | Acceptance gates and temporal consensus |
//! | `attempt` | Escalation and fallback triggers |
//! | `localization` | Override settling, conflict, native confidence |
//! | `readiness` | Scan readiness targets and hints |
//! | `engine` | Pipeline throttles and give-up limits |
//!
//! ## Example YAML
//!
//! ```yaml
//! attempt:
//!   escalation_rotation_deg: 330.0
//!   fallback_timeout_s: 14.0
//!
//! stabilizer:
//!   min_confidence: 0.80
//!   consensus_frames: 3
//!
//! localization:
//!   conflict:
//!     max_position_delta_m: 0.75
//!     conflict_frames: 5
//! ```

mod error;
mod reloc;

pub use error::ConfigLoadError;
pub use reloc::RelocConfig;
