//! Multi-frame consensus gate over refined mesh estimates.
//!
//! A single excellent frame is never trusted. Every result is buffered
//! (oldest evicted first), and an acceptance is emitted only when the three
//! newest results each pass the single-frame thresholds and their refined
//! seeds agree with each other.

use serde::{Deserialize, Serialize};

use crate::core::BoundedHistory;

use super::types::{MeshAlignmentAcceptance, MeshRelocalizationResult};

/// Configuration for the stabilizer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StabilizerConfig {
    /// Ring buffer capacity.
    /// Default: 5
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Minimum confidence (inclusive).
    /// Default: 0.80
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Maximum residual in meters (inclusive).
    /// Default: 0.20
    #[serde(default = "default_max_residual_m")]
    pub max_residual_m: f32,

    /// Minimum overlap ratio (inclusive).
    /// Default: 0.35
    #[serde(default = "default_min_overlap")]
    pub min_overlap: f32,

    /// Maximum yaw uncertainty in degrees (inclusive).
    /// Default: 12.0
    #[serde(default = "default_max_yaw_confidence_deg")]
    pub max_yaw_confidence_deg: f32,

    /// Minimum supporting points (inclusive).
    /// Default: 250
    #[serde(default = "default_min_supporting_points")]
    pub min_supporting_points: usize,

    /// Number of newest results that must agree.
    /// Default: 3
    #[serde(default = "default_consensus_frames")]
    pub consensus_frames: usize,

    /// Maximum seed yaw spread against the latest (degrees, inclusive).
    /// Default: 10.0
    #[serde(default = "default_max_seed_yaw_deg")]
    pub max_seed_yaw_deg: f32,

    /// Maximum seed translation spread against the latest (meters, inclusive).
    /// Default: 0.45
    #[serde(default = "default_max_seed_translation_m")]
    pub max_seed_translation_m: f32,
}

fn default_capacity() -> usize {
    5
}
fn default_min_confidence() -> f32 {
    0.80
}
fn default_max_residual_m() -> f32 {
    0.20
}
fn default_min_overlap() -> f32 {
    0.35
}
fn default_max_yaw_confidence_deg() -> f32 {
    12.0
}
fn default_min_supporting_points() -> usize {
    250
}
fn default_consensus_frames() -> usize {
    3
}
fn default_max_seed_yaw_deg() -> f32 {
    10.0
}
fn default_max_seed_translation_m() -> f32 {
    0.45
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            min_confidence: default_min_confidence(),
            max_residual_m: default_max_residual_m(),
            min_overlap: default_min_overlap(),
            max_yaw_confidence_deg: default_max_yaw_confidence_deg(),
            min_supporting_points: default_min_supporting_points(),
            consensus_frames: default_consensus_frames(),
            max_seed_yaw_deg: default_max_seed_yaw_deg(),
            max_seed_translation_m: default_max_seed_translation_m(),
        }
    }
}

/// Why a pushed result did not produce an acceptance.
#[derive(Clone, Debug, PartialEq)]
pub enum StabilizerRejection {
    /// Confidence below threshold
    LowConfidence(f32),
    /// Residual above threshold (meters)
    HighResidual(f32),
    /// Overlap below threshold
    LowOverlap(f32),
    /// Yaw uncertainty above threshold (degrees)
    YawUncertain(f32),
    /// Too few supporting points
    FewPoints(usize),
    /// Not enough results buffered yet
    InsufficientHistory {
        /// Results buffered
        have: usize,
        /// Results required
        need: usize,
    },
    /// An earlier result in the consensus window failed the thresholds
    WindowNotPassing,
    /// A result in the consensus window has no refined seed
    MissingSeed,
    /// Seeds disagree with the latest
    SeedDisagreement {
        /// Worst yaw spread (degrees)
        yaw_deg: f32,
        /// Worst translation spread (meters)
        translation_m: f32,
    },
}

/// Debounces refined estimates into acceptances.
#[derive(Clone, Debug)]
pub struct AlignmentStabilizer {
    config: StabilizerConfig,
    buffer: BoundedHistory<MeshRelocalizationResult>,
}

impl Default for AlignmentStabilizer {
    fn default() -> Self {
        Self::new(StabilizerConfig::default())
    }
}

impl AlignmentStabilizer {
    /// Create a stabilizer.
    pub fn new(config: StabilizerConfig) -> Self {
        let buffer = BoundedHistory::new(config.capacity);
        Self { config, buffer }
    }

    /// Get configuration.
    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    /// Results currently buffered.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Most recent buffered result.
    pub fn latest(&self) -> Option<&MeshRelocalizationResult> {
        self.buffer.latest()
    }

    /// Whether a single result passes every threshold.
    pub fn evaluate_candidate(&self, result: &MeshRelocalizationResult) -> bool {
        self.check_candidate(result).is_ok()
    }

    /// Single-frame threshold check, reporting the first failure.
    pub fn check_candidate(
        &self,
        result: &MeshRelocalizationResult,
    ) -> Result<(), StabilizerRejection> {
        let c = &self.config;
        if result.confidence < c.min_confidence {
            return Err(StabilizerRejection::LowConfidence(result.confidence));
        }
        if result.residual_m > c.max_residual_m {
            return Err(StabilizerRejection::HighResidual(result.residual_m));
        }
        if result.overlap < c.min_overlap {
            return Err(StabilizerRejection::LowOverlap(result.overlap));
        }
        if result.yaw_confidence_deg > c.max_yaw_confidence_deg {
            return Err(StabilizerRejection::YawUncertain(result.yaw_confidence_deg));
        }
        if result.supporting_points < c.min_supporting_points {
            return Err(StabilizerRejection::FewPoints(result.supporting_points));
        }
        Ok(())
    }

    /// Buffer a result and try to reach consensus.
    pub fn push(
        &mut self,
        mut result: MeshRelocalizationResult,
    ) -> Result<MeshAlignmentAcceptance, StabilizerRejection> {
        let verdict = self.check_candidate(&result);
        result.is_stable = verdict.is_ok();
        self.buffer.push(result);

        if let Err(reason) = verdict {
            log::debug!("Stabilizer: candidate rejected ({:?})", reason);
            return Err(reason);
        }

        let need = self.config.consensus_frames.max(1);
        let window = self
            .buffer
            .recent(need)
            .ok_or(StabilizerRejection::InsufficientHistory {
                have: self.buffer.len(),
                need,
            })?;

        if !window.iter().all(|r| self.evaluate_candidate(r)) {
            return Err(StabilizerRejection::WindowNotPassing);
        }

        let mut seeds = Vec::with_capacity(window.len());
        for r in &window {
            seeds.push(r.refined.as_ref().ok_or(StabilizerRejection::MissingSeed)?);
        }
        let Some((latest_seed, earlier)) = seeds.split_last() else {
            return Err(StabilizerRejection::MissingSeed);
        };

        let (worst_yaw, worst_translation) = earlier.iter().fold((0.0f32, 0.0f32), |(y, t), s| {
            (
                y.max(s.yaw_distance(latest_seed)),
                t.max(s.translation_distance(latest_seed)),
            )
        });
        if worst_yaw > self.config.max_seed_yaw_deg
            || worst_translation > self.config.max_seed_translation_m
        {
            log::debug!(
                "Stabilizer: seeds disagree (yaw {:.1}°, translation {:.2}m)",
                worst_yaw,
                worst_translation
            );
            return Err(StabilizerRejection::SeedDisagreement {
                yaw_deg: worst_yaw,
                translation_m: worst_translation,
            });
        }

        let n = window.len() as f32;
        let mean = |f: fn(&MeshRelocalizationResult) -> f32| -> f32 {
            window.iter().map(|r| f(r)).sum::<f32>() / n
        };
        let latest_timestamp = window.last().map_or(0.0, |r| r.timestamp);

        let acceptance = MeshAlignmentAcceptance {
            map_from_session: latest_seed.transform(),
            confidence: mean(|r| r.confidence),
            residual_m: mean(|r| r.residual_m),
            overlap: mean(|r| r.overlap),
            yaw_confidence_deg: mean(|r| r.yaw_confidence_deg),
            timestamp: latest_timestamp,
            supporting_frames: window.len(),
        };

        log::info!(
            "Mesh alignment accepted: yaw {:.1}° t=({:.2}, {:.2}) conf {:.3} over {} frames",
            acceptance.map_from_session.yaw_deg,
            acceptance.map_from_session.tx,
            acceptance.map_from_session.tz,
            acceptance.confidence,
            acceptance.supporting_frames
        );

        Ok(acceptance)
    }

    /// Drop every buffered result.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
