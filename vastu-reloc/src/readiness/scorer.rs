//! Rolling-window scan readiness score.

use serde::{Deserialize, Serialize};

use crate::core::math::{median_u32, saturating_ratio};
use crate::core::{BoundedHistory, FrameInput, PlanarPose, WorldMappingStatus};

/// Configuration for readiness scoring.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadinessConfig {
    /// Samples kept in the rolling window.
    /// Default: 180
    #[serde(default = "default_window")]
    pub window: usize,

    /// Mapped ratio that saturates its term.
    /// Default: 0.70
    #[serde(default = "default_mapped_target")]
    pub mapped_target: f32,

    /// Normal-tracking ratio that saturates its term.
    /// Default: 0.80
    #[serde(default = "default_tracking_target")]
    pub tracking_target: f32,

    /// Feature median that saturates its term.
    /// Default: 350
    #[serde(default = "default_feature_target")]
    pub feature_target: u32,

    /// Yaw coverage that saturates its term (degrees).
    /// Default: 540.0
    #[serde(default = "default_yaw_target_deg")]
    pub yaw_target_deg: f32,

    /// Path length that saturates its term (meters).
    /// Default: 4.0
    #[serde(default = "default_translation_target_m")]
    pub translation_target_m: f32,

    /// Mapped ratio below which a hint is raised.
    /// Default: 0.45
    #[serde(default = "default_hint_mapped_ratio")]
    pub hint_mapped_ratio: f32,

    /// Feature median below which a hint is raised.
    /// Default: 180
    #[serde(default = "default_hint_feature_median")]
    pub hint_feature_median: u32,

    /// Yaw coverage below which a hint is raised (degrees).
    /// Default: 300.0
    #[serde(default = "default_hint_yaw_deg")]
    pub hint_yaw_deg: f32,

    /// Path length below which a hint is raised (meters).
    /// Default: 1.5
    #[serde(default = "default_hint_translation_m")]
    pub hint_translation_m: f32,

    /// Normal-tracking ratio below which a hint is raised.
    /// Default: 0.6
    #[serde(default = "default_hint_tracking_ratio")]
    pub hint_tracking_ratio: f32,

    /// Score below which saving should warn.
    /// Default: 0.65
    #[serde(default = "default_save_warning_score")]
    pub save_warning_score: f32,
}

fn default_window() -> usize {
    180
}
fn default_mapped_target() -> f32 {
    0.70
}
fn default_tracking_target() -> f32 {
    0.80
}
fn default_feature_target() -> u32 {
    350
}
fn default_yaw_target_deg() -> f32 {
    540.0
}
fn default_translation_target_m() -> f32 {
    4.0
}
fn default_hint_mapped_ratio() -> f32 {
    0.45
}
fn default_hint_feature_median() -> u32 {
    180
}
fn default_hint_yaw_deg() -> f32 {
    300.0
}
fn default_hint_translation_m() -> f32 {
    1.5
}
fn default_hint_tracking_ratio() -> f32 {
    0.6
}
fn default_save_warning_score() -> f32 {
    0.65
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            mapped_target: default_mapped_target(),
            tracking_target: default_tracking_target(),
            feature_target: default_feature_target(),
            yaw_target_deg: default_yaw_target_deg(),
            translation_target_m: default_translation_target_m(),
            hint_mapped_ratio: default_hint_mapped_ratio(),
            hint_feature_median: default_hint_feature_median(),
            hint_yaw_deg: default_hint_yaw_deg(),
            hint_translation_m: default_hint_translation_m(),
            hint_tracking_ratio: default_hint_tracking_ratio(),
            save_warning_score: default_save_warning_score(),
        }
    }
}

/// One frame's contribution to readiness.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReadinessSample {
    /// World-mapping status.
    pub mapping: WorldMappingStatus,
    /// Feature-point count.
    pub feature_points: u32,
    /// Tracking was `Normal`.
    pub tracking_normal: bool,
    /// Device pose on the floor plane.
    pub pose: PlanarPose,
}

impl ReadinessSample {
    /// Extract a sample from a frame.
    pub fn from_frame(frame: &FrameInput) -> Self {
        Self {
            mapping: frame.mapping,
            feature_points: frame.feature_points,
            tracking_normal: frame.tracking.is_normal(),
            pose: frame.device_pose.to_planar(),
        }
    }
}

/// Aggregates over the window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadinessMetrics {
    /// Fraction of samples with `Mapped` status.
    pub mapped_ratio: f32,
    /// Fraction of samples with `Normal` tracking.
    pub tracking_ratio: f32,
    /// Median feature-point count.
    pub feature_median: u32,
    /// Summed absolute heading change (degrees).
    pub yaw_coverage_deg: f32,
    /// Summed planar path length (meters).
    pub translation_m: f32,
}

/// Something the user should do before saving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadinessHint {
    /// Too little of the surroundings is mapped.
    LowMappedRatio,
    /// The scene lacks visual features.
    FewFeatures,
    /// The user has not looked around enough.
    NarrowYawCoverage,
    /// The user has not walked enough.
    ShortTranslation,
    /// Tracking was frequently not normal.
    UnstableTracking,
}

/// Score plus hints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadinessReport {
    /// Composite score in [0, 1].
    pub score: f32,
    /// Underlying metrics.
    pub metrics: ReadinessMetrics,
    /// Raised hints, in a fixed order.
    pub hints: Vec<ReadinessHint>,
    /// Saving should warn.
    pub should_warn_on_save: bool,
}

/// Composite readiness score in [0, 1].
///
/// ```text
/// 0.30·mapped/0.70 + 0.20·tracking/0.80 + 0.20·median/350
///   + 0.15·yaw/540° + 0.15·translation/4 m      (each term clamped)
/// ```
pub fn score_from_metrics(metrics: &ReadinessMetrics, config: &ReadinessConfig) -> f32 {
    let mapped = saturating_ratio(metrics.mapped_ratio, config.mapped_target);
    let tracking = saturating_ratio(metrics.tracking_ratio, config.tracking_target);
    let features = saturating_ratio(metrics.feature_median as f32, config.feature_target as f32);
    let yaw = saturating_ratio(metrics.yaw_coverage_deg, config.yaw_target_deg);
    let translation = saturating_ratio(metrics.translation_m, config.translation_target_m);
    (0.30 * mapped + 0.20 * tracking + 0.20 * features + 0.15 * yaw + 0.15 * translation)
        .clamp(0.0, 1.0)
}

/// Hints raised by a set of metrics.
pub fn hints_from_metrics(metrics: &ReadinessMetrics, config: &ReadinessConfig) -> Vec<ReadinessHint> {
    let mut hints = Vec::new();
    if metrics.mapped_ratio < config.hint_mapped_ratio {
        hints.push(ReadinessHint::LowMappedRatio);
    }
    if metrics.feature_median < config.hint_feature_median {
        hints.push(ReadinessHint::FewFeatures);
    }
    if metrics.yaw_coverage_deg < config.hint_yaw_deg {
        hints.push(ReadinessHint::NarrowYawCoverage);
    }
    if metrics.translation_m < config.hint_translation_m {
        hints.push(ReadinessHint::ShortTranslation);
    }
    if metrics.tracking_ratio < config.hint_tracking_ratio {
        hints.push(ReadinessHint::UnstableTracking);
    }
    hints
}

/// Rolling-window map quality score used to gate save-time warnings.
#[derive(Clone, Debug)]
pub struct ScanReadinessScorer {
    config: ReadinessConfig,
    samples: BoundedHistory<ReadinessSample>,
}

impl Default for ScanReadinessScorer {
    fn default() -> Self {
        Self::new(ReadinessConfig::default())
    }
}

impl ScanReadinessScorer {
    /// Create a scorer.
    pub fn new(config: ReadinessConfig) -> Self {
        let samples = BoundedHistory::new(config.window);
        Self { config, samples }
    }

    /// Get configuration.
    pub fn config(&self) -> &ReadinessConfig {
        &self.config
    }

    /// Samples in the window.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Window is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Add a sample.
    pub fn add_sample(&mut self, sample: ReadinessSample) {
        self.samples.push(sample);
    }

    /// Add a frame.
    pub fn add_frame(&mut self, frame: &FrameInput) {
        self.add_sample(ReadinessSample::from_frame(frame));
    }

    /// Aggregate the window.
    pub fn metrics(&self) -> ReadinessMetrics {
        let n = self.samples.len();
        if n == 0 {
            return ReadinessMetrics::default();
        }
        let mapped = self.samples.iter().filter(|s| s.mapping.is_mapped()).count();
        let normal = self.samples.iter().filter(|s| s.tracking_normal).count();

        let (yaw, path) = self
            .samples
            .iter()
            .zip(self.samples.iter().skip(1))
            .fold((0.0f32, 0.0f32), |(yaw, path), (a, b)| {
                (yaw + a.pose.yaw_delta(&b.pose), path + a.pose.distance(&b.pose))
            });

        ReadinessMetrics {
            mapped_ratio: mapped as f32 / n as f32,
            tracking_ratio: normal as f32 / n as f32,
            feature_median: median_u32(self.samples.iter().map(|s| s.feature_points)),
            yaw_coverage_deg: yaw,
            translation_m: path,
        }
    }

    /// Composite score for the current window.
    pub fn score(&self) -> f32 {
        score_from_metrics(&self.metrics(), &self.config)
    }

    /// Whether saving now should warn the user.
    pub fn should_warn_on_save(&self) -> bool {
        self.score() < self.config.save_warning_score
    }

    /// Score, metrics and hints together.
    pub fn report(&self) -> ReadinessReport {
        let metrics = self.metrics();
        let score = score_from_metrics(&metrics, &self.config);
        ReadinessReport {
            score,
            metrics,
            hints: hints_from_metrics(&metrics, &self.config),
            should_warn_on_save: score < self.config.save_warning_score,
        }
    }

    /// Clear the window.
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn saturated() -> ReadinessMetrics {
        ReadinessMetrics {
            mapped_ratio: 0.7,
            tracking_ratio: 0.8,
            feature_median: 350,
            yaw_coverage_deg: 540.0,
            translation_m: 4.0,
        }
    }

    #[test]
    fn test_saturated_score_is_one() {
        let config = ReadinessConfig::default();
        assert_relative_eq!(score_from_metrics(&saturated(), &config), 1.0, epsilon = 1e-6);
        assert!(hints_from_metrics(&saturated(), &config).is_empty());
    }

    #[test]
    fn test_halving_lowers_score() {
        let config = ReadinessConfig::default();
        let full = score_from_metrics(&saturated(), &config);
        let m = saturated();
        let halved = ReadinessMetrics {
            mapped_ratio: m.mapped_ratio / 2.0,
            tracking_ratio: m.tracking_ratio / 2.0,
            feature_median: m.feature_median / 2,
            yaw_coverage_deg: m.yaw_coverage_deg / 2.0,
            translation_m: m.translation_m / 2.0,
        };
        let half = score_from_metrics(&halved, &config);
        assert!(half < full - 0.4);

        // Each term on its own.
        let singles = [
            ReadinessMetrics { mapped_ratio: 0.35, ..m },
            ReadinessMetrics { tracking_ratio: 0.4, ..m },
            ReadinessMetrics { feature_median: 175, ..m },
            ReadinessMetrics { yaw_coverage_deg: 270.0, ..m },
            ReadinessMetrics { translation_m: 2.0, ..m },
        ];
        for single in singles {
            assert!(score_from_metrics(&single, &config) < full);
        }
    }

    #[test]
    fn test_hints() {
        let config = ReadinessConfig::default();
        let hints = hints_from_metrics(&ReadinessMetrics::default(), &config);
        assert_eq!(
            hints,
            vec![
                ReadinessHint::LowMappedRatio,
                ReadinessHint::FewFeatures,
                ReadinessHint::NarrowYawCoverage,
                ReadinessHint::ShortTranslation,
                ReadinessHint::UnstableTracking,
            ]
        );
    }

    #[test]
    fn test_window_metrics() {
        let mut scorer = ScanReadinessScorer::default();
        assert!(scorer.should_warn_on_save());

        for i in 0..200 {
            scorer.add_sample(ReadinessSample {
                mapping: if i % 2 == 0 {
                    WorldMappingStatus::Mapped
                } else {
                    WorldMappingStatus::Extending
                },
                feature_points: 400,
                tracking_normal: true,
                pose: PlanarPose::new(i as f32 * 0.05, 0.0, i as f32 * 5.0),
            });
        }
        assert_eq!(scorer.len(), 180);

        let m = scorer.metrics();
        assert_relative_eq!(m.mapped_ratio, 0.5);
        assert_relative_eq!(m.tracking_ratio, 1.0);
        assert_eq!(m.feature_median, 400);
        assert_relative_eq!(m.translation_m, 179.0 * 0.05, epsilon = 1e-3);
        assert_relative_eq!(m.yaw_coverage_deg, 179.0 * 5.0, epsilon = 1e-2);

        let report = scorer.report();
        assert!(report.score > 0.65);
        assert!(!report.should_warn_on_save);
        assert!(report.hints.is_empty());

        scorer.reset();
        assert!(scorer.is_empty());
    }
}
