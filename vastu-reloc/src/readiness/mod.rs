//! Scan readiness scoring for save-time warnings.
//!
//! While the user scans a room, every frame contributes a sample to a
//! rolling window. The composite score tells the app whether the map is
//! likely good enough to relocalize against later.

mod scorer;

pub use scorer::{
    ReadinessConfig, ReadinessHint, ReadinessMetrics, ReadinessReport, ReadinessSample,
    ScanReadinessScorer, hints_from_metrics, score_from_metrics,
};
