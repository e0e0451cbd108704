//! Scan readiness through the engine.

mod common;

use common::*;
use vastu_reloc::readiness::ReadinessHint;
use vastu_reloc::{
    FrameInput, RelocalizationEngine, SessionMode, TrackingState, Transform3D, WorldMappingStatus,
};

/// Walk a 2 m line while turning 4° per frame with mapped, rich tracking.
fn good_scan_frame(index: u32) -> FrameInput {
    let pose = Transform3D::from_yaw_translation(
        index as f32 * 4.0,
        [index as f32 * 0.03, 0.0, 0.0],
    );
    FrameInput::new(frame_time(index), pose, TrackingState::Normal)
        .with_mapping(WorldMappingStatus::Mapped)
        .with_feature_points(420)
}

#[test]
fn test_thorough_scan_is_ready() {
    let mut engine = RelocalizationEngine::default();
    engine.start_scan(0.0);

    for index in 0..150 {
        engine.process_frame(&good_scan_frame(index));
    }

    let report = engine.readiness_report().expect("scanning");
    assert!(report.score > 0.9, "score {}", report.score);
    assert!(!report.should_warn_on_save);
    assert!(report.hints.is_empty());
    assert_eq!(engine.snapshot().readiness_score, Some(report.score));
}

#[test]
fn test_glance_scan_warns_on_save() {
    let mut engine = RelocalizationEngine::default();
    engine.start_scan(0.0);

    for index in 0..30 {
        let frame = FrameInput::new(frame_time(index), device_pose(0.0), RELOCALIZING)
            .with_mapping(WorldMappingStatus::Limited)
            .with_feature_points(90);
        engine.process_frame(&frame);
    }

    let report = engine.readiness_report().expect("scanning");
    assert!(report.should_warn_on_save);
    assert!(report.hints.contains(&ReadinessHint::LowMappedRatio));
    assert!(report.hints.contains(&ReadinessHint::FewFeatures));
    assert!(report.hints.contains(&ReadinessHint::NarrowYawCoverage));
    assert!(report.hints.contains(&ReadinessHint::ShortTranslation));
    assert!(report.hints.contains(&ReadinessHint::UnstableTracking));
}

#[test]
fn test_start_scan_clears_loaded_map() {
    let mut engine = engine_with_saved_room();
    assert!(engine.readiness_report().is_none());

    engine.start_scan(5.0);
    assert_eq!(engine.mode(), SessionMode::Scanning);
    assert!(!engine.has_saved_mesh());
    assert!(engine.readiness_report().is_some_and(|r| r.metrics.feature_median == 0));
}

#[test]
fn test_captured_artifact_matches_scan() {
    let engine = RelocalizationEngine::default();
    let artifact = engine.capture_mesh_artifact("office", 12.5, dominant_wall_room([0.0, 0.0]));

    assert_eq!(artifact.map_name, "office");
    assert_eq!(artifact.descriptor.point_count, 512);
    assert_eq!(artifact.anchors.len(), 1);
    assert!(artifact.descriptor.yaw_histogram.iter().any(|&v| v > 0.99));
}
