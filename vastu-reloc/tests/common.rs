//! Test utilities for VastuReloc integration tests.
//!
//! Builds synthetic rooms and frame sequences that drive the engine through
//! a full relocalization attempt.

#![allow(dead_code)]

use vastu_reloc::{
    EngineEffect, FrameInput, LimitedReason, MeshAnchor, PlanarTransform, RelocalizationEngine,
    TrackingState, Transform3D, WorldMappingStatus,
};

/// Frame period used by every scenario (10 Hz).
pub const FRAME_DT: f64 = 0.1;

/// Native tracker still searching for the map.
pub const RELOCALIZING: TrackingState = TrackingState::Limited(LimitedReason::Relocalizing);

/// Feature count high enough to open the early fallback window.
pub const RICH_FEATURES: u32 = 220;

/// Offset of the live session frame relative to the map frame.
pub const SESSION_OFFSET: [f32; 2] = [-1.0, 0.5];

/// A room whose wall surfaces all face +X.
///
/// 8×8×8 = 512 vertices spread over a 3.5 × 2.1 × 2.8 m box, shifted by
/// `offset` on the floor plane. With a single dominant wall direction the
/// yaw histogram is one-hot, so identical rooms correlate perfectly.
pub fn dominant_wall_room(offset: [f32; 2]) -> Vec<MeshAnchor> {
    let mut vertices = Vec::with_capacity(512);
    for i in 0..8 {
        for j in 0..8 {
            for k in 0..8 {
                vertices.push([i as f32 * 0.5, j as f32 * 0.3, k as f32 * 0.4]);
            }
        }
    }
    let normals = vec![[1.0, 0.0, 0.0]; vertices.len()];
    let transform = Transform3D::from_yaw_translation(0.0, [offset[0], 0.0, offset[1]]);
    vec![MeshAnchor::new(transform, vertices, normals)]
}

/// Device pose at the origin with the given heading.
pub fn device_pose(yaw_deg: f32) -> Transform3D {
    Transform3D::from_yaw_translation(yaw_deg, [0.0, 0.0, 0.0])
}

/// Time of frame `index`.
pub fn frame_time(index: u32) -> f64 {
    index as f64 * FRAME_DT
}

/// One relocalizing frame of the guided sweep.
///
/// The sweep turns 3° per frame for 120 frames, then holds still.
pub fn sweep_frame(index: u32, anchors: &[MeshAnchor]) -> FrameInput {
    let yaw = if index < 120 { index as f32 * 3.0 } else { 0.0 };
    FrameInput::new(frame_time(index), device_pose(yaw), RELOCALIZING)
        .with_mapping(WorldMappingStatus::Limited)
        .with_feature_points(RICH_FEATURES)
        .with_mesh_anchors(anchors.to_vec())
}

/// Engine with a saved mesh snapshot of the dominant-wall room loaded at t=0.
pub fn engine_with_saved_room() -> RelocalizationEngine {
    let mut engine = RelocalizationEngine::default();
    let artifact = engine.capture_mesh_artifact("kitchen", 0.0, dominant_wall_room([0.0, 0.0]));
    engine.load_map(Some(artifact), None, 0.0);
    engine
}

/// Run the sweep until the engine requests a correction.
///
/// Returns the next frame index and the correction. Panics if nothing is
/// accepted within 30 s.
pub fn drive_to_acceptance(engine: &mut RelocalizationEngine) -> (u32, PlanarTransform) {
    let live = dominant_wall_room(SESSION_OFFSET);
    for index in 0..300 {
        let output = engine.process_frame(&sweep_frame(index, &live));
        if let Some(EngineEffect::ApplyWorldOriginCorrection(t)) = output.effects.first() {
            return (index + 1, *t);
        }
    }
    panic!("no mesh acceptance within 30 s");
}

/// Native-localized frame whose native pose sits `native_offset` meters from
/// the device along X.
pub fn native_frame(index: u32, native_offset: f32) -> FrameInput {
    FrameInput::new(frame_time(index), device_pose(0.0), TrackingState::Normal)
        .with_mapping(WorldMappingStatus::Mapped)
        .with_feature_points(RICH_FEATURES)
        .with_native_pose(Transform3D::from_yaw_translation(
            0.0,
            [native_offset, 0.0, 0.0],
        ))
}
