//! Per-tick input from the AR tracking collaborator.

use serde::{Deserialize, Serialize};

use super::pose::Transform3D;
use super::tracking::{TrackingState, WorldMappingStatus};

/// One mesh anchor as extracted by the collaborator.
///
/// Vertices and normals are in the anchor's local frame; `transform` places
/// the anchor in the session frame. `normals` is either empty or the same
/// length as `vertices`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshAnchor {
    /// Stable anchor identifier.
    #[serde(default)]
    pub id: String,
    /// Anchor-to-session transform.
    pub transform: Transform3D,
    /// Local vertex positions.
    pub vertices: Vec<[f32; 3]>,
    /// Local vertex normals (optional).
    #[serde(default)]
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (unused by matching, kept for artifact fidelity).
    #[serde(default)]
    pub indices: Vec<u32>,
}

impl MeshAnchor {
    /// Create an anchor without faces.
    pub fn new(transform: Transform3D, vertices: Vec<[f32; 3]>, normals: Vec<[f32; 3]>) -> Self {
        Self {
            id: String::new(),
            transform,
            vertices,
            normals,
            indices: Vec::new(),
        }
    }

    /// Whether per-vertex normals are available.
    #[inline]
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.vertices.len()
    }
}

/// A session-frame point with an optional normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfacePoint {
    /// Position (session frame)
    pub position: [f32; 3],
    /// Unit normal (session frame), if the anchor carried normals
    pub normal: Option<[f32; 3]>,
}

/// Flatten anchors into session-frame surface points, in anchor order.
pub fn collect_surface_points(anchors: &[MeshAnchor]) -> Vec<SurfacePoint> {
    let total: usize = anchors.iter().map(|a| a.vertices.len()).sum();
    let mut points = Vec::with_capacity(total);

    for anchor in anchors {
        let with_normals = anchor.has_normals();
        for (i, vertex) in anchor.vertices.iter().enumerate() {
            let position = anchor.transform.transform_point(*vertex);
            let normal = if with_normals {
                Some(anchor.transform.transform_vector(anchor.normals[i]))
            } else {
                None
            };
            points.push(SurfacePoint { position, normal });
        }
    }

    points
}

/// Everything the engine consumes for one sensor frame.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FrameInput {
    /// Frame timestamp (seconds, monotonic)
    pub timestamp: f64,
    /// Device pose in the collaborator's current world frame.
    pub device_pose: Transform3D,
    /// Native tracking quality.
    pub tracking: TrackingState,
    /// Native world-mapping progress.
    #[serde(default)]
    pub mapping: WorldMappingStatus,
    /// Live feature-point count.
    #[serde(default)]
    pub feature_points: u32,
    /// Mesh anchors delivered this frame (may be empty).
    #[serde(default)]
    pub mesh_anchors: Vec<MeshAnchor>,
    /// Map-frame pose reported by the native relocalizer once it has
    /// restored the saved map. Falls back to `device_pose` when absent.
    #[serde(default)]
    pub native_pose: Option<Transform3D>,
}

impl FrameInput {
    /// Minimal frame with no mesh data.
    pub fn new(timestamp: f64, device_pose: Transform3D, tracking: TrackingState) -> Self {
        Self {
            timestamp,
            device_pose,
            tracking,
            ..Default::default()
        }
    }

    /// Builder: mapping status.
    pub fn with_mapping(mut self, mapping: WorldMappingStatus) -> Self {
        self.mapping = mapping;
        self
    }

    /// Builder: feature-point count.
    pub fn with_feature_points(mut self, feature_points: u32) -> Self {
        self.feature_points = feature_points;
        self
    }

    /// Builder: mesh anchors.
    pub fn with_mesh_anchors(mut self, anchors: Vec<MeshAnchor>) -> Self {
        self.mesh_anchors = anchors;
        self
    }

    /// Builder: native map-frame pose.
    pub fn with_native_pose(mut self, pose: Transform3D) -> Self {
        self.native_pose = Some(pose);
        self
    }

    /// Native pose, defaulting to the device pose.
    pub fn native_pose_or_device(&self) -> Transform3D {
        self.native_pose.unwrap_or(self.device_pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_applies_anchor_transform() {
        let anchor = MeshAnchor::new(
            Transform3D::from_yaw_translation(0.0, [1.0, 0.0, 2.0]),
            vec![[0.0, 0.5, 0.0], [1.0, 0.5, 0.0]],
            vec![[1.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
        );
        let points = collect_surface_points(&[anchor]);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].position, [1.0, 0.5, 2.0]);
        assert_eq!(points[1].position, [2.0, 0.5, 2.0]);
        assert!(points[0].normal.is_some());
    }

    #[test]
    fn test_mismatched_normals_are_ignored() {
        let anchor = MeshAnchor::new(
            Transform3D::identity(),
            vec![[0.0; 3], [1.0; 3]],
            vec![[1.0, 0.0, 0.0]],
        );
        assert!(!anchor.has_normals());
        let points = collect_surface_points(&[anchor]);
        assert!(points.iter().all(|p| p.normal.is_none()));
    }

    #[test]
    fn test_frame_json_defaults() {
        let json = r#"{"timestamp":1.5,"device_pose":{"m":[1,0,0,0,0,1,0,0,0,0,1,0,0,0,0,1]},"tracking":"Normal"}"#;
        let frame: FrameInput = serde_json::from_str(json).unwrap();
        assert_eq!(frame.feature_points, 0);
        assert!(frame.mesh_anchors.is_empty());
        assert_eq!(frame.native_pose_or_device(), frame.device_pose);
    }
}
