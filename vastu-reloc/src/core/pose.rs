//! Device poses and planar (yaw + XZ) rigid transforms.
//!
//! The AR collaborator reports full 4×4 poses in a Y-up frame. Relocalization
//! only ever reasons about the gravity-aligned part of a pose: heading about +Y
//! and position on the XZ floor plane.

use serde::{Deserialize, Serialize};

use super::math::wrap_degrees;

/// A rigid 4×4 transform in column-major order (Y up).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    /// Column-major matrix elements.
    pub m: [f32; 16],
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform3D {
    /// Identity transform.
    pub fn identity() -> Self {
        let mut m = [0.0; 16];
        m[0] = 1.0;
        m[5] = 1.0;
        m[10] = 1.0;
        m[15] = 1.0;
        Self { m }
    }

    /// Build from a heading about +Y (degrees) and a translation.
    pub fn from_yaw_translation(yaw_deg: f32, translation: [f32; 3]) -> Self {
        let (s, c) = yaw_deg.to_radians().sin_cos();
        let mut m = [0.0; 16];
        // Column 0
        m[0] = c;
        m[2] = -s;
        // Column 1
        m[5] = 1.0;
        // Column 2
        m[8] = s;
        m[10] = c;
        // Column 3
        m[12] = translation[0];
        m[13] = translation[1];
        m[14] = translation[2];
        m[15] = 1.0;
        Self { m }
    }

    /// Translation component.
    #[inline]
    pub fn position(&self) -> [f32; 3] {
        [self.m[12], self.m[13], self.m[14]]
    }

    /// Heading about +Y in degrees, from the projected Z axis.
    #[inline]
    pub fn yaw_degrees(&self) -> f32 {
        self.m[8].atan2(self.m[10]).to_degrees()
    }

    /// Transform a point.
    #[inline]
    pub fn transform_point(&self, p: [f32; 3]) -> [f32; 3] {
        let m = &self.m;
        [
            m[0] * p[0] + m[4] * p[1] + m[8] * p[2] + m[12],
            m[1] * p[0] + m[5] * p[1] + m[9] * p[2] + m[13],
            m[2] * p[0] + m[6] * p[1] + m[10] * p[2] + m[14],
        ]
    }

    /// Rotate a direction (ignores translation).
    #[inline]
    pub fn transform_vector(&self, v: [f32; 3]) -> [f32; 3] {
        let m = &self.m;
        [
            m[0] * v[0] + m[4] * v[1] + m[8] * v[2],
            m[1] * v[0] + m[5] * v[1] + m[9] * v[2],
            m[2] * v[0] + m[6] * v[1] + m[10] * v[2],
        ]
    }

    /// Gravity-aligned projection of this pose.
    pub fn to_planar(&self) -> PlanarPose {
        let p = self.position();
        PlanarPose::new(p[0], p[2], self.yaw_degrees())
    }
}

/// Position on the floor plane plus heading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanarPose {
    /// X position (meters)
    pub x: f32,
    /// Z position (meters)
    pub z: f32,
    /// Heading about +Y (degrees, [-180, 180])
    pub yaw_deg: f32,
}

impl PlanarPose {
    /// Create a pose; the heading is wrapped.
    pub fn new(x: f32, z: f32, yaw_deg: f32) -> Self {
        Self {
            x,
            z,
            yaw_deg: wrap_degrees(yaw_deg),
        }
    }

    /// Planar distance to another pose.
    #[inline]
    pub fn distance(&self, other: &PlanarPose) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Absolute wrapped heading difference (degrees).
    #[inline]
    pub fn yaw_delta(&self, other: &PlanarPose) -> f32 {
        wrap_degrees(other.yaw_deg - self.yaw_deg).abs()
    }
}

/// Map-from-session rigid transform restricted to yaw and XZ translation.
///
/// `p_map = R_y(yaw) · p_session + t`
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanarTransform {
    /// Rotation about +Y (degrees)
    pub yaw_deg: f32,
    /// X translation (meters)
    pub tx: f32,
    /// Z translation (meters)
    pub tz: f32,
}

impl PlanarTransform {
    /// Create a transform; the yaw is wrapped.
    pub fn new(yaw_deg: f32, tx: f32, tz: f32) -> Self {
        Self {
            yaw_deg: wrap_degrees(yaw_deg),
            tx,
            tz,
        }
    }

    /// Identity transform.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Apply to an XZ point.
    #[inline]
    pub fn apply_point(&self, x: f32, z: f32) -> (f32, f32) {
        let (s, c) = self.yaw_deg.to_radians().sin_cos();
        (c * x + s * z + self.tx, -s * x + c * z + self.tz)
    }

    /// Apply to a pose (position and heading).
    pub fn apply_pose(&self, pose: &PlanarPose) -> PlanarPose {
        let (x, z) = self.apply_point(pose.x, pose.z);
        PlanarPose::new(x, z, pose.yaw_deg + self.yaw_deg)
    }

    /// Translation magnitude (meters).
    #[inline]
    pub fn translation_norm(&self) -> f32 {
        (self.tx * self.tx + self.tz * self.tz).sqrt()
    }

    /// Lift to a full 4×4 transform (no vertical offset).
    pub fn to_transform(&self) -> Transform3D {
        Transform3D::from_yaw_translation(self.yaw_deg, [self.tx, 0.0, self.tz])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_planar() {
        let pose = Transform3D::identity().to_planar();
        assert_relative_eq!(pose.x, 0.0);
        assert_relative_eq!(pose.z, 0.0);
        assert_relative_eq!(pose.yaw_deg, 0.0);
    }

    #[test]
    fn test_yaw_roundtrip() {
        for yaw in [-170.0f32, -90.0, -12.5, 0.0, 45.0, 135.0] {
            let t = Transform3D::from_yaw_translation(yaw, [1.0, 1.5, -2.0]);
            assert_relative_eq!(t.yaw_degrees(), yaw, epsilon = 1e-3);
            assert_eq!(t.position(), [1.0, 1.5, -2.0]);
        }
    }

    #[test]
    fn test_transform_point_matches_planar() {
        let planar = PlanarTransform::new(30.0, 0.5, -1.0);
        let full = planar.to_transform();
        let p = full.transform_point([2.0, 0.7, 1.0]);
        let (x, z) = planar.apply_point(2.0, 1.0);
        assert_relative_eq!(p[0], x, epsilon = 1e-5);
        assert_relative_eq!(p[1], 0.7, epsilon = 1e-5);
        assert_relative_eq!(p[2], z, epsilon = 1e-5);
    }

    #[test]
    fn test_apply_pose_wraps_heading() {
        let t = PlanarTransform::new(90.0, 0.0, 0.0);
        let pose = t.apply_pose(&PlanarPose::new(0.0, 0.0, 120.0));
        assert_relative_eq!(pose.yaw_deg, -150.0, epsilon = 1e-4);
    }

    #[test]
    fn test_distance_and_yaw_delta() {
        let a = PlanarPose::new(0.0, 0.0, 170.0);
        let b = PlanarPose::new(3.0, 4.0, -170.0);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_relative_eq!(a.yaw_delta(&b), 20.0, epsilon = 1e-4);
    }
}
