//! Mesh signature descriptor for coarse room recognition.
//!
//! A compact, rotation-aware summary of a mesh snapshot that can be stored in
//! the saved map artifact and compared against the live mesh every fallback
//! tick.
//!
//! # Layout
//!
//! | Field | Size | Content |
//! |-------|------|---------|
//! | yaw histogram | 12 bins | wall-normal headings, sum = 1 |
//! | height histogram | 8 bins | vertex heights over observed range, sum = 1 |
//! | occupancy | 1 × u64 | 8×8 XZ grid over the bounds, bit = row·8 + col |
//! | bounds | 4 × f32 | axis-aligned XZ extent |
//!
//! Wall-like normals are those with |y| < 0.45 (mostly horizontal). Their XZ
//! projection heading, `atan2(z, x)`, lands in one of 12 equal sectors of
//! [-π, π). Rotating the room about +Y therefore circularly shifts the yaw
//! histogram, which is what [`CoarseSignatureMatcher`](super::CoarseSignatureMatcher)
//! exploits.

use serde::{Deserialize, Serialize};

use crate::core::{MeshAnchor, SurfacePoint, collect_surface_points};

/// Side length of the occupancy grid (one 64-bit word).
pub const OCCUPANCY_GRID_SIZE: usize = 8;

/// Configuration for descriptor construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DescriptorConfig {
    /// Maximum points kept after uniform-stride down-sampling.
    /// Default: 5000
    #[serde(default = "default_max_points")]
    pub max_points: usize,

    /// Normals with |y| below this are treated as wall-like.
    /// Default: 0.45
    #[serde(default = "default_wall_normal_max_y")]
    pub wall_normal_max_y: f32,

    /// Number of yaw histogram bins.
    /// Default: 12 (30° sectors)
    #[serde(default = "default_yaw_bins")]
    pub yaw_bins: usize,

    /// Number of height histogram bins.
    /// Default: 8
    #[serde(default = "default_height_bins")]
    pub height_bins: usize,
}

fn default_max_points() -> usize {
    5000
}
fn default_wall_normal_max_y() -> f32 {
    0.45
}
fn default_yaw_bins() -> usize {
    12
}
fn default_height_bins() -> usize {
    8
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
            wall_normal_max_y: default_wall_normal_max_y(),
            yaw_bins: default_yaw_bins(),
            height_bins: default_height_bins(),
        }
    }
}

/// Axis-aligned bounds on the XZ floor plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct XzBounds {
    /// Minimum X (meters)
    pub min_x: f32,
    /// Maximum X (meters)
    pub max_x: f32,
    /// Minimum Z (meters)
    pub min_z: f32,
    /// Maximum Z (meters)
    pub max_z: f32,
}

impl XzBounds {
    /// Bounds enclosing the given positions. `None` if empty.
    pub fn from_positions<'a, I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a [f32; 3]>,
    {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let mut bounds = Self {
            min_x: first[0],
            max_x: first[0],
            min_z: first[2],
            max_z: first[2],
        };
        for p in iter {
            bounds.min_x = bounds.min_x.min(p[0]);
            bounds.max_x = bounds.max_x.max(p[0]);
            bounds.min_z = bounds.min_z.min(p[2]);
            bounds.max_z = bounds.max_z.max(p[2]);
        }
        Some(bounds)
    }

    /// Extent along X.
    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Extent along Z.
    #[inline]
    pub fn depth(&self) -> f32 {
        self.max_z - self.min_z
    }

    /// Center point (x, z).
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (
            0.5 * (self.min_x + self.max_x),
            0.5 * (self.min_z + self.max_z),
        )
    }

    /// Whether (x, z) lies inside, expanded by `margin` on every side.
    #[inline]
    pub fn contains(&self, x: f32, z: f32, margin: f32) -> bool {
        x >= self.min_x - margin
            && x <= self.max_x + margin
            && z >= self.min_z - margin
            && z <= self.max_z + margin
    }
}

/// Compact mesh signature.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshSignatureDescriptor {
    /// Wall-normal heading histogram (normalized).
    pub yaw_histogram: Vec<f32>,
    /// Vertex height histogram (normalized).
    pub height_histogram: Vec<f32>,
    /// Occupancy words; one 8×8 grid today.
    pub occupancy: Vec<u64>,
    /// XZ bounds of the sampled points.
    pub bounds: XzBounds,
    /// Number of sampled points.
    pub point_count: usize,
}

impl MeshSignatureDescriptor {
    /// Descriptor for "no mesh data": zero-length histograms.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when there is nothing to match against.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.yaw_histogram.is_empty()
    }

    /// Number of occupied cells in the first occupancy word.
    pub fn occupied_cells(&self) -> u32 {
        self.occupancy.first().map_or(0, |w| w.count_ones())
    }
}

/// Builds [`MeshSignatureDescriptor`]s from mesh anchors.
#[derive(Clone, Debug, Default)]
pub struct MeshSignatureDescriptorBuilder {
    config: DescriptorConfig,
}

impl MeshSignatureDescriptorBuilder {
    /// Create a builder.
    pub fn new(config: DescriptorConfig) -> Self {
        Self { config }
    }

    /// Get configuration.
    pub fn config(&self) -> &DescriptorConfig {
        &self.config
    }

    /// Build a descriptor from mesh anchors.
    ///
    /// Returns [`MeshSignatureDescriptor::empty`] when the anchors hold no
    /// vertices.
    pub fn build(&self, anchors: &[MeshAnchor]) -> MeshSignatureDescriptor {
        let points = downsample(&collect_surface_points(anchors), self.config.max_points);
        self.build_from_points(&points)
    }

    /// Build from already-collected session-frame points.
    pub fn build_from_points(&self, points: &[SurfacePoint]) -> MeshSignatureDescriptor {
        let Some(bounds) = XzBounds::from_positions(points.iter().map(|p| &p.position)) else {
            return MeshSignatureDescriptor::empty();
        };

        let yaw_histogram = self.yaw_histogram(points);
        let height_histogram = self.height_histogram(points);
        let occupancy = vec![occupancy_word(points, &bounds)];

        MeshSignatureDescriptor {
            yaw_histogram,
            height_histogram,
            occupancy,
            bounds,
            point_count: points.len(),
        }
    }

    fn yaw_histogram(&self, points: &[SurfacePoint]) -> Vec<f32> {
        let bins = self.config.yaw_bins.max(1);
        let mut histogram = vec![0.0f32; bins];
        let sector = std::f32::consts::TAU / bins as f32;

        for normal in points.iter().filter_map(|p| p.normal) {
            if normal[1].abs() >= self.config.wall_normal_max_y {
                continue;
            }
            let len = (normal[0] * normal[0] + normal[2] * normal[2]).sqrt();
            if len <= f32::EPSILON {
                continue;
            }
            let angle = (normal[2] / len).atan2(normal[0] / len);
            let bin = (((angle + std::f32::consts::PI) / sector) as usize).min(bins - 1);
            histogram[bin] += 1.0;
        }

        normalize(&mut histogram);
        histogram
    }

    fn height_histogram(&self, points: &[SurfacePoint]) -> Vec<f32> {
        let bins = self.config.height_bins.max(1);
        let mut histogram = vec![0.0f32; bins];

        let (min_y, max_y) = points.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
            (lo.min(p.position[1]), hi.max(p.position[1]))
        });
        let range = max_y - min_y;

        for p in points {
            let bin = if range > f32::EPSILON {
                (((p.position[1] - min_y) / range * bins as f32) as usize).min(bins - 1)
            } else {
                0
            };
            histogram[bin] += 1.0;
        }

        normalize(&mut histogram);
        histogram
    }
}

/// Keep every `ceil(n / max_points)`-th point.
pub fn downsample<T: Copy>(points: &[T], max_points: usize) -> Vec<T> {
    if max_points == 0 {
        return Vec::new();
    }
    if points.len() <= max_points {
        return points.to_vec();
    }
    let stride = points.len().div_ceil(max_points);
    points.iter().step_by(stride).copied().collect()
}

/// Divide by max(sum, 1).
fn normalize(histogram: &mut [f32]) {
    let sum: f32 = histogram.iter().sum();
    let denom = sum.max(1.0);
    for v in histogram.iter_mut() {
        *v /= denom;
    }
}

/// Fold an 8×8 XZ occupancy grid into one word.
fn occupancy_word(points: &[SurfacePoint], bounds: &XzBounds) -> u64 {
    let n = OCCUPANCY_GRID_SIZE;
    let width = bounds.width().max(f32::EPSILON);
    let depth = bounds.depth().max(f32::EPSILON);
    let mut word = 0u64;

    for p in points {
        let col = (((p.position[0] - bounds.min_x) / width * n as f32) as usize).min(n - 1);
        let row = (((p.position[2] - bounds.min_z) / depth * n as f32) as usize).min(n - 1);
        word |= 1u64 << (row * n + col);
    }

    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transform3D;
    use approx::assert_relative_eq;

    fn wall_anchor(normal: [f32; 3], count: usize) -> MeshAnchor {
        let vertices = (0..count)
            .map(|i| [i as f32 * 0.1, (i % 5) as f32 * 0.5, (i % 7) as f32 * 0.2])
            .collect();
        MeshAnchor::new(Transform3D::identity(), vertices, vec![normal; count])
    }

    #[test]
    fn test_empty_input_gives_empty_descriptor() {
        let builder = MeshSignatureDescriptorBuilder::default();
        let desc = builder.build(&[]);
        assert!(desc.is_empty());
        assert_eq!(desc.point_count, 0);
        assert!(desc.occupancy.is_empty());
    }

    #[test]
    fn test_histograms_sum_to_one() {
        let builder = MeshSignatureDescriptorBuilder::default();
        let desc = builder.build(&[wall_anchor([1.0, 0.0, 0.0], 40), wall_anchor([0.0, 0.0, 1.0], 20)]);

        assert_eq!(desc.yaw_histogram.len(), 12);
        assert_eq!(desc.height_histogram.len(), 8);
        assert_relative_eq!(desc.yaw_histogram.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(desc.height_histogram.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        assert_eq!(desc.point_count, 60);
    }

    #[test]
    fn test_yaw_bin_placement() {
        let builder = MeshSignatureDescriptorBuilder::default();
        // 15°: (180 + 15) / 30 → bin 6 of [-π, π)
        let n = 15f32.to_radians();
        let desc = builder.build(&[wall_anchor([n.cos(), 0.0, n.sin()], 10)]);
        assert_relative_eq!(desc.yaw_histogram[6], 1.0);
        // 105°: (180 + 105) / 30 → bin 9
        let n = 105f32.to_radians();
        let desc = builder.build(&[wall_anchor([n.cos(), 0.0, n.sin()], 10)]);
        assert_relative_eq!(desc.yaw_histogram[9], 1.0);
    }

    #[test]
    fn test_floor_normals_leave_yaw_histogram_zero() {
        let builder = MeshSignatureDescriptorBuilder::default();
        let desc = builder.build(&[wall_anchor([0.0, 1.0, 0.0], 30)]);
        assert!(!desc.is_empty());
        assert!(desc.yaw_histogram.iter().all(|&v| v == 0.0));
        assert_relative_eq!(desc.height_histogram.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_downsample_respects_limit() {
        let points: Vec<u32> = (0..12_001).collect();
        let sampled = downsample(&points, 5000);
        assert!(sampled.len() <= 5000);
        assert_eq!(sampled[0], 0);
        assert_eq!(sampled[1], 3);

        let small: Vec<u32> = (0..10).collect();
        assert_eq!(downsample(&small, 5000).len(), 10);
    }

    #[test]
    fn test_occupancy_corners() {
        let builder = MeshSignatureDescriptorBuilder::default();
        let anchor = MeshAnchor::new(
            Transform3D::identity(),
            vec![[0.0, 0.0, 0.0], [4.0, 0.0, 4.0]],
            Vec::new(),
        );
        let desc = builder.build(&[anchor]);
        assert_eq!(desc.occupancy.len(), 1);
        assert_eq!(desc.occupancy[0], 1u64 | (1u64 << 63));
        assert_eq!(desc.occupied_cells(), 2);
    }

    #[test]
    fn test_deterministic() {
        let builder = MeshSignatureDescriptorBuilder::default();
        let anchors = [wall_anchor([0.7, 0.1, 0.7], 25), wall_anchor([-1.0, 0.0, 0.0], 25)];
        assert_eq!(builder.build(&anchors), builder.build(&anchors));
    }

    #[test]
    fn test_bounds_center_and_contains() {
        let bounds = XzBounds {
            min_x: -1.0,
            max_x: 3.0,
            min_z: 0.0,
            max_z: 2.0,
        };
        assert_eq!(bounds.center(), (1.0, 1.0));
        assert_eq!(bounds.width(), 4.0);
        assert!(bounds.contains(3.2, 1.0, 0.25));
        assert!(!bounds.contains(3.5, 1.0, 0.25));
    }
}
