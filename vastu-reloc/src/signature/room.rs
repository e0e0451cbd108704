//! Room-signature comparison for the secondary fallback.
//!
//! When no saved mesh is available (or while the mesh pipeline is idle) the
//! saved room footprint still says something useful: whether the live
//! geometry is about the right size, whether it looks rotated by a quarter
//! turn, and where its center sits relative to the saved room.

use serde::{Deserialize, Serialize};

use crate::io::RoomSignatureArtifact;

use super::MeshSignatureDescriptor;

/// Coarse agreement between live geometry and a saved room footprint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomSignatureHint {
    /// Extent agreement in [0, 1] (1 = identical width and depth).
    pub extent_agreement: f32,
    /// Live extents match better after a 90° turn.
    pub quarter_turn: bool,
    /// Saved room center minus live center, X (meters).
    pub center_dx: f32,
    /// Saved room center minus live center, Z (meters).
    pub center_dz: f32,
    /// Saved wall length against the live bounds perimeter, in [0, 1].
    /// `None` when the saved room has no walls.
    #[serde(default)]
    pub wall_agreement: Option<f32>,
}

/// Compare a live descriptor against a saved room footprint.
///
/// Returns `None` when the live descriptor holds no geometry or the saved
/// room is degenerate.
pub fn compare_room_footprint(
    room: &RoomSignatureArtifact,
    live: &MeshSignatureDescriptor,
) -> Option<RoomSignatureHint> {
    if live.point_count == 0 {
        return None;
    }
    let (rw, rd) = (room.bounds.width(), room.bounds.depth());
    if rw <= f32::EPSILON || rd <= f32::EPSILON {
        return None;
    }
    let (lw, ld) = (live.bounds.width(), live.bounds.depth());

    let aligned = ratio(rw, lw) * ratio(rd, ld);
    let turned = ratio(rw, ld) * ratio(rd, lw);

    let wall_length = room.wall_length();
    let wall_agreement =
        (wall_length > f32::EPSILON).then(|| ratio(wall_length, 2.0 * (lw + ld)));

    let (room_cx, room_cz) = room.bounds.center();
    let (live_cx, live_cz) = live.bounds.center();

    Some(RoomSignatureHint {
        extent_agreement: aligned.max(turned),
        quarter_turn: turned > aligned,
        center_dx: room_cx - live_cx,
        center_dz: room_cz - live_cz,
        wall_agreement,
    })
}

fn ratio(a: f32, b: f32) -> f32 {
    let hi = a.max(b);
    if hi <= f32::EPSILON {
        return 0.0;
    }
    a.min(b) / hi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::LineSegment;
    use crate::signature::XzBounds;
    use approx::assert_relative_eq;

    fn room(w: f32, d: f32) -> RoomSignatureArtifact {
        RoomSignatureArtifact {
            map_name: "room".into(),
            captured_at: 0.0,
            bounds: XzBounds {
                min_x: 0.0,
                max_x: w,
                min_z: 0.0,
                max_z: d,
            },
            walls: Vec::new(),
            openings: Vec::new(),
            objects: Vec::new(),
            version: 1,
            source: String::new(),
        }
    }

    fn live(w: f32, d: f32, offset: f32) -> MeshSignatureDescriptor {
        MeshSignatureDescriptor {
            yaw_histogram: vec![0.0; 12],
            height_histogram: vec![0.0; 8],
            occupancy: vec![0],
            bounds: XzBounds {
                min_x: offset,
                max_x: offset + w,
                min_z: 0.0,
                max_z: d,
            },
            point_count: 500,
        }
    }

    #[test]
    fn test_identical_footprint() {
        let hint = compare_room_footprint(&room(4.0, 3.0), &live(4.0, 3.0, 0.0)).unwrap();
        assert_relative_eq!(hint.extent_agreement, 1.0);
        assert!(!hint.quarter_turn);
        assert_relative_eq!(hint.center_dx, 0.0);
    }

    #[test]
    fn test_quarter_turn_detected() {
        let hint = compare_room_footprint(&room(6.0, 3.0), &live(3.0, 6.0, 1.0)).unwrap();
        assert!(hint.quarter_turn);
        assert_relative_eq!(hint.extent_agreement, 1.0);
        assert_relative_eq!(hint.center_dx, 3.0 - 2.5);
    }

    #[test]
    fn test_wall_agreement() {
        assert!(
            compare_room_footprint(&room(4.0, 3.0), &live(4.0, 3.0, 0.0))
                .unwrap()
                .wall_agreement
                .is_none()
        );

        let mut walled = room(4.0, 3.0);
        walled.walls = vec![
            LineSegment {
                start: [0.0, 0.0],
                end: [4.0, 0.0],
            },
            LineSegment {
                start: [4.0, 0.0],
                end: [4.0, 3.0],
            },
        ];
        let hint = compare_room_footprint(&walled, &live(4.0, 3.0, 0.0)).unwrap();
        assert_relative_eq!(hint.wall_agreement.unwrap(), 0.5);

        // A closed outline matches the full live perimeter.
        walled.walls.push(LineSegment {
            start: [4.0, 3.0],
            end: [0.0, 3.0],
        });
        walled.walls.push(LineSegment {
            start: [0.0, 3.0],
            end: [0.0, 0.0],
        });
        let hint = compare_room_footprint(&walled, &live(4.0, 3.0, 0.0)).unwrap();
        assert_relative_eq!(hint.wall_agreement.unwrap(), 1.0);
    }

    #[test]
    fn test_partial_scan_lowers_agreement() {
        let hint = compare_room_footprint(&room(4.0, 4.0), &live(2.0, 4.0, 0.0)).unwrap();
        assert_relative_eq!(hint.extent_agreement, 0.5);
    }

    #[test]
    fn test_empty_live_gives_none() {
        assert!(compare_room_footprint(&room(4.0, 3.0), &MeshSignatureDescriptor::empty()).is_none());
        assert!(compare_room_footprint(&room(0.0, 3.0), &live(4.0, 3.0, 0.0)).is_none());
    }
}
