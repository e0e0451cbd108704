//! Saved-map artifact schemas.
//!
//! Artifacts are written and read by the persistence collaborator; the
//! engine only depends on their field shapes. JSON helpers are provided for
//! tools and tests.
//!
//! | Artifact | Produced | Consumed by |
//! |----------|----------|-------------|
//! | [`MeshMapArtifact`] | map save | mesh fallback (descriptor + anchors) |
//! | [`RoomSignatureArtifact`] | map save | room-signature fallback |

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::MeshAnchor;
use crate::error::{RelocError, Result};
use crate::signature::{MeshSignatureDescriptor, XzBounds};

/// Current mesh artifact format version.
pub const MESH_ARTIFACT_VERSION: u32 = 1;

/// Current room-signature artifact format version.
pub const ROOM_ARTIFACT_VERSION: u32 = 1;

/// Mesh snapshot saved alongside a map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshMapArtifact {
    /// Map this snapshot belongs to.
    pub map_name: String,
    /// Capture time (seconds since the Unix epoch).
    pub captured_at: f64,
    /// Mesh anchors at save time.
    pub anchors: Vec<MeshAnchor>,
    /// Signature built from `anchors` at save time.
    pub descriptor: MeshSignatureDescriptor,
    /// Format version.
    #[serde(default = "default_mesh_version")]
    pub version: u32,
}

fn default_mesh_version() -> u32 {
    MESH_ARTIFACT_VERSION
}

/// 2-D line segment on the floor plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    /// Start (x, z)
    pub start: [f32; 2],
    /// End (x, z)
    pub end: [f32; 2],
}

impl LineSegment {
    /// Segment length (meters).
    pub fn length(&self) -> f32 {
        let dx = self.end[0] - self.start[0];
        let dz = self.end[1] - self.start[1];
        (dx * dx + dz * dz).sqrt()
    }
}

/// Footprint of a piece of furniture or other object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectFootprint {
    /// Free-form category label.
    #[serde(default)]
    pub label: String,
    /// Center (x, z)
    pub center: [f32; 2],
    /// Size (width, depth)
    pub size: [f32; 2],
    /// Heading (degrees)
    #[serde(default)]
    pub yaw_deg: f32,
}

/// Structural room summary saved alongside a map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomSignatureArtifact {
    /// Map this signature belongs to.
    pub map_name: String,
    /// Capture time (seconds since the Unix epoch).
    pub captured_at: f64,
    /// Room bounds on the floor plane.
    pub bounds: XzBounds,
    /// Wall segments.
    #[serde(default)]
    pub walls: Vec<LineSegment>,
    /// Door/window openings.
    #[serde(default)]
    pub openings: Vec<LineSegment>,
    /// Object footprints.
    #[serde(default)]
    pub objects: Vec<ObjectFootprint>,
    /// Format version.
    #[serde(default = "default_room_version")]
    pub version: u32,
    /// Producer tag (e.g. "roomplan", "mesh").
    #[serde(default)]
    pub source: String,
}

fn default_room_version() -> u32 {
    ROOM_ARTIFACT_VERSION
}

impl RoomSignatureArtifact {
    /// Total wall length (meters).
    pub fn wall_length(&self) -> f32 {
        self.walls.iter().map(LineSegment::length).sum()
    }
}

/// Decode a mesh artifact, rejecting unknown versions.
pub fn read_mesh_artifact<R: Read>(reader: R) -> Result<MeshMapArtifact> {
    let artifact: MeshMapArtifact = serde_json::from_reader(reader)?;
    check_version(artifact.version, MESH_ARTIFACT_VERSION)?;
    Ok(artifact)
}

/// Encode a mesh artifact.
pub fn write_mesh_artifact<W: Write>(writer: W, artifact: &MeshMapArtifact) -> Result<()> {
    serde_json::to_writer(writer, artifact)?;
    Ok(())
}

/// Decode a room-signature artifact, rejecting unknown versions.
pub fn read_room_artifact<R: Read>(reader: R) -> Result<RoomSignatureArtifact> {
    let artifact: RoomSignatureArtifact = serde_json::from_reader(reader)?;
    check_version(artifact.version, ROOM_ARTIFACT_VERSION)?;
    Ok(artifact)
}

/// Encode a room-signature artifact.
pub fn write_room_artifact<W: Write>(writer: W, artifact: &RoomSignatureArtifact) -> Result<()> {
    serde_json::to_writer(writer, artifact)?;
    Ok(())
}

/// Load a mesh artifact from a file.
pub fn load_mesh_artifact(path: &Path) -> Result<MeshMapArtifact> {
    let file = std::fs::File::open(path)?;
    read_mesh_artifact(std::io::BufReader::new(file))
}

/// Load a room-signature artifact from a file.
pub fn load_room_artifact(path: &Path) -> Result<RoomSignatureArtifact> {
    let file = std::fs::File::open(path)?;
    read_room_artifact(std::io::BufReader::new(file))
}

/// Ensure a mesh and a room artifact describe the same map.
pub fn check_same_map(mesh: &MeshMapArtifact, room: &RoomSignatureArtifact) -> Result<()> {
    if mesh.map_name != room.map_name {
        return Err(RelocError::MapMismatch {
            found: room.map_name.clone(),
            expected: mesh.map_name.clone(),
        });
    }
    Ok(())
}

fn check_version(found: u32, expected: u32) -> Result<()> {
    if found != expected {
        return Err(RelocError::UnsupportedVersion { found, expected });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transform3D;

    fn room(name: &str) -> RoomSignatureArtifact {
        RoomSignatureArtifact {
            map_name: name.to_string(),
            captured_at: 1_700_000_000.0,
            bounds: XzBounds {
                min_x: 0.0,
                max_x: 4.0,
                min_z: 0.0,
                max_z: 3.0,
            },
            walls: vec![
                LineSegment {
                    start: [0.0, 0.0],
                    end: [4.0, 0.0],
                },
                LineSegment {
                    start: [4.0, 0.0],
                    end: [4.0, 3.0],
                },
            ],
            openings: Vec::new(),
            objects: Vec::new(),
            version: ROOM_ARTIFACT_VERSION,
            source: "mesh".to_string(),
        }
    }

    fn mesh(name: &str) -> MeshMapArtifact {
        MeshMapArtifact {
            map_name: name.to_string(),
            captured_at: 1_700_000_000.0,
            anchors: vec![MeshAnchor::new(
                Transform3D::identity(),
                vec![[0.0, 0.0, 0.0]],
                vec![[1.0, 0.0, 0.0]],
            )],
            descriptor: MeshSignatureDescriptor::empty(),
            version: MESH_ARTIFACT_VERSION,
        }
    }

    #[test]
    fn test_mesh_artifact_json() {
        let artifact = mesh("kitchen");
        let mut buf = Vec::new();
        write_mesh_artifact(&mut buf, &artifact).unwrap();
        let parsed = read_mesh_artifact(buf.as_slice()).unwrap();
        assert_eq!(parsed, artifact);
    }

    #[test]
    fn test_room_version_rejected() {
        let mut artifact = room("kitchen");
        artifact.version = 99;
        let mut buf = Vec::new();
        write_room_artifact(&mut buf, &artifact).unwrap();
        let err = read_room_artifact(buf.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            RelocError::UnsupportedVersion {
                found: 99,
                expected: 1
            }
        ));
    }

    #[test]
    fn test_wall_length() {
        assert!((room("a").wall_length() - 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_map_mismatch() {
        assert!(check_same_map(&mesh("a"), &room("a")).is_ok());
        assert!(matches!(
            check_same_map(&mesh("a"), &room("b")),
            Err(RelocError::MapMismatch { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room.json");
        let file = std::fs::File::create(&path).unwrap();
        write_room_artifact(file, &room("hall")).unwrap();
        let loaded = load_room_artifact(&path).unwrap();
        assert_eq!(loaded.map_name, "hall");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_mesh_artifact(Path::new("/nonexistent/mesh.json")).unwrap_err();
        assert!(matches!(err, RelocError::Io(_)));
    }
}
