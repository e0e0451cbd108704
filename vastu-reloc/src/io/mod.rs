//! Artifact schemas and frame recordings.
//!
//! - **Artifacts**: saved mesh snapshot and room signature (JSON)
//! - **Frame logs**: JSON-lines recordings of [`FrameInput`](crate::core::FrameInput)
//!   for offline replay with `reloc_replay`
//!
//! ## Loading Artifacts
//!
//! ```rust,ignore
//! use vastu_reloc::io::{load_mesh_artifact, load_room_artifact};
//! use std::path::Path;
//!
//! let mesh = load_mesh_artifact(Path::new("kitchen.mesh.json"))?;
//! let room = load_room_artifact(Path::new("kitchen.room.json"))?;
//! engine.load_map(Some(mesh), Some(room), now);
//! ```

pub mod artifacts;
pub mod frame_log;

pub use artifacts::{
    LineSegment, MESH_ARTIFACT_VERSION, MeshMapArtifact, ObjectFootprint, ROOM_ARTIFACT_VERSION,
    RoomSignatureArtifact, check_same_map, load_mesh_artifact, load_room_artifact,
    read_mesh_artifact, read_room_artifact, write_mesh_artifact, write_room_artifact,
};
pub use frame_log::{FrameLogReader, FrameLogWriter};
