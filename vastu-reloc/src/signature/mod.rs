//! Mesh signature descriptors and coarse matching.
//!
//! ## Pipeline
//!
//! ```text
//! MeshAnchor[] ──▶ Descriptor Builder ──▶ MeshSignatureDescriptor
//!                                              │
//!                   saved descriptor ──────────┤
//!                                              ▼
//!                                    Coarse Signature Matcher
//!                                              │
//!                                              ▼
//!                                  top-3 RelocalizationHypothesis
//! ```
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`MeshSignatureDescriptorBuilder`] | Yaw/height/occupancy summary of a mesh snapshot |
//! | [`CoarseSignatureMatcher`] | Circular correlation → ranked yaw hypotheses |
//! | [`compare_room_footprint`] | Saved room bounds vs live geometry |

mod descriptor;
mod matcher;
mod room;

pub use descriptor::{
    DescriptorConfig, MeshSignatureDescriptor, MeshSignatureDescriptorBuilder,
    OCCUPANCY_GRID_SIZE, XzBounds, downsample,
};
pub use matcher::{CoarseMatcherConfig, CoarseSignatureMatcher};
pub use room::{RoomSignatureHint, compare_room_footprint};
