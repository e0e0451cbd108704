//! Benchmark the mesh fallback pipeline.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use vastu_reloc::alignment::{AlignmentRefiner, LiveMeshFrame, SavedMeshReference};
use vastu_reloc::io::{MESH_ARTIFACT_VERSION, MeshMapArtifact};
use vastu_reloc::signature::{CoarseSignatureMatcher, MeshSignatureDescriptorBuilder};
use vastu_reloc::{MeshAnchor, Transform3D};

/// Create a rectangular room mesh for benchmarking.
///
/// Four walls sampled on a grid, normals facing into the room.
fn room_mesh(width: f32, depth: f32, num_points: usize, offset: [f32; 2]) -> Vec<MeshAnchor> {
    let per_wall = (num_points / 4).max(1);
    let columns = (per_wall as f32).sqrt().ceil() as usize;
    let rows = per_wall.div_ceil(columns);

    let mut vertices = Vec::with_capacity(num_points);
    let mut normals = Vec::with_capacity(num_points);

    for r in 0..rows {
        for c in 0..columns {
            let u = c as f32 / columns as f32;
            let y = 2.5 * r as f32 / rows as f32;

            // South wall
            vertices.push([u * width, y, 0.0]);
            normals.push([0.0, 0.0, 1.0]);
            // North wall
            vertices.push([u * width, y, depth]);
            normals.push([0.0, 0.0, -1.0]);
            // West wall
            vertices.push([0.0, y, u * depth]);
            normals.push([1.0, 0.0, 0.0]);
            // East wall
            vertices.push([width, y, u * depth]);
            normals.push([-1.0, 0.0, 0.0]);
        }
    }

    let transform = Transform3D::from_yaw_translation(0.0, [offset[0], 0.0, offset[1]]);
    vec![MeshAnchor::new(transform, vertices, normals)]
}

fn bench_descriptor_build(c: &mut Criterion) {
    let builder = MeshSignatureDescriptorBuilder::default();
    let mut group = c.benchmark_group("descriptor_build");

    for num_points in [1000, 5000, 20000].iter() {
        let anchors = room_mesh(5.0, 4.0, *num_points, [0.0, 0.0]);
        group.bench_with_input(
            BenchmarkId::from_parameter(num_points),
            num_points,
            |b, _| b.iter(|| black_box(builder.build(black_box(&anchors)))),
        );
    }

    group.finish();
}

fn bench_fallback_tick(c: &mut Criterion) {
    let builder = MeshSignatureDescriptorBuilder::default();
    let matcher = CoarseSignatureMatcher::default();
    let refiner = AlignmentRefiner::default();

    let saved_anchors = room_mesh(5.0, 4.0, 5000, [0.0, 0.0]);
    let artifact = MeshMapArtifact {
        map_name: "bench".to_string(),
        captured_at: 0.0,
        descriptor: builder.build(&saved_anchors),
        anchors: saved_anchors,
        version: MESH_ARTIFACT_VERSION,
    };
    let saved = SavedMeshReference::from_artifact(&artifact, refiner.config().max_points);
    let live_anchors = room_mesh(5.0, 4.0, 5000, [0.4, -0.3]);

    c.bench_function("mesh_fallback_tick_5000pts", |b| {
        b.iter(|| {
            let descriptor = builder.build(black_box(&live_anchors));
            let hypotheses = matcher.match_descriptors(&saved.descriptor, &descriptor);
            let live = LiveMeshFrame {
                anchors: &live_anchors,
                descriptor: &descriptor,
                device_yaw_deg: 0.0,
                timestamp: 0.0,
            };
            black_box(refiner.refine(&hypotheses, &live, &saved))
        })
    });
}

criterion_group!(benches, bench_descriptor_build, bench_fallback_tick);
criterion_main!(benches);
