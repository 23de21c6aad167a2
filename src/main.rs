use std::path::PathBuf;

use ct_volume::{params::ProcessParams, pipeline::ReconstructionPipeline};

fn main() {
    let dir = std::env::args().nth(1).unwrap_or_else(|| String::from("slices"));
    let pipeline = ReconstructionPipeline::new(ProcessParams::default())
        .expect("default parameters should be valid");
    let volume = pipeline
        .build_volume_from_directory(&PathBuf::from(dir))
        .expect("should have loaded slices from directory");
    let (width, height, depth) = volume.dims();
    println!("volume: {width}x{height}x{depth}");

    let mesh = pipeline
        .dense_mesh(&volume)
        .expect("should have extracted the dense mesh");
    println!("dense mesh: {} triangles", mesh.triangle_count());

    let batches = pipeline
        .voxel_instances(&volume)
        .expect("should have extracted voxel instances");
    let instances: usize = batches.iter().map(|batch| batch.len()).sum();
    println!("voxel instances: {instances} across {} depth batches", batches.len());
}
