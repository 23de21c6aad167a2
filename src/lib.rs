//! # ct-volume library
//!
//! This crate reconstructs a renderable 3D representation from an ordered
//! stack of 2D grayscale scan slices

//!
//! Each slice image is downsampled into a grid of color intensities, the
//! grids are stacked into a [`volume::Volume`], and the volume is turned
//! into geometry with one of two extraction strategies:
//!  - A dense opaque mesh: every voxel whose 8 corners are all above the
//!    intensity threshold contributes its 6 cube faces
//!  - Semi-transparent voxel instances: one translated, scaled cube per
//!    included voxel, with opacity tied to the voxel's mean intensity,
//!    batched per depth slice for ordered alpha compositing
//!
//!  If the environment supports it the slices are sampled in parallel
//!  using rayon, and both extraction passes run in parallel across depth
//!  slabs. Input stacks are assumed to have the following properties:
//!   - Slice order corresponds to physical depth order
//!   - All slices share one width and height
//!   - 8-bit RGB, RGBA or grayscale channels
//!
//!   Contributions are highly welcome!
//!
//! # Roadmap
//!
//!  - Interior face culling between adjacent included cubes
//!  - Averaged sampling instead of nearest-neighbor striding
//!  - Coincident vertex deduplication
//!
//! # Examples
//!
//! ## Reconstructing a mesh from a directory of slice images
//!
//! To read all image files from the slices/ directory in file-name order
//! and extract the dense surface mesh:
//!
//! ```no_run
//! # use ct_volume::{params::ProcessParams, pipeline::ReconstructionPipeline};
//! # use std::path::PathBuf;
//! let pipeline = ReconstructionPipeline::new(ProcessParams::default())
//!     .expect("default parameters are valid");
//! let volume = pipeline
//!     .build_volume_from_directory(&PathBuf::from("slices"))
//!     .expect("should have loaded slices from directory");
//! let mesh = pipeline
//!     .dense_mesh(&volume)
//!     .expect("should have extracted a mesh");
//! println!("{} triangles", mesh.triangle_count());
//! ```

pub mod dense_mesh;
pub mod geometry;
mod mapper;
pub mod params;
pub mod pipeline;
pub mod sampler;
pub mod volume;
pub mod voxel_instances;
