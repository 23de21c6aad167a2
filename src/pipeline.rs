use crate::dense_mesh::extract_dense_mesh;
use crate::geometry::MeshBuffers;
use crate::params::{ParamsError, ProcessParams};
use crate::sampler::{SamplerError, SliceSampler};
use crate::volume::{Volume, VolumeError};
use crate::voxel_instances::{InstanceBatch, extract_voxel_instances};

use image::DynamicImage;
use ndarray::Array2;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no decodable images found")]
    NoImages,

    #[error("reconstruction was cancelled")]
    Cancelled,

    #[error("invalid parameters: {0}")]
    Params(#[from] ParamsError),

    #[error("slice {} could not be sampled: {}", .path.display(), .source)]
    Slice { path: PathBuf, source: SamplerError },

    #[error("sampling error: {0}")]
    Sampler(#[from] SamplerError),

    #[error("volume error: {0}")]
    Volume(#[from] VolumeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cloneable flag used to abandon an in-flight reconstruction.
///
/// Sampling checks the flag before each slice and every pipeline stage
/// checks it on entry and exit, so a superseded request stops early and
/// never hands back a stale result.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// One reconstruction request: validated parameters plus a cancellation
/// token, turning image stacks into volumes and volumes into geometry.
///
/// Slices are sampled concurrently; volume aggregation waits for every
/// slice before either extraction pass may run.
pub struct ReconstructionPipeline {
    params: ProcessParams,
    cancel: CancellationToken,
}

impl ReconstructionPipeline {
    /// # Errors
    ///
    /// Rejects invalid parameters before any sampling begins.
    pub fn new(params: ProcessParams) -> Result<Self, PipelineError> {
        params.validate()?;
        Ok(Self {
            params,
            cancel: CancellationToken::new(),
        })
    }

    /// Token that cancels this pipeline's in-flight work when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn params(&self) -> &ProcessParams {
        &self.params
    }

    /// Sample every image file in `paths` concurrently and aggregate the
    /// slices into a volume, preserving the input order as stack order.
    ///
    /// # Errors
    ///
    /// Fails on the first slice that cannot be decoded; a blank substitute
    /// would slip past the dimension checks and yield misleading geometry.
    pub fn build_volume_from_paths(
        &self,
        paths: &[impl AsRef<Path> + Sync],
    ) -> Result<Volume, PipelineError> {
        let slices: Vec<Array2<f32>> = paths
            .par_iter()
            .map(|path| {
                self.checkpoint()?;
                SliceSampler::sample_file(path.as_ref(), &self.params).map_err(|source| {
                    PipelineError::Slice {
                        path: path.as_ref().to_path_buf(),
                        source,
                    }
                })
            })
            .collect::<Result<_, _>>()?;
        self.checkpoint()?;
        Ok(Volume::build(&slices)?)
    }

    /// Build a volume from every decodable image file in a directory,
    /// ordered by file name.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be read or holds no image files.
    pub fn build_volume_from_directory(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Volume, PipelineError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| has_image_extension(path))
            .collect();

        if paths.is_empty() {
            return Err(PipelineError::NoImages);
        }
        paths.sort();

        self.build_volume_from_paths(&paths)
    }

    /// Build a volume from already decoded images, in stack order.
    pub fn build_volume_from_images(
        &self,
        images: &[DynamicImage],
    ) -> Result<Volume, PipelineError> {
        let slices: Vec<Array2<f32>> = images
            .par_iter()
            .map(|image| {
                self.checkpoint()?;
                SliceSampler::sample_image(image, &self.params).map_err(PipelineError::from)
            })
            .collect::<Result<_, _>>()?;
        self.checkpoint()?;
        Ok(Volume::build(&slices)?)
    }

    /// Run the dense extraction pass and flatten the triangles into
    /// upload-ready buffers.
    pub fn dense_mesh(&self, volume: &Volume) -> Result<MeshBuffers, PipelineError> {
        self.checkpoint()?;
        let triangles = extract_dense_mesh(volume, &self.params)?;
        self.checkpoint()?;
        Ok(MeshBuffers::from_triangles(&triangles))
    }

    /// Run the translucent extraction pass.
    pub fn voxel_instances(&self, volume: &Volume) -> Result<Vec<InstanceBatch>, PipelineError> {
        self.checkpoint()?;
        let batches = extract_voxel_instances(volume, &self.params)?;
        self.checkpoint()?;
        Ok(batches)
    }

    fn checkpoint(&self) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn white_stack(count: usize, side: u32) -> Vec<DynamicImage> {
        (0..count)
            .map(|_| DynamicImage::ImageRgb8(RgbImage::from_pixel(side, side, Rgb([255, 255, 255]))))
            .collect()
    }

    fn pipeline(sample_rate: u32) -> ReconstructionPipeline {
        ReconstructionPipeline::new(ProcessParams {
            sample_rate,
            pixel_intensity_threshold: 0.85,
        })
        .unwrap()
    }

    #[test]
    fn invalid_params_are_rejected_up_front() {
        let result = ReconstructionPipeline::new(ProcessParams {
            sample_rate: 0,
            pixel_intensity_threshold: 0.85,
        });
        assert!(matches!(result, Err(PipelineError::Params(_))));
    }

    #[test]
    fn white_stack_reconstructs_every_cube() {
        let pipeline = pipeline(2);
        let volume = pipeline.build_volume_from_images(&white_stack(3, 6)).unwrap();
        assert_eq!(volume.dims(), (3, 3, 3));

        let mesh = pipeline.dense_mesh(&volume).unwrap();
        // (3-1)^2 cubes per inner slice, 2 inner slices, 12 triangles each.
        assert_eq!(mesh.triangle_count(), 96);

        let batches = pipeline.voxel_instances(&volume).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches.iter().map(InstanceBatch::len).sum::<usize>(), 8);
    }

    #[test]
    fn mismatched_stacks_fail_volume_aggregation() {
        let pipeline = pipeline(1);
        let images = vec![
            DynamicImage::ImageRgb8(RgbImage::new(4, 4)),
            DynamicImage::ImageRgb8(RgbImage::new(5, 4)),
        ];
        let result = pipeline.build_volume_from_images(&images);
        assert!(matches!(
            result,
            Err(PipelineError::Volume(VolumeError::DimensionMismatch { .. }))
        ));
    }

    #[test]
    fn cancelled_pipelines_refuse_to_sample() {
        let pipeline = pipeline(1);
        pipeline.cancellation_token().cancel();
        let result = pipeline.build_volume_from_images(&white_stack(2, 4));
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[test]
    fn cancelled_pipelines_refuse_to_extract() {
        let pipeline = pipeline(1);
        let volume = pipeline.build_volume_from_images(&white_stack(2, 4)).unwrap();
        pipeline.cancellation_token().cancel();
        assert!(matches!(
            pipeline.dense_mesh(&volume),
            Err(PipelineError::Cancelled)
        ));
        assert!(matches!(
            pipeline.voxel_instances(&volume),
            Err(PipelineError::Cancelled)
        ));
    }

    #[test]
    fn image_extension_filter_is_case_insensitive() {
        assert!(has_image_extension(Path::new("scan/001.PNG")));
        assert!(has_image_extension(Path::new("scan/001.jpeg")));
        assert!(!has_image_extension(Path::new("scan/001.dcm")));
        assert!(!has_image_extension(Path::new("scan/README")));
    }
}
