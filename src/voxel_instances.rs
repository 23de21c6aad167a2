use nalgebra::{Matrix4, Vector3};
use rayon::prelude::*;

use crate::mapper::{RenderSpaceMapper, Z_OFFSET_VOXEL};
use crate::params::ProcessParams;
use crate::volume::{Volume, VolumeError};

/// A single renderable voxel: a model transform placing a unit cube at the
/// voxel center, and an RGBA color whose four channels all carry the
/// voxel's mean corner intensity, so denser voxels render brighter and
/// more opaque.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelInstance {
    pub model: Matrix4<f32>,
    pub color: [f32; 4],
}

/// All voxel instances of one depth slice.
///
/// Batches are returned in ascending depth index and render z recedes as
/// the index grows, so a renderer must draw batches in descending index
/// order to composite translucent voxels back to front. This ordering is
/// part of the contract, not a hint.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceBatch {
    pub depth_index: usize,
    pub instances: Vec<VoxelInstance>,
}

impl InstanceBatch {
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Model matrices flattened to 16 floats per instance in column-major
    /// order, ready for an instanced attribute buffer.
    pub fn model_matrix_data(&self) -> Vec<f32> {
        self.instances
            .iter()
            .flat_map(|instance| instance.model.iter().copied())
            .collect()
    }

    /// RGBA colors flattened to 4 floats per instance.
    pub fn color_data(&self) -> Vec<f32> {
        self.instances
            .iter()
            .flat_map(|instance| instance.color)
            .collect()
    }
}

/// Extract one translucent cube instance per included voxel, grouped by
/// depth slice.
///
/// Scans the same cubes as the dense path with the same strict all-corners
/// inclusion test, and always produces exactly `depth - 1` batches (one
/// per z in `[1, depth - 1]`, empty batches included) so consumers can
/// rely on the batch count.
///
/// # Errors
///
/// Propagates [`VolumeError::OutOfBounds`] if a cube corner falls outside
/// the volume; unreachable for the current scan bounds.
pub fn extract_voxel_instances(
    volume: &Volume,
    params: &ProcessParams,
) -> Result<Vec<InstanceBatch>, VolumeError> {
    let mapper = RenderSpaceMapper::new(volume, params, Z_OFFSET_VOXEL);
    let threshold = params.pixel_intensity_threshold;
    let (width, height, depth) = volume.dims();
    let scale = Vector3::new(2.0 / width as f32, 2.0 / height as f32, 1.0);

    (1..depth)
        .into_par_iter()
        .map(|z| {
            let mut instances = Vec::new();
            for y in 1..height {
                for x in 1..width {
                    let corners = volume.cube_corners(x, y, z)?;
                    if !volume.all_above_threshold(&corners, threshold)? {
                        continue;
                    }
                    let center = mapper.cell_center(x, y, z);
                    let model = Matrix4::new_translation(&center.coords)
                        * Matrix4::new_nonuniform_scaling(&scale);
                    let intensity = average_intensity(volume, &corners)?;
                    instances.push(VoxelInstance {
                        model,
                        color: [intensity; 4],
                    });
                }
            }
            Ok(InstanceBatch {
                depth_index: z,
                instances,
            })
        })
        .collect()
}

/// Mean intensity over a cube's 8 corners.
fn average_intensity(volume: &Volume, corners: &[[usize; 3]; 8]) -> Result<f32, VolumeError> {
    let mut sum = 0.0;
    for &[x, y, z] in corners {
        sum += volume.intensity_at(x, y, z)?;
    }
    Ok(sum / corners.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn volume(width: usize, height: usize, depth: usize, value: f32) -> Volume {
        let slices: Vec<_> = (0..depth)
            .map(|_| Array2::from_elem((height, width), value))
            .collect();
        Volume::build(&slices).unwrap()
    }

    fn params() -> ProcessParams {
        ProcessParams {
            sample_rate: 2,
            pixel_intensity_threshold: 0.5,
        }
    }

    #[test]
    fn one_batch_per_inner_depth_slice() {
        let batches = extract_voxel_instances(&volume(3, 3, 5, 1.0), &params()).unwrap();
        assert_eq!(batches.len(), 4);
        for (index, batch) in batches.iter().enumerate() {
            assert_eq!(batch.depth_index, index + 1);
            assert_eq!(batch.len(), 4);
        }
    }

    #[test]
    fn below_threshold_batches_stay_but_are_empty() {
        let batches = extract_voxel_instances(&volume(3, 3, 3, 0.2), &params()).unwrap();
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(InstanceBatch::is_empty));
    }

    #[test]
    fn color_channels_all_carry_the_mean_corner_intensity() {
        let mut slices = vec![
            Array2::from_elem((2, 2), 1.0),
            Array2::from_elem((2, 2), 0.6),
        ];
        slices[1][[0, 0]] = 1.0;
        let volume = Volume::build(&slices).unwrap();

        let batches = extract_voxel_instances(&volume, &params()).unwrap();
        let instance = &batches[0].instances[0];
        let mean = (4.0 * 1.0 + 3.0 * 0.6 + 1.0) / 8.0;
        for channel in instance.color {
            assert_relative_eq!(channel, mean, epsilon = 1e-6);
        }
    }

    #[test]
    fn model_transform_translates_and_scales() {
        let batches = extract_voxel_instances(&volume(3, 3, 2, 1.0), &params()).unwrap();
        let instance = &batches[0].instances[0];
        let data = batches[0].model_matrix_data();
        assert_eq!(data.len(), batches[0].len() * 16);

        // Column-major: scale on the diagonal, translation in column 3.
        assert_relative_eq!(data[0], 2.0 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(data[5], 2.0 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(data[10], 1.0);
        // First included cube is (1, 1, 1): pixel center (1, 1) of a 6x6
        // extent, half a slice into the stack.
        assert_relative_eq!(data[12], -2.0 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(data[13], -2.0 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(data[14], -0.25);
        assert_relative_eq!(data[15], 1.0);

        assert_eq!(batches[0].color_data().len(), batches[0].len() * 4);
        assert_relative_eq!(instance.model[(2, 3)], -0.25);
    }

    #[test]
    fn extraction_is_deterministic() {
        let volume = volume(4, 4, 4, 1.0);
        let first = extract_voxel_instances(&volume, &params()).unwrap();
        let second = extract_voxel_instances(&volume, &params()).unwrap();
        assert_eq!(first, second);
    }
}
