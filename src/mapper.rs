use nalgebra::Point3;

use crate::params::ProcessParams;
use crate::volume::Volume;

/// z scale of the dense mesh path: grid index `iz` lands at
/// `iz * 2 / depth`, growing with the slice index.
pub(crate) const Z_OFFSET_DENSE: f32 = 1.0;

/// z scale of the translucent voxel path; voxel centers recede along -z as
/// the slice index grows.
pub(crate) const Z_OFFSET_VOXEL: f32 = 0.5;

/// Pure mapping from integer grid indices to normalized render-space
/// coordinates, fixed for one volume and one set of parameters.
///
/// x and y are scaled so the sampled pixel extent
/// (`grid extent * sample_rate`) spans `[-1, 1]`. The z convention differs
/// between the two extraction paths: dense corners use [`Self::corner`]
/// with [`Z_OFFSET_DENSE`], voxel centers use [`Self::cell_center`] with
/// [`Z_OFFSET_VOXEL`].
pub(crate) struct RenderSpaceMapper {
    sample_rate: f32,
    image_width: f32,
    image_height: f32,
    stack_depth: f32,
    z_offset: f32,
}

impl RenderSpaceMapper {
    pub(crate) fn new(volume: &Volume, params: &ProcessParams, z_offset: f32) -> Self {
        let (width, height, depth) = volume.dims();
        let rate = params.sample_rate as f32;
        Self {
            sample_rate: rate,
            image_width: width as f32 * rate,
            image_height: height as f32 * rate,
            stack_depth: depth as f32,
            z_offset,
        }
    }

    /// Render-space position of the grid point (ix, iy, iz).
    pub(crate) fn corner(&self, ix: usize, iy: usize, iz: usize) -> Point3<f32> {
        Point3::new(
            self.norm_x(ix as f32 * self.sample_rate),
            self.norm_y(iy as f32 * self.sample_rate),
            iz as f32 * self.z_offset * (2.0 / self.stack_depth),
        )
    }

    /// Render-space center of the cube whose far corner is (x, y, z): half
    /// a sample cell back along x and y, half a slice back along z.
    pub(crate) fn cell_center(&self, x: usize, y: usize, z: usize) -> Point3<f32> {
        let half = self.sample_rate / 2.0;
        Point3::new(
            self.norm_x(x as f32 * self.sample_rate - half),
            self.norm_y(y as f32 * self.sample_rate - half),
            -self.z_offset * (z as f32 - 0.5),
        )
    }

    #[inline]
    fn norm_x(&self, px: f32) -> f32 {
        px * (2.0 / self.image_width) - 1.0
    }

    #[inline]
    fn norm_y(&self, px: f32) -> f32 {
        px * (2.0 / self.image_height) - 1.0
    }
}
