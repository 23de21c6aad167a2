use ndarray::{Array2, Array3, s};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum VolumeError {
    #[error("no slices to build a volume from")]
    NoSlices,

    #[error("slice {slice} is {found:?} but the stack is {expected:?} (height x width)")]
    DimensionMismatch {
        slice: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("grid point ({x}, {y}, {z}) is outside the volume extents {dims:?}")]
    OutOfBounds {
        x: usize,
        y: usize,
        z: usize,
        dims: (usize, usize, usize),
    },
}

/// Grid offsets subtracted from a cube's far corner `(x, y, z)` to reach
/// its 8 corners: the four back (`z - 1`) corners counter-clockwise from
/// left-top, then the four front (`z`) corners in the same order.
const CUBE_CORNER_OFFSETS: [[usize; 3]; 8] = [
    [1, 0, 1], // left top back
    [1, 1, 1], // left down back
    [0, 1, 1], // right down back
    [0, 0, 1], // right top back
    [1, 0, 0], // left top front
    [1, 1, 0], // left down front
    [0, 1, 0], // right down front
    [0, 0, 0], // right top front
];

/// A discrete scalar field assembled from an ordered stack of sampled
/// slices.
///
/// Axes are ordered (depth, height, width): slice `z` of the input stack is
/// plane `z` of the array. Built once per reconstruction request and
/// read-only afterwards.
pub struct Volume {
    data: Array3<f32>,
}

impl Volume {
    /// Aggregate sampled slices into a volume, preserving stack order.
    ///
    /// # Errors
    ///
    /// Fails if the slice list is empty or any slice disagrees with the
    /// first on width or height.
    pub fn build(slices: &[Array2<f32>]) -> Result<Self, VolumeError> {
        let first = slices.first().ok_or(VolumeError::NoSlices)?;
        let expected = first.dim();
        for (index, slice) in slices.iter().enumerate() {
            if slice.dim() != expected {
                return Err(VolumeError::DimensionMismatch {
                    slice: index,
                    expected,
                    found: slice.dim(),
                });
            }
        }

        let (height, width) = expected;
        let mut data = Array3::<f32>::zeros((slices.len(), height, width));
        for (z, slice) in slices.iter().enumerate() {
            data.slice_mut(s![z, .., ..]).assign(slice);
        }

        Ok(Self { data })
    }

    /// Volume extents as (width, height, depth).
    pub fn dims(&self) -> (usize, usize, usize) {
        let (depth, height, width) = self.data.dim();
        (width, height, depth)
    }

    pub fn width(&self) -> usize {
        self.data.dim().2
    }

    pub fn height(&self) -> usize {
        self.data.dim().1
    }

    /// Number of slices in the stack.
    pub fn depth(&self) -> usize {
        self.data.dim().0
    }

    /// Sampled intensity at grid point (x, y, z).
    ///
    /// # Errors
    ///
    /// Fails if any coordinate is outside the grid extents.
    pub fn intensity_at(&self, x: usize, y: usize, z: usize) -> Result<f32, VolumeError> {
        self.data
            .get([z, y, x])
            .copied()
            .ok_or(VolumeError::OutOfBounds {
                x,
                y,
                z,
                dims: self.dims(),
            })
    }

    /// Whether every listed grid point is strictly above `threshold`.
    ///
    /// Short-circuits at the first point at or below the threshold. An
    /// empty list is vacuously true.
    pub fn all_above_threshold(
        &self,
        points: &[[usize; 3]],
        threshold: f32,
    ) -> Result<bool, VolumeError> {
        for &[x, y, z] in points {
            if self.intensity_at(x, y, z)? <= threshold {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Grid indices of the 8 corners of the unit cube whose far corner is
    /// (x, y, z).
    ///
    /// # Errors
    ///
    /// Fails unless `x`, `y` and `z` all lie in `[1, extent - 1]`; the
    /// extraction scans start at 1, so this is unreachable unless the scan
    /// bounds change.
    pub fn cube_corners(
        &self,
        x: usize,
        y: usize,
        z: usize,
    ) -> Result<[[usize; 3]; 8], VolumeError> {
        let (width, height, depth) = self.dims();
        if x == 0 || y == 0 || z == 0 || x >= width || y >= height || z >= depth {
            return Err(VolumeError::OutOfBounds {
                x,
                y,
                z,
                dims: (width, height, depth),
            });
        }
        Ok(CUBE_CORNER_OFFSETS.map(|[dx, dy, dz]| [x - dx, y - dy, z - dz]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(height: usize, width: usize, value: f32) -> Array2<f32> {
        Array2::from_elem((height, width), value)
    }

    #[test]
    fn build_rejects_an_empty_stack() {
        assert!(matches!(Volume::build(&[]), Err(VolumeError::NoSlices)));
    }

    #[test]
    fn build_rejects_mismatched_slices() {
        let result = Volume::build(&[grid(3, 3, 0.0), grid(3, 4, 0.0)]);
        assert!(matches!(
            result,
            Err(VolumeError::DimensionMismatch {
                slice: 1,
                expected: (3, 3),
                found: (3, 4),
            })
        ));
    }

    #[test]
    fn slices_are_retrievable_in_stack_order() {
        let volume = Volume::build(&[grid(2, 2, 0.25), grid(2, 2, 0.75)]).unwrap();
        assert_eq!(volume.intensity_at(1, 0, 0), Ok(0.25));
        assert_eq!(volume.intensity_at(1, 0, 1), Ok(0.75));
        assert_eq!(volume.dims(), (2, 2, 2));
    }

    #[test]
    fn intensity_lookup_is_bounds_checked() {
        let volume = Volume::build(&[grid(2, 3, 0.0)]).unwrap();
        assert!(volume.intensity_at(2, 1, 0).is_ok());
        assert!(matches!(
            volume.intensity_at(3, 0, 0),
            Err(VolumeError::OutOfBounds { .. })
        ));
        assert!(matches!(
            volume.intensity_at(0, 0, 1),
            Err(VolumeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn empty_point_list_is_vacuously_above_threshold() {
        let volume = Volume::build(&[grid(2, 2, 0.0)]).unwrap();
        assert_eq!(volume.all_above_threshold(&[], f32::MAX), Ok(true));
    }

    #[test]
    fn threshold_test_is_strict() {
        let volume = Volume::build(&[grid(2, 2, 0.5)]).unwrap();
        assert_eq!(volume.all_above_threshold(&[[0, 0, 0]], 0.5), Ok(false));
        assert_eq!(volume.all_above_threshold(&[[0, 0, 0]], 0.49), Ok(true));
    }

    #[test]
    fn cube_corners_cover_the_unit_cube() {
        let volume = Volume::build(&[grid(2, 2, 0.0), grid(2, 2, 0.0)]).unwrap();
        let corners = volume.cube_corners(1, 1, 1).unwrap();
        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    assert!(corners.contains(&[x, y, z]));
                }
            }
        }
    }

    #[test]
    fn cube_corners_reject_the_boundary() {
        let volume = Volume::build(&[grid(3, 3, 0.0), grid(3, 3, 0.0)]).unwrap();
        assert!(volume.cube_corners(0, 1, 1).is_err());
        assert!(volume.cube_corners(1, 3, 1).is_err());
        assert!(volume.cube_corners(1, 1, 2).is_err());
    }
}
