use nalgebra::Point3;
use rayon::prelude::*;

use crate::geometry::{Square, Triangle, triangles_from_squares};
use crate::mapper::{RenderSpaceMapper, Z_OFFSET_DENSE};
use crate::params::ProcessParams;
use crate::volume::{Volume, VolumeError};

/// Corner indices of the six cube faces, wound counter-clockwise seen from
/// outside the cube: front, back, left, right, top, bottom.
const CUBE_FACES: [[usize; 4]; 6] = [
    [4, 5, 6, 7], // front
    [3, 2, 1, 0], // back
    [0, 1, 5, 4], // left
    [7, 6, 2, 3], // right
    [0, 4, 7, 3], // top
    [5, 1, 2, 6], // bottom
];

/// Extract an opaque triangle mesh containing every cube whose 8 corners
/// are all above the intensity threshold.
///
/// Cubes are scanned z-major, then y, then x, from index 1 along each axis;
/// each included cube emits all 6 faces as 12 triangles, so faces between
/// adjacent included cubes are emitted redundantly. Slabs of constant z run
/// in parallel and are reassembled in scan order, making the output
/// deterministic for a given volume and parameters.
///
/// # Errors
///
/// Propagates [`VolumeError::OutOfBounds`] if a cube corner falls outside
/// the volume; unreachable for the current scan bounds.
pub fn extract_dense_mesh(
    volume: &Volume,
    params: &ProcessParams,
) -> Result<Vec<Triangle>, VolumeError> {
    let mapper = RenderSpaceMapper::new(volume, params, Z_OFFSET_DENSE);
    let threshold = params.pixel_intensity_threshold;
    let (width, height, depth) = volume.dims();

    let slabs = (1..depth)
        .into_par_iter()
        .map(|z| {
            let mut triangles = Vec::new();
            for y in 1..height {
                for x in 1..width {
                    let corners = volume.cube_corners(x, y, z)?;
                    if !volume.all_above_threshold(&corners, threshold)? {
                        continue;
                    }
                    let mapped = corners.map(|[cx, cy, cz]| mapper.corner(cx, cy, cz));
                    triangles.extend(triangles_from_squares(&cube_faces(&mapped)));
                }
            }
            Ok(triangles)
        })
        .collect::<Result<Vec<_>, VolumeError>>()?;

    Ok(slabs.into_iter().flatten().collect())
}

/// The six faces of a cube given its 8 mapped corners.
fn cube_faces(corners: &[Point3<f32>; 8]) -> [Square; 6] {
    CUBE_FACES.map(|[a, b, c, d]| Square {
        a: corners[a],
        b: corners[b],
        c: corners[c],
        d: corners[d],
    })
}
