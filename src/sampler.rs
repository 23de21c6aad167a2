use crate::params::ProcessParams;

use image::DynamicImage;
use ndarray::Array2;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("image has zero width or height")]
    EmptyImage,

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub struct SliceSampler;

impl SliceSampler {
    /// Sample a decoded image into a scalar grid of
    /// `(height / sample_rate) x (width / sample_rate)` cells.
    ///
    /// Cell `(x, y)` holds the intensity of the single source pixel at
    /// `(x * sample_rate, y * sample_rate)`; skipped pixels are not
    /// averaged. Grayscale and RGBA inputs are converted to RGB first.
    ///
    /// # Errors
    ///
    /// Fails if the image has a zero dimension.
    pub fn sample_image(
        image: &DynamicImage,
        params: &ProcessParams,
    ) -> Result<Array2<f32>, SamplerError> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(SamplerError::EmptyImage);
        }

        let rate = params.sample_rate;
        let cells_x = (width / rate) as usize;
        let cells_y = (height / rate) as usize;

        Ok(Array2::from_shape_fn((cells_y, cells_x), |(y, x)| {
            let pixel = rgb.get_pixel(x as u32 * rate, y as u32 * rate);
            rgb_intensity(pixel.0)
        }))
    }

    /// Decode the image at `path` and sample it.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or decoded, or has a zero
    /// dimension.
    pub fn sample_file(
        path: impl AsRef<Path>,
        params: &ProcessParams,
    ) -> Result<Array2<f32>, SamplerError> {
        let image = image::open(path.as_ref())?;
        Self::sample_image(&image, params)
    }
}

/// Euclidean length of the normalized RGB triple, in `[0, sqrt(3)]`.
fn rgb_intensity([r, g, b]: [u8; 3]) -> f32 {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;
    (r * r + g * g + b * b).sqrt()
}
