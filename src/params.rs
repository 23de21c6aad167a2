use thiserror::Error;

/// Length of the normalized RGB vector (1, 1, 1); the largest intensity a
/// sampled cell can hold.
pub const MAX_INTENSITY: f32 = 1.732_050_8;

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("sample rate must be at least 1")]
    ZeroSampleRate,

    #[error("intensity threshold {0} is outside [0, sqrt(3)]")]
    ThresholdOutOfRange(f32),
}

/// Reconstruction parameters, supplied per request and never mutated by the
/// core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessParams {
    /// How many pixels to skip when sampling an image. 1 means use every
    /// pixel, 4 means use every fourth.
    pub sample_rate: u32,

    /// The minimum length a sample's normalized RGB vector must exceed for
    /// the point to be considered inside the reconstructed object.
    pub pixel_intensity_threshold: f32,
}

impl Default for ProcessParams {
    fn default() -> Self {
        Self {
            sample_rate: 8,
            pixel_intensity_threshold: 0.85,
        }
    }
}

impl ProcessParams {
    /// Check the parameters before any sampling begins.
    ///
    /// # Errors
    ///
    /// Rejects a zero sample rate and thresholds outside `[0, sqrt(3)]`
    /// (including non-finite values).
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.sample_rate == 0 {
            return Err(ParamsError::ZeroSampleRate);
        }
        let threshold = self.pixel_intensity_threshold;
        if !threshold.is_finite() || !(0.0..=MAX_INTENSITY).contains(&threshold) {
            return Err(ParamsError::ThresholdOutOfRange(threshold));
        }
        Ok(())
    }
}
