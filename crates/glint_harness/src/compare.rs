//! Image comparison
//!
//! Produces a per-channel difference image and a scalar divergence in
//! `[0, 1]` for two captured frames of identical dimensions.

use image::{ImageBuffer, Rgb, RgbImage};
use thiserror::Error;

/// Captured frames being compared have different sizes.
///
/// This points at a configuration or reference archive problem and is kept
/// apart from a threshold failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Frame is {actual:?} but reference is {expected:?}")]
pub struct DimensionMismatch {
    pub actual: (u32, u32),
    pub expected: (u32, u32),
}

/// Result of comparing two frames
#[derive(Debug, Clone)]
pub struct Comparison {
    /// Per-channel absolute difference
    pub diff: RgbImage,
    /// Mean per-pixel difference magnitude, 0.0 = identical
    pub divergence: f64,
}

impl Comparison {
    /// Divergence is within the inclusive bound
    pub fn passes(&self, max_divergence: f64) -> bool {
        self.divergence <= max_divergence
    }
}

/// Compare a captured frame against a reference frame.
///
/// The difference is an unsigned magnitude, so swapping the arguments
/// yields the same divergence.
pub fn compare(actual: &RgbImage, expected: &RgbImage) -> Result<Comparison, DimensionMismatch> {
    if actual.dimensions() != expected.dimensions() {
        return Err(DimensionMismatch {
            actual: actual.dimensions(),
            expected: expected.dimensions(),
        });
    }

    let (width, height) = actual.dimensions();
    let mut diff: RgbImage = ImageBuffer::new(width, height);
    let mut channel_sum: u64 = 0;

    for ((out, a), e) in diff.pixels_mut().zip(actual.pixels()).zip(expected.pixels()) {
        let r = a[0].abs_diff(e[0]);
        let g = a[1].abs_diff(e[1]);
        let b = a[2].abs_diff(e[2]);
        channel_sum += u64::from(r) + u64::from(g) + u64::from(b);
        *out = Rgb([r, g, b]);
    }

    // One division keeps equal inputs at exactly 0.0 and boundary values exact.
    let total = u64::from(width) * u64::from(height) * 3 * 255;
    let divergence = if total == 0 {
        0.0
    } else {
        channel_sum as f64 / total as f64
    };

    Ok(Comparison { diff, divergence })
}
