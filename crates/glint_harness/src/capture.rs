//! Frame capture
//!
//! Reads a surface's color buffer and normalizes it to the one layout every
//! consumer shares: top-left origin, tightly packed RGB.

use image::{ImageBuffer, RgbImage};

use crate::error::CaptureError;
use crate::surface::{Origin, PixelFormat, Readback, Surface};

/// Capture the surface's current color buffer.
///
/// Blocks until pending rendering on the surface has completed.
pub fn capture_frame<S: Surface + ?Sized>(surface: &mut S) -> Result<RgbImage, CaptureError> {
    let readback = surface.read_color_buffer()?;
    normalize(&readback)
}

/// Convert a raw readback into a top-left-origin RGB image.
///
/// Strips row padding, flips bottom-left sources and reorders BGRA.
pub fn normalize(readback: &Readback) -> Result<RgbImage, CaptureError> {
    let width = readback.width as usize;
    let height = readback.height as usize;
    let row_bytes = width * 4;

    if readback.bytes_per_row < row_bytes {
        return Err(CaptureError::InvalidStride {
            bytes_per_row: readback.bytes_per_row,
            width: readback.width,
        });
    }

    // The last row does not need trailing padding
    let expected = match height {
        0 => 0,
        h => readback.bytes_per_row * (h - 1) + row_bytes,
    };
    if readback.data.len() < expected {
        return Err(CaptureError::ShortBuffer {
            expected,
            actual: readback.data.len(),
        });
    }

    let (r, b) = match readback.format {
        PixelFormat::Rgba8 => (0, 2),
        PixelFormat::Bgra8 => (2, 0),
    };

    let mut img: RgbImage = ImageBuffer::new(readback.width, readback.height);
    for y in 0..height {
        let source_row = match readback.origin {
            Origin::TopLeft => y,
            Origin::BottomLeft => height - 1 - y,
        };
        let row_start = source_row * readback.bytes_per_row;
        let row_data = &readback.data[row_start..row_start + row_bytes];

        for (x, px) in row_data.chunks_exact(4).enumerate() {
            img.put_pixel(x as u32, y as u32, image::Rgb([px[r], px[1], px[b]]));
        }
    }

    Ok(img)
}
