//! Surface and capture error types

use thiserror::Error;

/// Errors raised by a rendering surface or its provider
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// The requested profile is not offered by this provider
    #[error("Unsupported surface profile: {0}")]
    UnsupportedProfile(String),

    /// Zero-sized surfaces cannot be created
    #[error("Invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    /// No adapter matched the requested profile
    #[error("No adapter available for profile {0}")]
    AdapterNotFound(String),

    /// Device or context creation failed
    #[error("Failed to create device: {0}")]
    Device(String),

    /// Buffer presentation failed
    #[error("Failed to present surface: {0}")]
    Present(String),

    /// Color buffer readback failed
    #[error("Failed to read color buffer: {0}")]
    Readback(String),
}

/// Errors raised while turning a readback into a captured frame
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// Row stride smaller than one row of pixels
    #[error("Row stride {bytes_per_row} is smaller than {width} pixels")]
    InvalidStride { bytes_per_row: usize, width: u32 },

    /// Readback shorter than the reported dimensions require
    #[error("Readback holds {actual} bytes, {expected} required")]
    ShortBuffer { expected: usize, actual: usize },
}
