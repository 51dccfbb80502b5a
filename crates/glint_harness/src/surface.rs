//! Rendering surface capability
//!
//! The harness never talks to a graphics API directly. A [`SurfaceProvider`]
//! creates one [`Surface`] per test case on the frame thread, and the surface
//! is released by dropping it.

use crate::config::EffectiveConfiguration;
use crate::error::SurfaceError;

/// Row order of a color buffer readback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// First row in memory is the bottom row (OpenGL readback convention)
    BottomLeft,
    /// First row in memory is the top row
    TopLeft,
}

/// Channel layout of a color buffer readback (4 bytes per pixel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
    Bgra8,
}

/// Raw color buffer contents as read from a surface
#[derive(Debug, Clone)]
pub struct Readback {
    pub width: u32,
    pub height: u32,
    /// Stride between rows, may include backend padding
    pub bytes_per_row: usize,
    pub origin: Origin,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

/// An active rendering target owned by exactly one test case
pub trait Surface {
    /// Profile this surface was created for
    fn profile(&self) -> &str;

    /// Current color buffer dimensions
    fn size(&self) -> (u32, u32);

    /// Make the frame drawn so far the presented frame
    fn present(&mut self) -> Result<(), SurfaceError>;

    /// Read the color buffer.
    ///
    /// Implementations must block until every submitted rendering command
    /// has completed, so a partial buffer is never returned.
    fn read_color_buffer(&mut self) -> Result<Readback, SurfaceError>;
}

/// Creates surfaces for test cases
///
/// `acquire` is called on the frame thread, so surfaces themselves do not
/// need to be `Send`.
pub trait SurfaceProvider: Sync {
    type Surface: Surface;

    /// Create a surface for `title` honoring profile, size and present mode
    fn acquire(
        &self,
        title: &str,
        config: &EffectiveConfiguration,
    ) -> Result<Self::Surface, SurfaceError>;
}
