//! CPU-rasterized surface
//!
//! A double-buffered RGBA target stored bottom-row-first, the way an OpenGL
//! back buffer reads back. Drawing uses top-left coordinates. Useful for
//! headless runs without an adapter and for exercising the harness itself.

use crate::config::{EffectiveConfiguration, PresentMode};
use crate::error::SurfaceError;
use crate::surface::{Origin, PixelFormat, Readback, Surface, SurfaceProvider};

/// Software rendering surface
pub struct SoftwareSurface {
    profile: String,
    width: u32,
    height: u32,
    present_mode: PresentMode,
    back: Vec<u8>,
    front: Vec<u8>,
    presents: u64,
}

impl SoftwareSurface {
    pub fn new(profile: &str, width: u32, height: u32, present_mode: PresentMode) -> Self {
        let len = width as usize * height as usize * 4;
        Self {
            profile: profile.to_string(),
            width,
            height,
            present_mode,
            back: vec![0; len],
            front: vec![0; len],
            presents: 0,
        }
    }

    /// Number of explicit presents so far
    pub fn presents(&self) -> u64 {
        self.presents
    }

    /// Fill the whole back buffer
    pub fn clear(&mut self, color: [u8; 4]) {
        for px in self.back.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    /// Fill a rectangle given in top-left coordinates, clipped to the surface
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: [u8; 4]) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for row in y.min(self.height)..y_end {
            // Stored bottom row first
            let stored_row = (self.height - 1 - row) as usize;
            for col in x.min(self.width)..x_end {
                let i = (stored_row * self.width as usize + col as usize) * 4;
                self.back[i..i + 4].copy_from_slice(&color);
            }
        }
    }

    /// Set one pixel given in top-left coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        self.fill_rect(x, y, 1, 1, color);
    }
}

impl Surface for SoftwareSurface {
    fn profile(&self) -> &str {
        &self.profile
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        self.front.copy_from_slice(&self.back);
        self.presents += 1;
        Ok(())
    }

    /// In manual mode only presented content is visible; in auto mode every
    /// draw call is implicitly presented, so the back buffer is read.
    fn read_color_buffer(&mut self) -> Result<Readback, SurfaceError> {
        let data = match self.present_mode {
            PresentMode::Manual => self.front.clone(),
            PresentMode::Auto => self.back.clone(),
        };
        Ok(Readback {
            width: self.width,
            height: self.height,
            bytes_per_row: self.width as usize * 4,
            origin: Origin::BottomLeft,
            format: PixelFormat::Rgba8,
            data,
        })
    }
}

/// Creates [`SoftwareSurface`]s
#[derive(Debug, Clone, Default)]
pub struct SoftwareProvider {
    /// Accepted profiles; `None` accepts any
    profiles: Option<Vec<String>>,
}

impl SoftwareProvider {
    /// Provider accepting every profile
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider accepting only the listed profiles
    pub fn with_profiles<I, P>(profiles: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            profiles: Some(profiles.into_iter().map(Into::into).collect()),
        }
    }
}

impl SurfaceProvider for SoftwareProvider {
    type Surface = SoftwareSurface;

    fn acquire(
        &self,
        title: &str,
        config: &EffectiveConfiguration,
    ) -> Result<SoftwareSurface, SurfaceError> {
        if let Some(profiles) = &self.profiles {
            if !profiles.iter().any(|p| *p == config.surface_profile) {
                return Err(SurfaceError::UnsupportedProfile(config.surface_profile.clone()));
            }
        }
        if config.width == 0 || config.height == 0 {
            return Err(SurfaceError::InvalidSize {
                width: config.width,
                height: config.height,
            });
        }

        tracing::debug!(
            "Created software surface '{}' {}x{} ({})",
            title,
            config.width,
            config.height,
            config.surface_profile
        );
        Ok(SoftwareSurface::new(
            &config.surface_profile,
            config.width,
            config.height,
            config.present_mode,
        ))
    }
}
