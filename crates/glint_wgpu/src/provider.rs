use glint_harness::{EffectiveConfiguration, SurfaceError, SurfaceProvider};

use crate::surface::WgpuSurface;

/// Profile names understood by [`WgpuProvider`]
pub const PROFILES: &[&str] = &["primary", "vulkan", "metal", "dx12", "gl", "all"];

/// Map a surface profile to the backends wgpu may pick from
pub fn backends_for_profile(profile: &str) -> Result<wgpu::Backends, SurfaceError> {
    let backends = match profile.to_ascii_lowercase().as_str() {
        "primary" => wgpu::Backends::PRIMARY,
        "vulkan" => wgpu::Backends::VULKAN,
        "metal" => wgpu::Backends::METAL,
        "dx12" => wgpu::Backends::DX12,
        "gl" => wgpu::Backends::GL,
        "all" => wgpu::Backends::all(),
        _ => return Err(SurfaceError::UnsupportedProfile(profile.to_string())),
    };
    Ok(backends)
}

/// Creates a fresh headless device per test case
#[derive(Debug, Clone)]
pub struct WgpuProvider {
    power_preference: wgpu::PowerPreference,
    force_fallback_adapter: bool,
}

impl Default for WgpuProvider {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
        }
    }
}

impl WgpuProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept software adapters such as llvmpipe or WARP
    pub fn with_fallback_adapter(mut self, force: bool) -> Self {
        self.force_fallback_adapter = force;
        self
    }
}

impl SurfaceProvider for WgpuProvider {
    type Surface = WgpuSurface;

    fn acquire(
        &self,
        title: &str,
        config: &EffectiveConfiguration,
    ) -> Result<WgpuSurface, SurfaceError> {
        let backends = backends_for_profile(&config.surface_profile)?;
        if config.width == 0 || config.height == 0 {
            return Err(SurfaceError::InvalidSize {
                width: config.width,
                height: config.height,
            });
        }

        let options = wgpu::RequestAdapterOptions {
            power_preference: self.power_preference,
            compatible_surface: None,
            force_fallback_adapter: self.force_fallback_adapter,
        };
        pollster::block_on(WgpuSurface::new(title, backends, &options, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_profile_maps_to_backends() {
        for profile in PROFILES {
            assert!(backends_for_profile(profile).is_ok(), "{profile}");
        }
        assert_eq!(backends_for_profile("GL").unwrap(), wgpu::Backends::GL);
    }

    #[test]
    fn unknown_profile_is_unsupported() {
        let err = backends_for_profile("gl2").unwrap_err();
        assert!(matches!(err, SurfaceError::UnsupportedProfile(p) if p == "gl2"));
    }

    #[test]
    fn empty_window_is_rejected_before_device_creation() {
        let config = EffectiveConfiguration {
            surface_profile: "primary".to_string(),
            width: 0,
            height: 480,
            target_fps: 60,
            max_iterations: 1,
            present_mode: glint_harness::PresentMode::Manual,
            comparison: None,
        };
        let err = WgpuProvider::new().acquire("empty", &config).err().unwrap();
        assert!(matches!(err, SurfaceError::InvalidSize { width: 0, height: 480 }));
    }
}
