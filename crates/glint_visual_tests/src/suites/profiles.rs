//! Backend selection through surface profiles

use glint_harness::{FailureKind, SettingsLayer, Surface, TestSuite};
use glint_wgpu::WgpuSurface;

/// Create the profiles test suite
pub fn suite() -> TestSuite<WgpuSurface> {
    let mut suite: TestSuite<WgpuSurface> = TestSuite::new("profiles");
    suite.with_settings(SettingsLayer::new().with_iterations(1));

    suite
        .add("primary", |ctx| {
            let backend = ctx.surface.backend();
            anyhow::ensure!(
                matches!(
                    backend,
                    wgpu::Backend::Vulkan
                        | wgpu::Backend::Metal
                        | wgpu::Backend::Dx12
                        | wgpu::Backend::BrowserWebGpu
                ),
                "primary profile picked {:?}",
                backend
            );
            Ok(())
        })
        .profile("primary");

    suite
        .add("gl", |ctx| {
            anyhow::ensure!(ctx.surface.profile() == "gl");
            anyhow::ensure!(
                ctx.surface.backend() == wgpu::Backend::Gl,
                "gl profile picked {:?}",
                ctx.surface.backend()
            );
            Ok(())
        })
        .profile("gl");

    // No provider offers it; the surface is never created
    suite
        .add("unknown", |_| anyhow::bail!("body must not run"))
        .profile("gl4")
        .expect_failure(FailureKind::Setup);

    suite
}
