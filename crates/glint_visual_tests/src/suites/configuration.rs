//! Suite-level records and test-level overrides

use glint_harness::{Configuration, SettingsLayer, Surface, TestSuite};
use glint_wgpu::WgpuSurface;

/// Create the configuration test suite
pub fn suite() -> TestSuite<WgpuSurface> {
    let mut suite: TestSuite<WgpuSurface> = TestSuite::new("configuration");
    suite.with_settings(
        SettingsLayer::new().with_configuration(Configuration::default().with_iterations(1)),
    );

    // Fields the record leaves out take their defaults
    suite.add("suite_record", |ctx| {
        anyhow::ensure!(ctx.config.max_iterations == 1);
        anyhow::ensure!(ctx.surface.size() == (640, 480), "size {:?}", ctx.surface.size());
        anyhow::ensure!(ctx.config.target_fps == 60);
        Ok(())
    });

    suite
        .add("window_override", |ctx| {
            anyhow::ensure!(ctx.config.max_iterations == 1);
            anyhow::ensure!(ctx.surface.size() == (320, 240), "size {:?}", ctx.surface.size());
            Ok(())
        })
        .window(320, 240);

    suite
        .add("iterations_override", |ctx| {
            anyhow::ensure!(ctx.config.max_iterations == 3);
            anyhow::ensure!(ctx.frame <= 3);
            Ok(())
        })
        .iterations(3)
        .fps(0);

    suite
}
