//! Multi-frame clear tests

use glint_harness::{CompareSettings, PresentMode, TestSuite};
use glint_wgpu::WgpuSurface;

/// Colour of a frame, cycling through the channels
fn frame_color(frame: u32) -> wgpu::Color {
    let t = f64::from(frame % 30) / 29.0;
    match (frame / 30) % 3 {
        0 => wgpu::Color { r: t, g: 0.0, b: 1.0 - t, a: 1.0 },
        1 => wgpu::Color { r: 1.0 - t, g: t, b: 0.0, a: 1.0 },
        _ => wgpu::Color { r: 0.0, g: 1.0 - t, b: t, a: 1.0 },
    }
}

/// Create the clear test suite
pub fn suite() -> TestSuite<WgpuSurface> {
    let mut suite: TestSuite<WgpuSurface> = TestSuite::new("clear");

    suite
        .add("clear_cycle", |ctx| {
            ctx.surface.clear(frame_color(ctx.frame));
            Ok(())
        })
        .iterations(90)
        .window(128, 128)
        .compare(CompareSettings::default());

    suite
        .add("clear_auto_present", |ctx| {
            ctx.surface.clear(frame_color(ctx.frame * 7));
            Ok(())
        })
        .iterations(10)
        .window(128, 128)
        .swap(PresentMode::Auto)
        .compare(CompareSettings::default().with_max_divergence(0.0));

    suite
}
