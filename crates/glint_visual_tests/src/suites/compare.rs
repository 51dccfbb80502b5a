//! Reference comparison tests
//!
//! `triangle` owns the reference archive; the other cases verify against it.

use glint_harness::{
    CompareSettings, FailureKind, FrameContext, PresentMode, SettingsLayer, TestSuite,
};
use glint_wgpu::WgpuSurface;

use crate::draw::{self, TriangleRenderer};

const TRIANGLE: [[f32; 3]; 3] = [[-0.5, -0.5, 0.0], [0.0, 0.707, 0.0], [0.5, -0.5, 0.0]];

/// Same triangle with a lower apex
const DIFFERENT_TRIANGLE: [[f32; 3]; 3] = [[-0.5, -0.5, 0.0], [0.0, 0.6, 0.0], [0.5, -0.5, 0.0]];

/// Create the compare test suite
pub fn suite() -> TestSuite<WgpuSurface> {
    let mut suite = TestSuite::new("compare");
    suite.with_settings(SettingsLayer::new().with_iterations(1));

    suite
        .add("triangle", triangle_body(TRIANGLE))
        .compare(CompareSettings::default());

    suite
        .add("different_triangle", triangle_body(DIFFERENT_TRIANGLE))
        .compare(CompareSettings::reference("triangle"))
        .expect_failure(FailureKind::Threshold);

    // Immediate submission must produce the same image
    suite
        .add("triangle_auto_present", triangle_body(TRIANGLE))
        .swap(PresentMode::Auto)
        .compare(CompareSettings::reference("triangle"));

    suite
}

fn triangle_body(
    positions: [[f32; 3]; 3],
) -> impl FnMut(&mut FrameContext<'_, WgpuSurface>) -> anyhow::Result<()> + Send + 'static {
    let vertices = draw::triangle(positions);
    let mut renderer: Option<TriangleRenderer> = None;

    move |ctx| {
        let renderer =
            renderer.get_or_insert_with(|| TriangleRenderer::new(ctx.surface, &vertices));
        renderer.draw(ctx.surface, wgpu::Color::BLACK);
        Ok(())
    }
}
