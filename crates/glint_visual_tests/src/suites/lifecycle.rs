//! Hook and frame ordering tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use glint_harness::TestSuite;
use glint_wgpu::WgpuSurface;

/// Create the lifecycle test suite
pub fn suite() -> TestSuite<WgpuSurface> {
    let mut suite: TestSuite<WgpuSurface> = TestSuite::new("lifecycle");
    let frames = Arc::new(AtomicU32::new(0));

    let counter = frames.clone();
    suite.before(move |ctx| {
        tracing::info!("before {}", ctx.test_name);
        anyhow::ensure!(ctx.frame == 0, "hook saw frame {}", ctx.frame);
        counter.store(0, Ordering::SeqCst);
        Ok(())
    });

    let counter = frames.clone();
    suite.after(move |ctx| {
        tracing::info!("after {}", ctx.test_name);
        let ran = counter.load(Ordering::SeqCst);
        anyhow::ensure!(
            ran == ctx.config.max_iterations && ctx.frame == ran,
            "ran {} of {} frames",
            ran,
            ctx.config.max_iterations
        );
        Ok(())
    });

    let counter = frames.clone();
    suite
        .add("single_frame", move |ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            ctx.surface.clear(wgpu::Color::WHITE);
            Ok(())
        })
        .iterations(1);

    let counter = frames;
    suite
        .add("frame_budget", move |ctx| {
            let seen = counter.fetch_add(1, Ordering::SeqCst) + 1;
            anyhow::ensure!(seen == ctx.frame, "frame {} reported as {}", seen, ctx.frame);
            ctx.surface.clear(wgpu::Color::BLACK);
            Ok(())
        })
        .iterations(10)
        .fps(0);

    suite
}
