//! Visual test cases organized by category

pub mod clear;
pub mod compare;
pub mod configuration;
pub mod lifecycle;
pub mod profiles;

use glint_harness::TestSuite;
use glint_wgpu::WgpuSurface;

/// Create all test suites
pub fn all_suites() -> Vec<TestSuite<WgpuSurface>> {
    vec![
        lifecycle::suite(),
        configuration::suite(),
        profiles::suite(),
        compare::suite(),
        clear::suite(),
    ]
}
