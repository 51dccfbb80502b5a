//! Glint Visual Test Suites
//!
//! GPU-backed suites run by the `glint-visual-tests` binary against
//! [`glint_wgpu::WgpuSurface`]s.
//!
//! # Test Categories
//!
//! - **lifecycle**: hook and frame ordering
//! - **configuration**: suite records and test-level overrides
//! - **profiles**: backend selection through surface profiles
//! - **compare**: triangles checked against reference archives
//! - **clear**: multi-frame archives and present modes

pub mod draw;
pub mod suites;

pub use suites::all_suites;
