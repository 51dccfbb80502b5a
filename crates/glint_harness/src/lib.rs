//! Glint Visual Regression Harness
//!
//! Drives a rendering surface through a fixed frame budget, invokes test
//! draw logic every frame and optionally compares each rendered frame
//! against a stored reference archive.
//!
//! # Pieces
//!
//! - **Configuration**: defaults, suite-level and test-level settings merged
//!   field by field into one [`EffectiveConfiguration`]
//! - **Lifecycle**: the [`Orchestrator`] owns one surface per test case and
//!   runs hooks, frames, capture and comparison on a dedicated thread
//! - **Capture & comparison**: pixel readback normalized to a top-left RGB
//!   image, mean divergence scoring, diff artifacts and zip/PNG archives
//!
//! The graphics binding is supplied through [`SurfaceProvider`]. A CPU
//! [`software::SoftwareProvider`] is included for headless runs and tests.

pub mod archive;
pub mod capture;
pub mod compare;
pub mod config;
pub mod error;
pub mod host;
pub mod orchestrator;
pub mod outcome;
pub mod runner;
pub mod software;
pub mod surface;

pub use config::{
    ArchiveMode, CompareSettings, ComparisonSpec, Configuration, Defaults, EffectiveConfiguration,
    HarnessConfig, PresentMode, SettingsLayer, WindowSize,
};
pub use error::{CaptureError, SurfaceError};
pub use host::{ConsoleHost, Host, TestInfo};
pub use orchestrator::{FrameContext, Orchestrator};
pub use outcome::{Failure, FailureKind, Outcome};
pub use runner::{RunResult, TestCase, TestRun, TestRunner, TestSuite};
pub use surface::{Origin, PixelFormat, Readback, Surface, SurfaceProvider};
