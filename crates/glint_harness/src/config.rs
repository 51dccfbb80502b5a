//! Configuration resolution
//!
//! Every test case runs with one [`EffectiveConfiguration`] produced by
//! [`resolve`]. Settings arrive in layers:
//!
//! 1. [`Defaults`] (harness-wide, optionally from `glint.toml`)
//! 2. the suite's [`SettingsLayer`]
//! 3. the test case's [`SettingsLayer`]
//!
//! Within a layer the wholesale [`Configuration`] record is applied first and
//! the single-field overrides (`profile`, `window`, `fps`, `iterations`,
//! `swap`) after it. Later writers win per field, never per layer.
//!
//! Harness-wide paths and the archive mode live in [`HarnessConfig`];
//! [`ConfigFile`] reads both from TOML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default upper bound on per-frame divergence
pub const DEFAULT_MAX_DIVERGENCE: f64 = 0.01;

/// Environment variable that switches the harness into record mode
pub const UPDATE_REFERENCES_ENV: &str = "GLINT_UPDATE_REFERENCES";

/// Buffer presentation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentMode {
    /// Presentation is implicit; capture reads whatever the surface holds
    /// and may not reflect the frame just drawn.
    Auto,
    /// The orchestrator presents after every frame, before capture
    #[default]
    Manual,
}

/// Surface dimensions override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

/// Wholesale settings record.
///
/// Applying it overwrites all five fields. Fields left out when building or
/// deserializing one keep their record defaults, not the value of an
/// earlier layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Configuration {
    pub profile: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub iterations: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            profile: "primary".to_string(),
            width: 640,
            height: 480,
            fps: 60,
            iterations: 120,
        }
    }
}

impl Configuration {
    /// Set the profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the surface size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the target frame rate (0 = unthrottled).
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the frame budget.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }
}

/// Comparison declaration as written on a suite or test
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompareSettings {
    /// Reference archive name; the test's own name when absent or empty
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default = "default_max_divergence")]
    pub max_divergence: f64,
}

fn default_max_divergence() -> f64 {
    DEFAULT_MAX_DIVERGENCE
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            reference: None,
            max_divergence: DEFAULT_MAX_DIVERGENCE,
        }
    }
}

impl CompareSettings {
    /// Compare against the archive recorded under `reference`.
    pub fn reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    pub fn with_max_divergence(mut self, max_divergence: f64) -> Self {
        self.max_divergence = max_divergence;
        self
    }

    fn to_comparison(&self, test_name: &str) -> ComparisonSpec {
        let reference_name = match self.reference.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => test_name.to_string(),
        };
        // Divergence is a fraction in [0, 1]
        let max_divergence = if self.max_divergence.is_nan() {
            tracing::warn!("max_divergence is NaN, using {}", DEFAULT_MAX_DIVERGENCE);
            DEFAULT_MAX_DIVERGENCE
        } else {
            self.max_divergence.clamp(0.0, 1.0)
        };
        ComparisonSpec {
            reference_name,
            max_divergence,
        }
    }
}

/// One layer of settings (suite-level or test-level)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SettingsLayer {
    pub configuration: Option<Configuration>,
    pub profile: Option<String>,
    pub window: Option<WindowSize>,
    pub fps: Option<u32>,
    pub iterations: Option<u32>,
    pub swap: Option<PresentMode>,
    pub compare: Option<CompareSettings>,
}

impl SettingsLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_window(mut self, width: u32, height: u32) -> Self {
        self.window = Some(WindowSize { width, height });
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }

    pub fn with_swap(mut self, swap: PresentMode) -> Self {
        self.swap = Some(swap);
        self
    }

    pub fn with_compare(mut self, compare: CompareSettings) -> Self {
        self.compare = Some(compare);
        self
    }
}

/// Harness-wide defaults, the bottom layer of resolution
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Defaults {
    pub profile: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub iterations: u32,
    pub swap: PresentMode,
}

impl Default for Defaults {
    fn default() -> Self {
        let record = Configuration::default();
        Self {
            profile: record.profile,
            width: record.width,
            height: record.height,
            fps: record.fps,
            iterations: record.iterations,
            swap: PresentMode::default(),
        }
    }
}

/// Resolved comparison settings
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSpec {
    pub reference_name: String,
    /// Inclusive upper bound on per-frame divergence
    pub max_divergence: f64,
}

/// Settings one test case runs with
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfiguration {
    pub surface_profile: String,
    pub width: u32,
    pub height: u32,
    /// 0 runs unthrottled
    pub target_fps: u32,
    pub max_iterations: u32,
    pub present_mode: PresentMode,
    /// No capture or comparison happens when absent
    pub comparison: Option<ComparisonSpec>,
}

impl EffectiveConfiguration {
    fn from_defaults(defaults: &Defaults) -> Self {
        Self {
            surface_profile: defaults.profile.clone(),
            width: defaults.width,
            height: defaults.height,
            target_fps: defaults.fps,
            max_iterations: defaults.iterations,
            present_mode: defaults.swap,
            comparison: None,
        }
    }

    fn apply(&mut self, layer: &SettingsLayer) {
        if let Some(record) = &layer.configuration {
            self.surface_profile = record.profile.clone();
            self.width = record.width;
            self.height = record.height;
            self.target_fps = record.fps;
            self.max_iterations = record.iterations;
        }
        if let Some(profile) = &layer.profile {
            self.surface_profile = profile.clone();
        }
        if let Some(window) = layer.window {
            self.width = window.width;
            self.height = window.height;
        }
        if let Some(fps) = layer.fps {
            self.target_fps = fps;
        }
        if let Some(iterations) = layer.iterations {
            self.max_iterations = iterations;
        }
        if let Some(swap) = layer.swap {
            self.present_mode = swap;
        }
    }
}

/// Merge the three layers into the configuration for `test_name`.
///
/// Never fails: a layer with nothing set contributes nothing. The test-level
/// comparison declaration wins over the suite-level one as a whole.
pub fn resolve(
    defaults: &Defaults,
    suite: &SettingsLayer,
    test: &SettingsLayer,
    test_name: &str,
) -> EffectiveConfiguration {
    let mut effective = EffectiveConfiguration::from_defaults(defaults);
    effective.apply(suite);
    effective.apply(test);
    effective.comparison = test
        .compare
        .as_ref()
        .or(suite.compare.as_ref())
        .map(|compare| compare.to_comparison(test_name));
    effective
}

/// What happens to captured frames of tests with a comparison declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveMode {
    /// Compare against existing reference archives
    #[default]
    Verify,
    /// Write captured frames as the new reference archives
    Record,
}

/// Harness-wide locations and archive mode
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Reference archives, `<reference>.zip`
    pub reference_dir: PathBuf,
    /// Frames captured during verification, `<test>.zip`
    pub output_dir: PathBuf,
    /// Diff images of failed comparisons
    pub diagnostics_dir: PathBuf,
    pub mode: ArchiveMode,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            reference_dir: PathBuf::from("tests/references"),
            output_dir: PathBuf::from("target/recorded-frames"),
            diagnostics_dir: PathBuf::from("target/frame-diffs"),
            mode: ArchiveMode::Verify,
        }
    }
}

impl HarnessConfig {
    /// Apply `GLINT_UPDATE_REFERENCES` on top of this configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var(UPDATE_REFERENCES_ENV) {
            if !matches!(value.as_str(), "" | "0" | "false") {
                self.mode = ArchiveMode::Record;
            }
        }
        self
    }

    pub fn with_reference_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reference_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_diagnostics_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diagnostics_dir = dir.into();
        self
    }

    pub fn with_mode(mut self, mode: ArchiveMode) -> Self {
        self.mode = mode;
        self
    }

    /// Reference archive path for a reference name
    pub fn reference_path(&self, reference: &str) -> PathBuf {
        self.reference_dir.join(format!("{}.zip", reference))
    }

    /// Recording archive path for a test
    pub fn output_path(&self, test_name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.zip", test_name))
    }

    /// Diff artifact path for one failed entry
    pub fn diff_path(&self, test_name: &str, entry_name: &str) -> PathBuf {
        self.diagnostics_dir
            .join(format!("diff_{}_{}", test_name, entry_name))
    }
}

/// Errors reading `glint.toml`
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Contents of `glint.toml`
///
/// ```toml
/// [harness]
/// reference_dir = "tests/references"
/// mode = "verify"
///
/// [defaults]
/// profile = "primary"
/// fps = 0
/// swap = "manual"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigFile {
    pub harness: HarnessConfig,
    pub defaults: Defaults,
}

impl ConfigFile {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
