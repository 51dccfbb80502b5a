//! Test runner for executing test suites
//!
//! Suites group test cases under shared settings and hooks. The runner asks
//! a [`Host`] for suites, resolves each case's configuration, runs it through
//! the [`Orchestrator`] strictly one at a time and reports every outcome back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{self, CompareSettings, Defaults, HarnessConfig, PresentMode, SettingsLayer};
use crate::host::{Host, TestInfo};
use crate::orchestrator::{FrameContext, Orchestrator};
use crate::outcome::{FailureKind, Outcome};
use crate::surface::SurfaceProvider;

/// Per-frame test body
pub type BodyFn<S> = Box<dyn FnMut(&mut FrameContext<'_, S>) -> anyhow::Result<()> + Send>;

/// Before/after hook, shared between the cases of a suite
pub type HookFn<S> = Arc<dyn Fn(&mut FrameContext<'_, S>) -> anyhow::Result<()> + Send + Sync>;

/// A single test case
pub struct TestCase<S> {
    /// Test name
    pub name: String,
    /// Suite the case belongs to
    pub category: String,
    /// Test-level settings layer
    pub settings: SettingsLayer,
    /// Failure kind this test is expected to produce
    pub expected_failure: Option<FailureKind>,
    /// Report as ignored without running
    pub ignored: bool,
    pub(crate) before: Vec<HookFn<S>>,
    pub(crate) after: Vec<HookFn<S>>,
    pub(crate) body: BodyFn<S>,
}

impl<S> TestCase<S> {
    pub fn new<F>(name: &str, category: &str, body: F) -> Self
    where
        F: FnMut(&mut FrameContext<'_, S>) -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            settings: SettingsLayer::default(),
            expected_failure: None,
            ignored: false,
            before: Vec::new(),
            after: Vec::new(),
            body: Box::new(body),
        }
    }

    /// Replace the test-level settings
    pub fn with_settings(&mut self, settings: SettingsLayer) -> &mut Self {
        self.settings = settings;
        self
    }

    pub fn profile(&mut self, profile: &str) -> &mut Self {
        self.settings.profile = Some(profile.to_string());
        self
    }

    pub fn window(&mut self, width: u32, height: u32) -> &mut Self {
        self.settings.window = Some(config::WindowSize { width, height });
        self
    }

    pub fn fps(&mut self, fps: u32) -> &mut Self {
        self.settings.fps = Some(fps);
        self
    }

    pub fn iterations(&mut self, iterations: u32) -> &mut Self {
        self.settings.iterations = Some(iterations);
        self
    }

    pub fn swap(&mut self, swap: PresentMode) -> &mut Self {
        self.settings.swap = Some(swap);
        self
    }

    /// Compare every frame against a reference archive
    pub fn compare(&mut self, compare: CompareSettings) -> &mut Self {
        self.settings.compare = Some(compare);
        self
    }

    /// Invert the outcome: pass only if failures of `kind` are recorded
    pub fn expect_failure(&mut self, kind: FailureKind) -> &mut Self {
        self.expected_failure = Some(kind);
        self
    }

    pub fn ignore(&mut self) -> &mut Self {
        self.ignored = true;
        self
    }

    /// Hook run once after the surface is acquired
    pub fn before<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut FrameContext<'_, S>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(hook));
        self
    }

    /// Hook run once before the surface is released
    pub fn after<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut FrameContext<'_, S>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.after.push(Arc::new(hook));
        self
    }

    /// Suite befores run ahead of the case's own, suite afters behind them
    fn inherit_hooks(&mut self, before: &[HookFn<S>], after: &[HookFn<S>]) {
        self.before.splice(0..0, before.iter().cloned());
        self.after.extend(after.iter().cloned());
    }
}

/// Test suite containing multiple test cases
pub struct TestSuite<S> {
    /// Suite name
    pub name: String,
    /// Suite-level settings layer
    pub settings: SettingsLayer,
    /// Test cases
    pub cases: Vec<TestCase<S>>,
    before: Vec<HookFn<S>>,
    after: Vec<HookFn<S>>,
}

impl<S> TestSuite<S> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            settings: SettingsLayer::default(),
            cases: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Replace the suite-level settings
    pub fn with_settings(&mut self, settings: SettingsLayer) -> &mut Self {
        self.settings = settings;
        self
    }

    /// Add a test case, returning it for further configuration
    pub fn add<F>(&mut self, name: &str, body: F) -> &mut TestCase<S>
    where
        F: FnMut(&mut FrameContext<'_, S>) -> anyhow::Result<()> + Send + 'static,
    {
        self.cases.push(TestCase::new(name, &self.name, body));
        let last = self.cases.len() - 1;
        &mut self.cases[last]
    }

    /// Hook run before every case of the suite
    pub fn before<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut FrameContext<'_, S>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(hook));
        self
    }

    /// Hook run after every case of the suite
    pub fn after<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut FrameContext<'_, S>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.after.push(Arc::new(hook));
        self
    }

    /// Keep only cases whose name or suite name contains `pattern`
    pub fn retain_matching(&mut self, pattern: &str) {
        let suite_matches = self.name.contains(pattern);
        self.cases
            .retain(|case| suite_matches || case.name.contains(pattern));
    }
}

/// Result of running a test
#[derive(Debug)]
pub struct TestRun {
    /// Test name
    pub name: String,
    /// Test category
    pub category: String,
    /// Test outcome
    pub outcome: Outcome,
    /// Time taken
    pub duration: Duration,
}

impl TestRun {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

/// Runs suites supplied by a host, one test case at a time
pub struct TestRunner<P> {
    provider: P,
    harness: HarnessConfig,
    defaults: Defaults,
}

impl<P: SurfaceProvider> TestRunner<P> {
    /// Create a new test runner
    pub fn new(provider: P, harness: HarnessConfig) -> Self {
        Self {
            provider,
            harness,
            defaults: Defaults::default(),
        }
    }

    /// Replace the bottom configuration layer
    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Run every test case the host lists
    pub fn run<H: Host<P::Surface>>(&self, host: &mut H) -> RunResult {
        let start = Instant::now();
        let orchestrator = Orchestrator::new(&self.provider, &self.harness);
        let mut results = Vec::new();

        for suite in host.test_cases() {
            tracing::info!("Running suite: {}", suite.name);
            let TestSuite {
                name: suite_name,
                settings: suite_settings,
                cases,
                before,
                after,
            } = suite;

            for mut case in cases {
                let info = TestInfo {
                    suite: suite_name.clone(),
                    name: case.name.clone(),
                };
                host.started(&info);

                let test_start = Instant::now();
                let config =
                    config::resolve(&self.defaults, &suite_settings, &case.settings, &case.name);
                tracing::debug!("Resolved configuration for {}: {:?}", info, config);

                case.inherit_hooks(&before, &after);
                let outcome = orchestrator.run(case, &config);

                let duration = test_start.elapsed();
                host.report(&info, &outcome);

                results.push(TestRun {
                    name: info.name,
                    category: info.suite,
                    outcome,
                    duration,
                });
            }
        }

        RunResult::new(results, start.elapsed())
    }
}

/// Results from running tests
#[derive(Debug)]
pub struct RunResult {
    /// Individual test results
    pub results: Vec<TestRun>,
    /// Total time taken
    pub duration: Duration,
}

impl RunResult {
    pub fn new(results: Vec<TestRun>, duration: Duration) -> Self {
        Self { results, duration }
    }

    /// Count of passed tests
    pub fn passed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome.is_passed())
            .count()
    }

    /// Count of failed tests
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.is_failed()).count()
    }

    /// Count of ignored tests
    pub fn ignored(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome.is_ignored())
            .count()
    }

    /// Total test count
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// No test failed
    pub fn all_passed(&self) -> bool {
        !self.results.iter().any(|r| r.is_failed())
    }

    /// Print summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════╗");
        println!("║           TEST RESULTS SUMMARY           ║");
        println!("╠══════════════════════════════════════════╣");
        println!("║  Passed:  {:>5}                          ║", self.passed());
        println!("║  Failed:  {:>5}                          ║", self.failed());
        println!("║  Ignored: {:>5}                          ║", self.ignored());
        println!("║  Total:   {:>5}                          ║", self.total());
        println!("║  Time:    {:>8.2?}                      ║", self.duration);
        println!("╚══════════════════════════════════════════╝");

        if self.failed() > 0 {
            println!("\nFailed tests:");
            for result in self.results.iter().filter(|r| r.is_failed()) {
                println!("  ✗ {}::{}", result.category, result.name);
                for failure in result.outcome.failures() {
                    println!("      {}", failure);
                }
            }
        }
    }
}
