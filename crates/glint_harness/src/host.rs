//! Host adapter
//!
//! The harness needs two things from whatever discovers tests: the list of
//! test cases, and somewhere to report outcomes. Each test case gets one
//! `started` call followed by exactly one `report` call.

use std::fmt;

use crate::outcome::Outcome;
use crate::runner::TestSuite;

/// Identity of a test case as seen by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestInfo {
    pub suite: String,
    pub name: String,
}

impl fmt::Display for TestInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.suite, self.name)
    }
}

/// Discovery and reporting surface of the host test framework
pub trait Host<S> {
    /// Suites to run, in order
    fn test_cases(&mut self) -> Vec<TestSuite<S>>;

    /// A test case is about to run
    fn started(&mut self, _test: &TestInfo) {}

    /// Terminal notification carrying every failure of the test case
    fn report(&mut self, test: &TestInfo, outcome: &Outcome);
}

/// Host that owns suites directly and logs outcomes
pub struct ConsoleHost<S> {
    suites: Vec<TestSuite<S>>,
    filter: Option<String>,
}

impl<S> Default for ConsoleHost<S> {
    fn default() -> Self {
        Self {
            suites: Vec::new(),
            filter: None,
        }
    }
}

impl<S> ConsoleHost<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a test suite
    pub fn add_suite(&mut self, suite: TestSuite<S>) -> &mut Self {
        self.suites.push(suite);
        self
    }

    /// Set a filter pattern
    pub fn filter(&mut self, pattern: &str) -> &mut Self {
        self.filter = Some(pattern.to_string());
        self
    }
}

impl<S> Host<S> for ConsoleHost<S> {
    fn test_cases(&mut self) -> Vec<TestSuite<S>> {
        let mut suites: Vec<TestSuite<S>> = self.suites.drain(..).collect();
        if let Some(ref pattern) = self.filter {
            for suite in &mut suites {
                suite.retain_matching(pattern);
            }
            suites.retain(|suite| !suite.cases.is_empty());
        }
        suites
    }

    fn started(&mut self, test: &TestInfo) {
        tracing::debug!("Running test: {}", test);
    }

    fn report(&mut self, test: &TestInfo, outcome: &Outcome) {
        match outcome {
            Outcome::Passed => tracing::info!("  ✓ {}", test.name),
            Outcome::Ignored => tracing::info!("  - {} (ignored)", test.name),
            Outcome::Failed(failures) => {
                tracing::error!("  ✗ {}", test.name);
                for failure in failures {
                    tracing::error!("      {}", failure);
                }
            }
        }
    }
}
