//! Test outcomes and failure records

use std::fmt;
use std::path::PathBuf;

/// Classification of a recorded failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Surface or profile unavailable, reference archive missing
    Setup,
    /// A before/after hook returned an error or panicked
    Hook,
    /// The test body returned an error or panicked
    Body,
    /// Presenting or reading back the surface failed
    Surface,
    /// Captured frame and reference differ in size
    Dimension,
    /// Divergence above the allowed maximum
    Threshold,
    /// More comparisons than reference entries
    ArchiveExhausted,
    /// Reading or writing an archive or diff artifact failed
    Archive,
    /// An expected failure never happened
    ExpectedFailureMissing,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Setup => "setup",
            FailureKind::Hook => "hook",
            FailureKind::Body => "body",
            FailureKind::Surface => "surface",
            FailureKind::Dimension => "dimension",
            FailureKind::Threshold => "threshold",
            FailureKind::ArchiveExhausted => "archive exhausted",
            FailureKind::Archive => "archive",
            FailureKind::ExpectedFailureMissing => "expected failure missing",
        };
        f.write_str(name)
    }
}

/// One recorded failure
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    /// Diff image written for a comparison mismatch
    pub artifact: Option<PathBuf>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            artifact: None,
        }
    }

    pub fn with_artifact(mut self, path: PathBuf) -> Self {
        self.artifact = Some(path);
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(path) = &self.artifact {
            write!(f, " (diff: {})", path.display())?;
        }
        Ok(())
    }
}

/// Final result of one test case
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed,
    Failed(Vec<Failure>),
    Ignored,
}

impl Outcome {
    /// Interpret the failures a test case accumulated.
    ///
    /// With an expected kind the result inverts: no failures is itself a
    /// failure, failures all of the expected kind pass, and any failure of
    /// another kind is reported.
    pub fn from_failures(failures: Vec<Failure>, expected: Option<FailureKind>) -> Self {
        match expected {
            None if failures.is_empty() => Outcome::Passed,
            None => Outcome::Failed(failures),
            Some(kind) if failures.is_empty() => Outcome::Failed(vec![Failure::new(
                FailureKind::ExpectedFailureMissing,
                format!("expected a {} failure but none occurred", kind),
            )]),
            Some(kind) => {
                let unexpected: Vec<Failure> =
                    failures.into_iter().filter(|f| f.kind != kind).collect();
                if unexpected.is_empty() {
                    Outcome::Passed
                } else {
                    Outcome::Failed(unexpected)
                }
            }
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Outcome::Ignored)
    }

    /// Failures of a failed outcome, empty otherwise
    pub fn failures(&self) -> &[Failure] {
        match self {
            Outcome::Failed(failures) => failures,
            _ => &[],
        }
    }
}
