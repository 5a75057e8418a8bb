use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One test program and the golden file holding its expected stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String, // path relative to the test root, without extension
    pub stem: String,
    pub source: PathBuf,
    pub expectation: PathBuf,
}

/// What happened when the target was run against one test program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed {
        status: Option<i32>, // None when terminated by a signal
        stdout: String,
        stderr: String,
        elapsed: Duration,
    },
    TimedOut {
        limit: Duration,
    },
    LaunchFailed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    RuntimeError {
        stderr: String,
        status: Option<i32>,
    },
    Mismatch {
        expected: String,
        actual: String,
    },
    Timeout {
        limit: Duration,
    },
    LaunchFailure {
        reason: String,
    },
    MissingExpectation {
        path: PathBuf,
    },
    UnreadableExpectation {
        path: PathBuf,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VerdictKind {
    Passed,
    RuntimeError,
    Mismatch,
    Timeout,
    LaunchFailure,
    MissingExpectation,
    UnreadableExpectation,
}

impl Verdict {
    pub fn kind(&self) -> VerdictKind {
        match self {
            Verdict::Passed => VerdictKind::Passed,
            Verdict::RuntimeError { .. } => VerdictKind::RuntimeError,
            Verdict::Mismatch { .. } => VerdictKind::Mismatch,
            Verdict::Timeout { .. } => VerdictKind::Timeout,
            Verdict::LaunchFailure { .. } => VerdictKind::LaunchFailure,
            Verdict::MissingExpectation { .. } => VerdictKind::MissingExpectation,
            Verdict::UnreadableExpectation { .. } => VerdictKind::UnreadableExpectation,
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }
}

impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VerdictKind::Passed => "passed",
            VerdictKind::RuntimeError => "runtime error",
            VerdictKind::Mismatch => "output mismatch",
            VerdictKind::Timeout => "timeout",
            VerdictKind::LaunchFailure => "launch failure",
            VerdictKind::MissingExpectation => "missing expectation",
            VerdictKind::UnreadableExpectation => "unreadable expectation",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub total: usize,  // Total number of test cases
    pub passed: usize, // Number of passed test cases
    pub failed: usize, // Number of failed test cases

    // Failure counts per verdict kind, for the breakdown line
    pub failures_by_kind: BTreeMap<VerdictKind, usize>,
    pub log_path: PathBuf,
}

impl Summary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
