use crate::types::{RunOutcome, Verdict};

/// Decide the verdict for one run. Launch failures beat timeouts, anything on stderr
/// beats the stdout comparison, and the exit status alone never fails a case.
pub fn classify(outcome: &RunOutcome, expected: &str) -> Verdict {
    match outcome {
        RunOutcome::LaunchFailed { reason } => Verdict::LaunchFailure {
            reason: reason.clone(),
        },
        RunOutcome::TimedOut { limit } => Verdict::Timeout { limit: *limit },
        RunOutcome::Completed { stderr, status, .. } if !stderr.is_empty() => {
            Verdict::RuntimeError {
                stderr: stderr.clone(),
                status: *status,
            }
        }
        RunOutcome::Completed { stdout, .. } if !output_matches(stdout, expected) => {
            Verdict::Mismatch {
                expected: expected.to_string(),
                actual: stdout.clone(),
            }
        }
        RunOutcome::Completed { .. } => Verdict::Passed,
    }
}

/// Only leading and trailing whitespace is ignored.
pub fn output_matches(actual: &str, expected: &str) -> bool {
    actual.trim() == expected.trim()
}
