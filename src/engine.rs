use crate::backend::Backend;
use crate::report::Reporter;
use crate::types::{TestCase, Verdict};
use crate::verdict::classify;
use anyhow::Result;
use std::fs;
use std::io::ErrorKind;
use tracing::{debug, warn};

/// Run one case to a verdict. A golden file that is absent or unreadable fails the case
/// without running it. The golden file is decoded lossily, like the captured output.
pub fn run_case<B: Backend>(backend: &B, case: &TestCase) -> Verdict {
    let expected = match fs::read(&case.expectation) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("no expectation file for {}", case.source.display());
            return Verdict::MissingExpectation {
                path: case.expectation.clone(),
            };
        }
        Err(e) => {
            warn!("cannot read {}: {e}", case.expectation.display());
            return Verdict::UnreadableExpectation {
                path: case.expectation.clone(),
                reason: e.to_string(),
            };
        }
    };
    let outcome = backend.run(&case.source);
    let verdict = classify(&outcome, &expected);
    debug!("{}: {}", case.name, verdict.kind());
    verdict
}

/// Run every case in order, recording each verdict before the next case starts.
///
/// Per-case failures never stop the loop; only a failing write to the log does.
pub fn run_cases<B, I>(backend: &B, cases: I, reporter: &mut Reporter) -> Result<()>
where
    B: Backend,
    I: IntoIterator<Item = TestCase>,
{
    for case in cases {
        let verdict = run_case(backend, &case);
        reporter.record(&case, &verdict)?;
    }
    Ok(())
}
