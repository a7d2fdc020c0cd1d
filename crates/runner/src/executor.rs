//! Test execution - the setup/run sequence and the output-matching policy

use std::path::Path;
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::error::{TestError, TestResult};
use crate::process::supervise;
use crate::spec::{MatchMode, Test};

/// Run the full two-phase sequence for one test.
///
/// The setup command (when present) must fully succeed before the run
/// command is spawned; the first error encountered aborts the test and
/// propagates unchanged.
pub async fn run_test(test: &Test, cwd: &Path, timeout: Duration) -> TestResult<()> {
    if test.has_setup() {
        debug!("Running setup for '{}'", test.name);
        supervise(&test.setup, cwd, None, timeout).await?;
    }

    let input = (!test.input.is_empty()).then_some(test.input.as_str());
    let result = supervise(&test.run, cwd, input, timeout).await?;

    if !matches_output(test.mode, &test.output, &result.stdout)? {
        return Err(TestError::OutputMismatch {
            name: test.name.clone(),
            expected: test.output.clone(),
            actual: result.stdout,
            feedback: String::new(),
        });
    }

    Ok(())
}

/// Apply one comparison mode to the accumulated output. Comparisons are
/// case-sensitive with no trimming or normalization.
fn matches_output(mode: MatchMode, expected: &str, actual: &str) -> TestResult<bool> {
    match mode {
        MatchMode::Contains => Ok(actual.contains(expected)),
        MatchMode::Exact => Ok(actual == expected),
        MatchMode::Regex => {
            let re = Regex::new(expected)
                .map_err(|e| TestError::Failed(format!("Invalid expected pattern: {}", e)))?;
            Ok(re.is_match(actual))
        }
    }
}
