//! Batch runner - sequential execution with per-test failure isolation

use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info};

use crate::executor::run_test;
use crate::process::DEFAULT_TIMEOUT_MS;
use crate::spec::Test;

/// Receives the message of every failed test. Injected into the runner so
/// callers decide what "reporting" means (CI annotations, a collecting
/// buffer in tests, ...). Append-only; the runner never reads back.
pub trait FailureSink {
    fn report(&mut self, message: &str);
}

/// Default sink that forwards failure messages to the tracing output.
#[derive(Debug, Default)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn report(&mut self, message: &str) {
        error!("{}", message);
    }
}

/// Configuration for a batch run
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Working directory shared by every test's commands
    pub cwd: PathBuf,

    /// Timeout applied to each setup and run phase
    pub timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            cwd: PathBuf::from("."),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// Runs an ordered sequence of tests one at a time, never in parallel.
/// One test's failure is reported to the sink and never aborts the batch.
pub struct BatchRunner<S: FailureSink> {
    config: RunnerConfig,
    sink: S,
}

impl<S: FailureSink> BatchRunner<S> {
    pub fn new(config: RunnerConfig, sink: S) -> Self {
        Self { config, sink }
    }

    /// Run every test in order, awaiting full completion of each before
    /// starting the next.
    pub async fn run_all(&mut self, tests: &[Test]) {
        info!("Running {} test(s)...", tests.len());

        for test in tests {
            info!("Running test: {}", test.name);

            match run_test(test, &self.config.cwd, self.config.timeout).await {
                Ok(()) => info!("✓ {}", test.name),
                Err(e) => {
                    error!("✗ {} - {}", test.name, e);
                    self.sink.report(&e.to_string());
                }
            }
        }
    }

    /// Consume the runner and hand the sink back to the caller.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
