//! Cmdcheck test runner
//!
//! A sequential runner for declarative external-command tests: each test
//! optionally runs a setup shell command, then a run command, feeds it
//! input text, and checks the captured output against an expectation,
//! with per-phase timeouts and forceful process-tree termination.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     BatchRunner                         │
//! │    iterates tests in order; failures go to the          │
//! │    injected FailureSink and never abort the batch       │
//! ├─────────────────────────────────────────────────────────┤
//! │  run_test (executor)                                    │
//! │    ├── setup phase: supervise(setup)  [skipped if empty]│
//! │    ├── run phase:   supervise(run, input)               │
//! │    └── output-matching policy (contains/exact/regex)    │
//! ├─────────────────────────────────────────────────────────┤
//! │  supervise (process)                                    │
//! │    ├── sh -c <command> in own process group             │
//! │    ├── stdin: write input, close (EOF)                  │
//! │    ├── stdout/stderr: chunked capture, CRLF-joined      │
//! │    └── wait FSM: exit / error / timeout → kill group    │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod executor;
pub mod process;
pub mod runner;
pub mod spec;

pub use error::{TestError, TestResult};
pub use executor::run_test;
pub use process::{supervise, ProcessResult, DEFAULT_TIMEOUT_MS};
pub use runner::{BatchRunner, FailureSink, RunnerConfig, TracingSink};
pub use spec::{MatchMode, Test};
