//! Error types for the command test runner

use thiserror::Error;

/// Failure taxonomy for a single test.
///
/// Callers match structurally on the variant: `Failed` covers spawn
/// errors, non-zero exits, and captured stderr; `Timeout` and
/// `OutputMismatch` carry their own payloads.
#[derive(Error, Debug)]
pub enum TestError {
    /// Generic test failure (non-zero exit, captured stderr, spawn error)
    #[error("{0}")]
    Failed(String),

    /// The supervised process did not exit within the configured duration
    #[error("Timed out after {0} ms")]
    Timeout(u64),

    /// The run command succeeded but its output failed the matching policy
    #[error("Output mismatch in '{name}': expected {expected:?}, got {actual:?}")]
    OutputMismatch {
        name: String,
        expected: String,
        actual: String,
        /// Reserved for future diagnostic extensions; empty today.
        feedback: String,
    },

    /// IO error from stream plumbing (stdin write, wait)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TestResult<T> = std::result::Result<T, TestError>;
