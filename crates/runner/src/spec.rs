//! Declarative test records, supplied by an external loader

use serde::{Deserialize, Serialize};

/// A single declarative test case.
///
/// Records are immutable once supplied; the runner never writes back.
/// An empty `setup` means the setup phase is skipped entirely, and an
/// empty `input` means nothing is written to the run command's stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Test {
    /// Unique name for this test
    pub name: String,

    /// Optional shell command run before `run`; must exit 0 or the test aborts
    #[serde(default)]
    pub setup: String,

    /// The shell command under test
    pub run: String,

    /// Text written to the run command's stdin, then closed (EOF)
    #[serde(default)]
    pub input: String,

    /// Expected output, interpreted per `mode`
    pub output: String,

    /// How `output` is compared against captured stdout
    #[serde(default)]
    pub mode: MatchMode,
}

impl Test {
    /// Whether the setup phase runs at all.
    pub fn has_setup(&self) -> bool {
        !self.setup.is_empty()
    }
}

/// Output-matching policy applied after a successful run.
///
/// `Contains` is the default; `Exact` and `Regex` are the alternative
/// comparison modes for loaders that opt into them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-sensitive substring containment, no trimming or normalization
    #[default]
    Contains,
    /// Byte-for-byte equality of the full captured output
    Exact,
    /// The expected string is a regular expression matched against the output
    Regex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_record() {
        let test: Test =
            serde_json::from_str(r#"{"name":"t","run":"echo hi","output":"hi"}"#).unwrap();

        assert!(!test.has_setup());
        assert!(test.input.is_empty());
        assert_eq!(test.mode, MatchMode::Contains);
    }

    #[test]
    fn test_mode_parses_snake_case() {
        let test: Test = serde_json::from_str(
            r#"{"name":"t","run":"true","output":"^ok$","mode":"regex"}"#,
        )
        .unwrap();

        assert_eq!(test.mode, MatchMode::Regex);
    }
}
