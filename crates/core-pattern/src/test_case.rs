use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Match;

/// How a test case judges the matches of the pattern against its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// At least one match.
    #[default]
    Any,
    /// The pattern matches the entire text.
    #[serde(alias = "full")]
    All,
    /// No match at all.
    None,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchMode::Any => "any",
            MatchMode::All => "all",
            MatchMode::None => "none",
        })
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(MatchMode::Any),
            "all" | "full" => Ok(MatchMode::All),
            "none" => Ok(MatchMode::None),
            other => Err(format!("unknown match mode `{other}` (expected any|all|none)")),
        }
    }
}

/// A named text fixture plus the expected match mode.
///
/// Identity is `uuid`: edits keep it, `duplicate` mints a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default = "Uuid::new_v4")]
    pub uuid: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub mode: MatchMode,
}

impl TestCase {
    pub fn new(title: impl Into<String>, text: impl Into<String>, mode: MatchMode) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            text: text.into(),
            mode,
        }
    }

    /// Copy under a fresh identity.
    pub fn duplicate(&self) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            ..self.clone()
        }
    }

    /// True when both describe the same validation input (text + mode).
    /// Titles are presentation only.
    pub fn same_input(&self, other: &TestCase) -> bool {
        self.uuid == other.uuid && self.mode == other.mode && self.text == other.text
    }
}

/// Why a finished validation did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Failure {
    /// The engine ran; the verdict for the match mode is negative.
    Mismatch,
    /// The pattern does not compile; no engine run happened.
    InvalidPattern(String),
    /// The engine gave up (e.g. backtrack budget exhausted).
    Engine(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ValidationResult {
    #[default]
    Idle,
    Running,
    Success,
    Error(Failure),
}

impl ValidationResult {
    pub fn is_finished(&self) -> bool {
        matches!(self, ValidationResult::Success | ValidationResult::Error(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ValidationResult::Success)
    }
}

/// Last known validation outcome of one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestState {
    pub uuid: Uuid,
    pub result: ValidationResult,
    pub matches: Vec<Match>,
}

impl TestState {
    pub fn idle(uuid: Uuid) -> Self {
        Self {
            uuid,
            result: ValidationResult::Idle,
            matches: Vec::new(),
        }
    }

    pub fn running(uuid: Uuid) -> Self {
        Self {
            uuid,
            result: ValidationResult::Running,
            matches: Vec::new(),
        }
    }

    pub fn invalid_pattern(uuid: Uuid, message: impl Into<String>) -> Self {
        Self {
            uuid,
            result: ValidationResult::Error(Failure::InvalidPattern(message.into())),
            matches: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_mints_new_identity() {
        let tc = TestCase::new("t", "abc", MatchMode::None);
        let dup = tc.duplicate();
        assert_ne!(dup.uuid, tc.uuid);
        assert_eq!(dup.text, tc.text);
        assert_eq!(dup.mode, tc.mode);
        assert!(!dup.same_input(&tc));
    }

    #[test]
    fn same_input_ignores_title() {
        let tc = TestCase::new("t", "abc", MatchMode::Any);
        let mut renamed = tc.clone();
        renamed.title = "other".into();
        assert!(renamed.same_input(&tc));
        renamed.mode = MatchMode::All;
        assert!(!renamed.same_input(&tc));
    }

    #[test]
    fn match_mode_parses_aliases() {
        assert_eq!("FULL".parse::<MatchMode>(), Ok(MatchMode::All));
        assert_eq!("none".parse::<MatchMode>(), Ok(MatchMode::None));
        assert!("most".parse::<MatchMode>().is_err());
        assert_eq!(MatchMode::All.to_string(), "all");
    }

    #[test]
    fn only_finished_results_report_finished() {
        assert!(!ValidationResult::Idle.is_finished());
        assert!(!ValidationResult::Running.is_finished());
        assert!(ValidationResult::Error(Failure::Mismatch).is_finished());
        assert!(ValidationResult::Success.is_success());
    }
}
