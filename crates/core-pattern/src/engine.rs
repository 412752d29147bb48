use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::matches::{CharCursor, Match};

/// Step budget handed to the backtracking engine per search.
pub const DEFAULT_BACKTRACK_LIMIT: usize = 1_000_000;

/// Which matching engine compiles the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Perl-compatible backtracking (backreferences, look-around).
    #[default]
    Backtracking,
    /// Finite-automata engine with linear-time guarantees and a smaller syntax.
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub kind: EngineKind,
    /// Only consulted by `EngineKind::Backtracking`.
    pub backtrack_limit: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            kind: EngineKind::default(),
            backtrack_limit: DEFAULT_BACKTRACK_LIMIT,
        }
    }
}

/// Pattern text the engine refused to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid pattern: {message}")]
pub struct PatternError {
    pub message: String,
}

/// Failure while running an already compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("backtrack limit exceeded")]
    BacktrackLimit,
    #[error("match engine failed: {0}")]
    Runtime(String),
}

impl From<fancy_regex::Error> for EngineError {
    fn from(err: fancy_regex::Error) -> Self {
        match err {
            fancy_regex::Error::RuntimeError(fancy_regex::RuntimeError::BacktrackLimitExceeded) => {
                EngineError::BacktrackLimit
            }
            other => EngineError::Runtime(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
enum Program {
    Backtracking(fancy_regex::Regex),
    Linear(regex::Regex),
}

impl Program {
    fn build(source: &str, options: EngineOptions) -> Result<Self, PatternError> {
        let program = match options.kind {
            EngineKind::Backtracking => fancy_regex::RegexBuilder::new(source)
                .backtrack_limit(options.backtrack_limit)
                .build()
                .map(Program::Backtracking)
                .map_err(|e| e.to_string()),
            EngineKind::Linear => regex::Regex::new(source)
                .map(Program::Linear)
                .map_err(|e| e.to_string()),
        };
        program.map_err(|message| PatternError { message })
    }

    fn find_all(&self, text: &str) -> Result<Vec<Match>, EngineError> {
        let mut cursor = CharCursor::new(text);
        let mut out = Vec::new();
        match self {
            Program::Backtracking(re) => {
                for caps in re.captures_iter(text) {
                    let caps = caps?;
                    let Some(whole) = caps.get(0) else { continue };
                    let groups = (1..caps.len())
                        .map(|i| caps.get(i).map_or_else(String::new, |g| g.as_str().to_string()))
                        .collect();
                    out.push(cursor.make_match(out.len() + 1, whole.start(), whole.end(), groups));
                }
            }
            Program::Linear(re) => {
                for caps in re.captures_iter(text) {
                    let Some(whole) = caps.get(0) else { continue };
                    let groups = (1..caps.len())
                        .map(|i| caps.get(i).map_or_else(String::new, |g| g.as_str().to_string()))
                        .collect();
                    out.push(cursor.make_match(out.len() + 1, whole.start(), whole.end(), groups));
                }
            }
        }
        Ok(out)
    }

    fn is_match(&self, text: &str) -> Result<bool, EngineError> {
        match self {
            Program::Backtracking(re) => Ok(re.is_match(text)?),
            Program::Linear(re) => Ok(re.is_match(text)),
        }
    }
}

/// A successfully compiled pattern, shareable across threads.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    raw: String,
    kind: EngineKind,
    finder: Program,
    full: Program,
}

impl CompiledPattern {
    pub fn new(raw: &str, options: EngineOptions) -> Result<Self, PatternError> {
        let finder = Program::build(raw, options)?;
        let full = Self::build_anchored(raw, options)?;
        Ok(Self {
            raw: raw.to_string(),
            kind: options.kind,
            finder,
            full,
        })
    }

    /// `\A(?:raw)\z`. A verbose-mode (`x`) comment at the end of `raw` would
    /// swallow the closing group, so when the plain wrap fails on a pattern the
    /// finder accepted, the comment is terminated with a newline first. Only a
    /// pattern still in verbose mode at its end can get there, and there the
    /// newline is insignificant whitespace.
    fn build_anchored(raw: &str, options: EngineOptions) -> Result<Program, PatternError> {
        Program::build(&format!(r"\A(?:{raw})\z"), options)
            .or_else(|_| Program::build(&format!("\\A(?:{raw}\n)\\z"), options))
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// All non-overlapping matches, in order, numbered from 1.
    pub fn find_all(&self, text: &str) -> Result<Vec<Match>, EngineError> {
        self.finder.find_all(text)
    }

    /// True when the pattern matches the whole text (anchored at both ends).
    pub fn matches_fully(&self, text: &str) -> Result<bool, EngineError> {
        self.full.is_match(text)
    }
}

/// Derived compile state of the pattern text.
#[derive(Debug, Clone)]
pub enum PatternStatus {
    Empty,
    Valid(Arc<CompiledPattern>),
    Invalid(PatternError),
}

/// Raw pattern text plus its compiled-or-error state.
///
/// Exactly one of `compiled()` / `error()` is `Some` unless the raw text is
/// empty, in which case both are `None`.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    status: PatternStatus,
}

impl Default for Pattern {
    fn default() -> Self {
        Self::empty()
    }
}

impl Pattern {
    pub fn empty() -> Self {
        Self {
            raw: String::new(),
            status: PatternStatus::Empty,
        }
    }

    /// Compile `raw` synchronously. Never fails; errors land in `error()`.
    pub fn compile(raw: impl Into<String>, options: EngineOptions) -> Self {
        let raw = raw.into();
        if raw.is_empty() {
            return Self::empty();
        }
        let status = match CompiledPattern::new(&raw, options) {
            Ok(compiled) => PatternStatus::Valid(Arc::new(compiled)),
            Err(err) => {
                debug!(target: "pattern.compile", raw_len = raw.len(), engine = ?options.kind, "compile_failed");
                PatternStatus::Invalid(err)
            }
        };
        Self { raw, status }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn status(&self) -> &PatternStatus {
        &self.status
    }

    pub fn compiled(&self) -> Option<&Arc<CompiledPattern>> {
        match &self.status {
            PatternStatus::Valid(compiled) => Some(compiled),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&PatternError> {
        match &self.status {
            PatternStatus::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> EngineOptions {
        EngineOptions {
            kind: EngineKind::Linear,
            ..EngineOptions::default()
        }
    }

    #[test]
    fn empty_raw_has_neither_compiled_nor_error() {
        let p = Pattern::compile("", EngineOptions::default());
        assert!(p.compiled().is_none());
        assert!(p.error().is_none());
        assert!(matches!(p.status(), PatternStatus::Empty));
    }

    #[test]
    fn unbalanced_group_reports_error() {
        for options in [EngineOptions::default(), linear()] {
            let p = Pattern::compile("(", options);
            assert!(p.compiled().is_none());
            let err = p.error().expect("error expected");
            assert!(!err.message.is_empty());
        }
    }

    #[test]
    fn backreference_needs_backtracking_engine() {
        let p = Pattern::compile(r"(a)\1", EngineOptions::default());
        let compiled = p.compiled().expect("backtracking engine accepts backrefs");
        assert!(compiled.matches_fully("aa").unwrap());
        assert!(Pattern::compile(r"(a)\1", linear()).error().is_some());
    }

    #[test]
    fn full_match_respects_alternation_order() {
        // A leftmost-first search finds "a" first; full matching must still accept "ab".
        for options in [EngineOptions::default(), linear()] {
            let compiled = CompiledPattern::new("a|ab", options).unwrap();
            assert!(compiled.matches_fully("ab").unwrap());
            assert!(!compiled.matches_fully("abc").unwrap());
        }
    }

    #[test]
    fn inline_flags_stay_scoped_inside_anchors() {
        let compiled = CompiledPattern::new("(?m)^a$", EngineOptions::default()).unwrap();
        assert!(!compiled.matches_fully("a\nb").unwrap());
        assert_eq!(compiled.find_all("a\nb").unwrap().len(), 1);
    }

    #[test]
    fn verbose_trailing_comment_does_not_swallow_anchors() {
        for options in [EngineOptions::default(), linear()] {
            let p = Pattern::compile("(?x)a+ # letters", options);
            assert_eq!(p.error(), None);
            let compiled = p.compiled().expect("verbose pattern compiles");
            assert!(compiled.matches_fully("aaa").unwrap());
            assert!(!compiled.matches_fully("aab").unwrap());
            assert!(!compiled.matches_fully("aaa\n").unwrap());
            assert_eq!(compiled.find_all("aa b a").unwrap().len(), 2);
        }
    }

    #[test]
    fn backtrack_limit_surfaces_engine_error() {
        let options = EngineOptions {
            kind: EngineKind::Backtracking,
            backtrack_limit: 100_000,
        };
        // Look-ahead forces the backtracking VM; the alternation explodes.
        let compiled = CompiledPattern::new("(?i)(a|b|ab)*(?=c)", options).unwrap();
        let text = "ab".repeat(28);
        assert_eq!(compiled.find_all(&text), Err(EngineError::BacktrackLimit));
    }
}
