//! Pattern compilation, match extraction, and test case validation.
//!
//! Layers (leaves first):
//! - `engine`: compiles raw pattern text into a `CompiledPattern` using either
//!   the backtracking (`fancy-regex`, Perl-compatible) or the linear-time
//!   (`regex`) engine. A compiled pattern carries two programs: the plain
//!   finder used for "find all", and an anchored `\A(?:..)\z` program used to
//!   decide full-text matches.
//! - `matches`: the `Match` value type. Ranges are half-open and expressed in
//!   character offsets; byte offsets are kept alongside for slicing.
//! - `test_case`: `TestCase`, `MatchMode`, and the per-case `TestState`.
//! - `validate`: the pure `(TestCase, CompiledPattern) -> TestState` step.
//! - `spans`: per-line highlight spans derived from matches.
//!
//! Nothing here spawns or blocks on other threads. `validate` is CPU bound and
//! may run for a long time on pathological input; callers dispatch it off the
//! interaction path (see `core-matcher`).

pub mod engine;
pub mod matches;
pub mod spans;
pub mod test_case;
pub mod validate;

pub use engine::{
    CompiledPattern, DEFAULT_BACKTRACK_LIMIT, EngineError, EngineKind, EngineOptions, Pattern,
    PatternError, PatternStatus,
};
pub use matches::Match;
pub use spans::{LineSpan, line_spans};
pub use test_case::{Failure, MatchMode, TestCase, TestState, ValidationResult};
pub use validate::validate;
