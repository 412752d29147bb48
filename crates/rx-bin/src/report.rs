//! Plain-text rendering of a matcher snapshot.

use core_matcher::{CaseEntry, MatcherSnapshot};
use core_pattern::{Failure, PatternStatus, ValidationResult};
use std::fmt::Write;

pub fn verdict_label(result: &ValidationResult) -> &'static str {
    match result {
        ValidationResult::Idle => "IDLE",
        ValidationResult::Running => "RUN ",
        ValidationResult::Success => "PASS",
        ValidationResult::Error(_) => "FAIL",
    }
}

/// `PASS  1 [any] title: 2 matches`
pub fn case_line(index: usize, entry: &CaseEntry) -> String {
    let case = &entry.case;
    let state = &entry.state;
    let mut line = format!("{} {:>2} [{}] ", verdict_label(&state.result), index, case.mode);
    if case.title.is_empty() {
        let _ = write!(line, "{:?}", case.text);
    } else {
        line.push_str(&case.title);
    }
    match &state.result {
        ValidationResult::Success | ValidationResult::Error(Failure::Mismatch) => {
            let n = state.matches.len();
            let _ = write!(line, ": {n} match{}", if n == 1 { "" } else { "es" });
        }
        ValidationResult::Error(Failure::InvalidPattern(_)) => line.push_str(": pattern invalid"),
        ValidationResult::Error(Failure::Engine(msg)) => {
            let _ = write!(line, ": engine failure ({msg})");
        }
        ValidationResult::Idle | ValidationResult::Running => {}
    }
    line
}

pub fn pattern_line(snapshot: &MatcherSnapshot) -> String {
    match snapshot.pattern.status() {
        PatternStatus::Empty => "pattern: <empty>".to_string(),
        PatternStatus::Valid(_) => format!("pattern: /{}/", snapshot.pattern.raw()),
        PatternStatus::Invalid(err) => format!("pattern: /{}/ {err}", snapshot.pattern.raw()),
    }
}

/// Full listing: pattern line, one line per case, and a summary.
pub fn render(snapshot: &MatcherSnapshot) -> String {
    let mut out = pattern_line(snapshot);
    out.push('\n');
    for (i, entry) in snapshot.entries.iter().enumerate() {
        out.push_str(&case_line(i + 1, entry));
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{} of {} passed",
        snapshot.passed(),
        snapshot.entries.len()
    );
    out
}

/// Batch verdict: every case finished with `Success`.
pub fn all_passed(snapshot: &MatcherSnapshot) -> bool {
    snapshot.passed() == snapshot.entries.len()
}
