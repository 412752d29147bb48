use std::time::Instant;
use tracing::debug;

use crate::{CompiledPattern, Failure, MatchMode, TestCase, TestState, ValidationResult};

/// Run `pattern` against `case.text` and judge the result by `case.mode`.
///
/// CPU bound; may run arbitrarily long on catastrophic patterns unless the
/// engine's backtrack budget stops it. Never call from an interaction path.
pub fn validate(case: &TestCase, pattern: &CompiledPattern) -> TestState {
    let started = Instant::now();
    let matches = match pattern.find_all(&case.text) {
        Ok(matches) => matches,
        Err(err) => {
            debug!(target: "pattern.validate", uuid = %case.uuid, %err, "engine_failed");
            return TestState {
                uuid: case.uuid,
                result: ValidationResult::Error(Failure::Engine(err.to_string())),
                matches: Vec::new(),
            };
        }
    };

    let passed = match case.mode {
        MatchMode::Any => Ok(!matches.is_empty()),
        MatchMode::All => pattern.matches_fully(&case.text),
        MatchMode::None => Ok(matches.is_empty()),
    };
    let result = match passed {
        Ok(true) => ValidationResult::Success,
        Ok(false) => ValidationResult::Error(Failure::Mismatch),
        Err(err) => ValidationResult::Error(Failure::Engine(err.to_string())),
    };

    debug!(
        target: "pattern.validate",
        uuid = %case.uuid,
        mode = %case.mode,
        text_len = case.text.len(),
        match_count = matches.len(),
        success = result.is_success(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "validated"
    );

    TestState {
        uuid: case.uuid,
        result,
        matches,
    }
}
