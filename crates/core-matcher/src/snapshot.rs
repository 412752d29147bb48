//! Published matcher state.
//!
//! The session owns the only writer; the worker publishes through the same
//! channel. Every worker write passes the freshness checks in `mark_running`
//! and `apply`, performed under the channel's write lock so a pattern change
//! and a late result can never interleave.

use core_pattern::{Pattern, PatternError, PatternStatus, TestCase, TestState, ValidationResult};
use uuid::Uuid;

/// One test case paired with its last known validation state.
#[derive(Debug, Clone)]
pub struct CaseEntry {
    pub case: TestCase,
    pub state: TestState,
}

/// Outcome of offering a worker result to the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
    Applied,
    /// Computed under an older pattern generation.
    StaleGeneration,
    /// The test case was removed meanwhile.
    Orphaned,
    /// The test case's text or mode changed meanwhile.
    Superseded,
}

impl Publish {
    pub fn as_str(&self) -> &'static str {
        match self {
            Publish::Applied => "applied",
            Publish::StaleGeneration => "stale_generation",
            Publish::Orphaned => "orphaned",
            Publish::Superseded => "superseded",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatcherSnapshot {
    /// Bumped on every pattern text change.
    pub generation: u64,
    pub pattern: Pattern,
    /// Display order of the test cases.
    pub entries: Vec<CaseEntry>,
}

impl MatcherSnapshot {
    pub fn entry(&self, uuid: Uuid) -> Option<&CaseEntry> {
        self.entries.iter().find(|e| e.case.uuid == uuid)
    }

    pub fn state(&self, uuid: Uuid) -> Option<&TestState> {
        self.entry(uuid).map(|e| &e.state)
    }

    pub fn pattern_error(&self) -> Option<&PatternError> {
        self.pattern.error()
    }

    /// No validation is outstanding for the current pattern.
    pub fn is_settled(&self) -> bool {
        match self.pattern.status() {
            PatternStatus::Valid(_) => self.entries.iter().all(|e| e.state.result.is_finished()),
            PatternStatus::Empty | PatternStatus::Invalid(_) => true,
        }
    }

    pub fn passed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state.result.is_success())
            .count()
    }

    /// State a freshly (re)configured case starts in under the current pattern.
    pub(crate) fn initial_state(&self, uuid: Uuid) -> TestState {
        match self.pattern.status() {
            PatternStatus::Invalid(err) => TestState::invalid_pattern(uuid, err.message.clone()),
            PatternStatus::Empty | PatternStatus::Valid(_) => TestState::idle(uuid),
        }
    }

    /// Replace the pattern, bump the generation, and reset every state.
    pub(crate) fn install_pattern(&mut self, pattern: Pattern) {
        self.generation += 1;
        self.pattern = pattern;
        for i in 0..self.entries.len() {
            let uuid = self.entries[i].case.uuid;
            self.entries[i].state = self.initial_state(uuid);
        }
    }

    fn check(&self, generation: u64, case: &TestCase) -> Result<usize, Publish> {
        if generation != self.generation {
            return Err(Publish::StaleGeneration);
        }
        let idx = self
            .entries
            .iter()
            .position(|e| e.case.uuid == case.uuid)
            .ok_or(Publish::Orphaned)?;
        if !self.entries[idx].case.same_input(case) {
            return Err(Publish::Superseded);
        }
        Ok(idx)
    }

    /// Flip a case to `Running` if `case` is still what the snapshot expects.
    pub(crate) fn mark_running(&mut self, generation: u64, case: &TestCase) -> Publish {
        match self.check(generation, case) {
            Ok(idx) => {
                self.entries[idx].state = TestState {
                    uuid: case.uuid,
                    result: ValidationResult::Running,
                    matches: Vec::new(),
                };
                Publish::Applied
            }
            Err(rejected) => rejected,
        }
    }

    /// Store a finished validation if it is still current.
    pub(crate) fn apply(&mut self, generation: u64, case: &TestCase, state: TestState) -> Publish {
        match self.check(generation, case) {
            Ok(idx) => {
                self.entries[idx].state = state;
                Publish::Applied
            }
            Err(rejected) => rejected,
        }
    }
}
