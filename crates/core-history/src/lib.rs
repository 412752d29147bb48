//! Edit history for a single editable text field.
//!
//! The history crate owns two concerns:
//! - `TextState`: an immutable snapshot of one field (content + selection).
//! - `history::TextHistory`: undo/redo stacks over those snapshots with the
//!   coalescing policy that keeps continuous typing and selection-only updates
//!   from flooding the undo stack.
//!
//! Coalescing rules (applied by `TextHistory::push`):
//! - Content differs from the current top: record a new entry and drop the
//!   redo chain (undo-then-edit never resurrects the pre-edit future).
//! - Content equal, redo chain empty: overwrite the top entry in place
//!   (selection moves, programmatic re-sets of identical text).
//! - Content equal, redo chain present: ignore, so the chain built by `undo`
//!   stays intact.
//!
//! Re-entrancy:
//! - Applying an undo/redo result back into the observed field usually makes
//!   the field emit a change that would be pushed again. `undo`/`redo` arm a
//!   `PushGuard::SuppressingNextPush` which swallows exactly that echo. The
//!   guard lives inside the history so its lifecycle is visible in one place.
//!
//! Observation: every mutation republishes `HistoryState` through a
//! `tokio::sync::watch` channel. Observers only read those snapshots.

pub mod history;

pub use history::{HistoryState, PushGuard, PushOutcome, TextHistory};

/// Selection metadata attached to a text snapshot (character offsets).
///
/// `start` may be greater than `end` for backwards selections; history never
/// inspects the selection when deciding whether content changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Collapsed selection (plain caret) at `pos`.
    pub fn caret(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Immutable snapshot of one editable field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TextState {
    pub value: String,
    pub selection: Selection,
}

impl TextState {
    pub fn new(value: impl Into<String>, selection: Selection) -> Self {
        Self {
            value: value.into(),
            selection,
        }
    }

    /// Snapshot with the caret placed after the last character.
    pub fn with_caret_at_end(value: impl Into<String>) -> Self {
        let value = value.into();
        let end = value.chars().count();
        Self {
            value,
            selection: Selection::caret(end),
        }
    }

    /// True when both snapshots hold the same text, regardless of selection.
    pub fn same_content(&self, other: &TextState) -> bool {
        self.value == other.value
    }
}
