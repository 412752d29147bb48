use tokio::sync::watch;
use tracing::trace;

use crate::TextState;

/// Observable undo/redo availability, republished on every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryState {
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Re-entrancy guard armed by `undo`/`redo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PushGuard {
    #[default]
    Idle,
    /// The next push echoing the restored content is swallowed.
    SuppressingNextPush,
}

/// What a call to `TextHistory::push` did with the supplied snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// New entry on the undo stack; redo chain dropped.
    Recorded,
    /// Top entry overwritten in place (content unchanged).
    Coalesced,
    /// Content unchanged while a redo chain exists; nothing touched.
    Ignored,
    /// Echo of an undo/redo result swallowed by the guard.
    Suppressed,
}

/// Undo/redo stacks over `TextState` snapshots for one field.
///
/// The undo stack's top is always the *current* state; the entry below it is
/// what `undo` returns. The bottom entry is the baseline and cannot be undone.
pub struct TextHistory {
    undo_stack: Vec<TextState>,
    redo_stack: Vec<TextState>,
    guard: PushGuard,
    max_depth: Option<usize>,
    coalesced: u64,
    state_tx: watch::Sender<HistoryState>,
}

impl Default for TextHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl TextHistory {
    /// History with no depth limit.
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(HistoryState::default());
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            guard: PushGuard::Idle,
            max_depth: None,
            coalesced: 0,
            state_tx,
        }
    }

    /// History retaining at most `max_depth` undo entries (oldest dropped first).
    pub fn with_max_depth(max_depth: usize) -> Self {
        let mut history = Self::new();
        history.max_depth = Some(max_depth.max(1));
        history
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
    pub fn guard(&self) -> PushGuard {
        self.guard
    }
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }
    pub fn current(&self) -> Option<&TextState> {
        self.undo_stack.last()
    }

    pub fn state(&self) -> HistoryState {
        *self.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<HistoryState> {
        self.state_tx.subscribe()
    }

    /// Record a value change. See the crate docs for the coalescing rules.
    pub fn push(&mut self, value: TextState) -> PushOutcome {
        if std::mem::take(&mut self.guard) == PushGuard::SuppressingNextPush
            && self.current().is_some_and(|top| top.same_content(&value))
        {
            trace!(target: "history", undo_depth = self.undo_stack.len(), "push_suppressed");
            return PushOutcome::Suppressed;
        }

        let outcome = match self.undo_stack.last_mut() {
            Some(top) if top.same_content(&value) => {
                if self.redo_stack.is_empty() {
                    *top = value;
                    self.coalesced += 1;
                    trace!(target: "history", undo_depth = self.undo_stack.len(), "push_coalesced");
                    PushOutcome::Coalesced
                } else {
                    trace!(target: "history", redo_depth = self.redo_stack.len(), "push_ignored_redo_pending");
                    PushOutcome::Ignored
                }
            }
            _ => {
                self.undo_stack.push(value);
                self.trim();
                self.redo_stack.clear();
                trace!(target: "history", undo_depth = self.undo_stack.len(), "push_recorded");
                PushOutcome::Recorded
            }
        };
        self.publish();
        outcome
    }

    /// Step back one entry, returning the state that is now current.
    ///
    /// Returns `None` without touching anything when only the baseline remains.
    pub fn undo(&mut self) -> Option<TextState> {
        if self.undo_stack.len() < 2 {
            return None;
        }
        let popped = self.undo_stack.pop()?;
        self.redo_stack.push(popped);
        let restored = self.undo_stack.last().cloned();
        self.guard = PushGuard::SuppressingNextPush;
        trace!(target: "history", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "undo_pop");
        self.publish();
        restored
    }

    /// Re-apply the most recently undone entry, returning it.
    pub fn redo(&mut self) -> Option<TextState> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(next.clone());
        self.trim();
        self.guard = PushGuard::SuppressingNextPush;
        trace!(target: "history", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "redo_pop");
        self.publish();
        Some(next)
    }

    /// Drop both stacks (switching documents, opening a saved pattern).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.guard = PushGuard::Idle;
        trace!(target: "history", "history_cleared");
        self.publish();
    }

    fn trim(&mut self) {
        if let Some(max) = self.max_depth
            && self.undo_stack.len() > max
        {
            let excess = self.undo_stack.len() - max;
            self.undo_stack.drain(..excess);
            trace!(target: "history", excess, "undo_stack_trimmed");
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(HistoryState {
            can_undo: self.undo_stack.len() > 1,
            can_redo: !self.redo_stack.is_empty(),
        });
    }
}
