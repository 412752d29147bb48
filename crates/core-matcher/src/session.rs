use core_history::{HistoryState, PushOutcome, TextHistory, TextState};
use core_pattern::{EngineOptions, MatchMode, Pattern, PatternStatus, TestCase, TestState};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::queue::TestCaseQueue;
use crate::snapshot::{CaseEntry, MatcherSnapshot};
use crate::worker::{MatcherMetrics, MatcherWorker, MetricsSnapshot, WorkerShutdown};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionOptions {
    pub engine: EngineOptions,
    /// `None` keeps the whole pattern history.
    pub history_max_depth: Option<usize>,
}

/// One pattern-authoring session: pattern text, its history, the test cases,
/// and the worker that validates them.
///
/// All mutators run on the caller's task and never wait on matching work.
/// Observers read `MatcherSnapshot`s via `subscribe`.
pub struct MatcherSession {
    options: SessionOptions,
    history: TextHistory,
    queue: Arc<TestCaseQueue>,
    board: Arc<watch::Sender<MatcherSnapshot>>,
    metrics: Arc<MatcherMetrics>,
    worker: Option<JoinHandle<()>>,
    shutdown: WorkerShutdown,
}

impl MatcherSession {
    /// Spawns the worker; must be called from within a Tokio runtime.
    pub fn new(options: SessionOptions) -> Self {
        let queue = Arc::new(TestCaseQueue::new());
        let (board, _) = watch::channel(MatcherSnapshot::default());
        let board = Arc::new(board);
        let metrics = Arc::new(MatcherMetrics::default());
        let (worker, shutdown) =
            MatcherWorker::spawn(queue.clone(), board.clone(), metrics.clone());
        let history = match options.history_max_depth {
            Some(depth) => TextHistory::with_max_depth(depth),
            None => TextHistory::new(),
        };
        info!(target: "matcher.session", engine = ?options.engine.kind, "session_started");
        Self {
            options,
            history,
            queue,
            board,
            metrics,
            worker: Some(worker),
            shutdown,
        }
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn subscribe(&self) -> watch::Receiver<MatcherSnapshot> {
        self.board.subscribe()
    }

    pub fn snapshot(&self) -> MatcherSnapshot {
        self.board.borrow().clone()
    }

    pub fn subscribe_history(&self) -> watch::Receiver<HistoryState> {
        self.history.subscribe()
    }

    pub fn history_state(&self) -> HistoryState {
        self.history.state()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn pattern_text(&self) -> String {
        self.board.borrow().pattern.raw().to_string()
    }

    pub fn test_cases(&self) -> Vec<TestCase> {
        self.board
            .borrow()
            .entries
            .iter()
            .map(|e| e.case.clone())
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    // ---------------------------------------------------------------------------------------------
    // Pattern
    // ---------------------------------------------------------------------------------------------

    /// A value change from the pattern field.
    pub fn set_pattern(&mut self, value: TextState) -> PushOutcome {
        let raw = value.value.clone();
        let outcome = self.history.push(value);
        self.apply_pattern(&raw);
        outcome
    }

    /// Undo the last pattern edit; the returned state should be shown in the field.
    pub fn undo(&mut self) -> Option<TextState> {
        let restored = self.history.undo()?;
        self.apply_pattern(&restored.value);
        Some(restored)
    }

    pub fn redo(&mut self) -> Option<TextState> {
        let restored = self.history.redo()?;
        self.apply_pattern(&restored.value);
        Some(restored)
    }

    fn apply_pattern(&mut self, raw: &str) {
        if self.board.borrow().pattern.raw() == raw {
            return;
        }
        let pattern = Pattern::compile(raw, self.options.engine);
        let valid = matches!(pattern.status(), PatternStatus::Valid(_));
        let mut cases = Vec::new();
        self.board.send_modify(|snap| {
            snap.install_pattern(pattern);
            if valid {
                cases = snap.entries.iter().map(|e| e.case.clone()).collect();
            }
            debug!(
                target: "matcher.session",
                generation = snap.generation,
                raw_len = raw.len(),
                valid,
                invalid = snap.pattern.error().is_some(),
                "pattern_installed"
            );
        });
        if valid {
            self.queue.enqueue_all(cases);
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Test cases
    // ---------------------------------------------------------------------------------------------

    pub fn add_test_case(
        &mut self,
        title: impl Into<String>,
        text: impl Into<String>,
        mode: MatchMode,
    ) -> Uuid {
        let case = TestCase::new(title, text, mode);
        let uuid = case.uuid;
        self.insert_case(case, None);
        uuid
    }

    /// Copy `uuid` under a new identity, placed right after the original.
    pub fn duplicate_test_case(&mut self, uuid: Uuid) -> Option<Uuid> {
        let (idx, copy) = {
            let snap = self.board.borrow();
            let idx = snap.entries.iter().position(|e| e.case.uuid == uuid)?;
            (idx, snap.entries[idx].case.duplicate())
        };
        let new_uuid = copy.uuid;
        self.insert_case(copy, Some(idx + 1));
        Some(new_uuid)
    }

    fn insert_case(&mut self, case: TestCase, at: Option<usize>) {
        let mut enqueue = false;
        self.board.send_modify(|snap| {
            enqueue = snap.pattern.compiled().is_some();
            let entry = CaseEntry {
                state: snap.initial_state(case.uuid),
                case: case.clone(),
            };
            match at {
                Some(idx) if idx <= snap.entries.len() => snap.entries.insert(idx, entry),
                _ => snap.entries.push(entry),
            }
        });
        debug!(target: "matcher.session", uuid = %case.uuid, enqueue, "test_case_added");
        if enqueue {
            self.queue.enqueue(case);
        }
    }

    pub fn set_test_case_text(&mut self, uuid: Uuid, text: impl Into<String>) -> bool {
        let text = text.into();
        self.edit_case(uuid, |case| case.text = text)
    }

    pub fn set_test_case_mode(&mut self, uuid: Uuid, mode: MatchMode) -> bool {
        self.edit_case(uuid, |case| case.mode = mode)
    }

    /// Titles are presentation only; no revalidation.
    pub fn set_test_case_title(&mut self, uuid: Uuid, title: impl Into<String>) -> bool {
        let title = title.into();
        let mut found = false;
        self.board.send_if_modified(|snap| {
            if let Some(entry) = snap.entries.iter_mut().find(|e| e.case.uuid == uuid) {
                entry.case.title = title;
                found = true;
            }
            found
        });
        found
    }

    /// Apply `edit` to one case; when its text or mode changed, reset its state and
    /// revalidate only that case.
    fn edit_case<F>(&mut self, uuid: Uuid, edit: F) -> bool
    where
        F: FnOnce(&mut TestCase),
    {
        let mut found = false;
        let mut revalidate = None;
        self.board.send_if_modified(|snap| {
            let Some(idx) = snap.entries.iter().position(|e| e.case.uuid == uuid) else {
                return false;
            };
            found = true;
            let before = snap.entries[idx].case.clone();
            edit(&mut snap.entries[idx].case);
            if snap.entries[idx].case.same_input(&before) {
                return snap.entries[idx].case != before;
            }
            snap.entries[idx].state = snap.initial_state(uuid);
            if snap.pattern.compiled().is_some() {
                revalidate = Some(snap.entries[idx].case.clone());
            }
            true
        });
        if let Some(case) = revalidate {
            debug!(target: "matcher.session", %uuid, "test_case_revalidate");
            self.queue.enqueue(case);
        }
        found
    }

    pub fn remove_test_case(&mut self, uuid: Uuid) -> bool {
        self.queue.remove(uuid);
        let mut removed = false;
        self.board.send_if_modified(|snap| {
            let before = snap.entries.len();
            snap.entries.retain(|e| e.case.uuid != uuid);
            removed = snap.entries.len() != before;
            removed
        });
        debug!(target: "matcher.session", %uuid, removed, "test_case_removed");
        removed
    }

    /// Drop every test case and everything pending for them.
    pub fn clear_test_cases(&mut self) {
        self.queue.clear();
        self.board.send_modify(|snap| snap.entries.clear());
    }

    // ---------------------------------------------------------------------------------------------
    // Documents
    // ---------------------------------------------------------------------------------------------

    /// Replace the whole session content (opening a saved pattern). History restarts
    /// with `pattern` as its baseline.
    ///
    /// Cases sharing a uuid with an earlier case (a copied `[[test_case]]` block) get
    /// a fresh identity so each one is validated.
    pub fn load(&mut self, pattern: &str, mut cases: Vec<TestCase>) {
        let mut seen = HashSet::with_capacity(cases.len());
        let mut reassigned = 0usize;
        for case in &mut cases {
            while !seen.insert(case.uuid) {
                case.uuid = Uuid::new_v4();
                reassigned += 1;
            }
        }
        if reassigned > 0 {
            warn!(target: "matcher.session", reassigned, "duplicate_case_identity_reassigned");
        }
        self.queue.clear();
        self.history.clear();
        self.history.push(TextState::with_caret_at_end(pattern));
        let compiled = Pattern::compile(pattern, self.options.engine);
        let valid = compiled.compiled().is_some();
        self.board.send_modify(|snap| {
            snap.entries = cases
                .iter()
                .map(|case| CaseEntry {
                    case: case.clone(),
                    state: TestState::idle(case.uuid),
                })
                .collect();
            snap.install_pattern(compiled);
        });
        info!(target: "matcher.session", cases = cases.len(), valid, "document_loaded");
        if valid {
            self.queue.enqueue_all(cases);
        }
    }

    /// Wait until no validation is outstanding and return that snapshot.
    pub async fn settled(&self) -> MatcherSnapshot {
        let mut rx = self.board.subscribe();
        match rx.wait_for(MatcherSnapshot::is_settled).await {
            Ok(snap) => snap.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Stop the worker and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.shutdown.signal();
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
    }
}

impl Drop for MatcherSession {
    fn drop(&mut self) {
        self.shutdown.signal();
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}
