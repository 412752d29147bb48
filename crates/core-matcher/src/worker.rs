use core_pattern::{Failure, TestState, ValidationResult, validate};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Notify, watch};
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

use crate::queue::TestCaseQueue;
use crate::snapshot::{MatcherSnapshot, Publish};

/// Worker counters (relaxed atomics; inspected by tests and the binary).
#[derive(Debug, Default)]
pub struct MatcherMetrics {
    validations_run: AtomicU64,
    results_applied: AtomicU64,
    results_discarded: AtomicU64,
    skipped_before_run: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub validations_run: u64,
    pub results_applied: u64,
    pub results_discarded: u64,
    pub skipped_before_run: u64,
}

impl MatcherMetrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            validations_run: self.validations_run.load(Ordering::Relaxed),
            results_applied: self.results_applied.load(Ordering::Relaxed),
            results_discarded: self.results_discarded.load(Ordering::Relaxed),
            skipped_before_run: self.skipped_before_run.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct WorkerShutdown {
    notify: Arc<Notify>,
}

impl WorkerShutdown {
    pub(crate) fn signal(&self) {
        self.notify.notify_one();
    }
}

#[derive(Clone, Debug)]
struct ShutdownListener {
    notify: Arc<Notify>,
}

impl ShutdownListener {
    fn new_pair() -> (WorkerShutdown, Self) {
        let notify = Arc::new(Notify::new());
        (
            WorkerShutdown {
                notify: notify.clone(),
            },
            ShutdownListener { notify },
        )
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Single consumer of the test case queue.
pub(crate) struct MatcherWorker {
    queue: Arc<TestCaseQueue>,
    board: Arc<watch::Sender<MatcherSnapshot>>,
    metrics: Arc<MatcherMetrics>,
    shutdown: ShutdownListener,
}

impl MatcherWorker {
    pub(crate) fn spawn(
        queue: Arc<TestCaseQueue>,
        board: Arc<watch::Sender<MatcherSnapshot>>,
        metrics: Arc<MatcherMetrics>,
    ) -> (JoinHandle<()>, WorkerShutdown) {
        let (shutdown, listener) = ShutdownListener::new_pair();
        let worker = Self {
            queue,
            board,
            metrics,
            shutdown: listener,
        };
        let handle = task::spawn(worker.run());
        (handle, shutdown)
    }

    async fn run(self) {
        info!(target: "matcher.worker", "worker_started");
        'outer: loop {
            tokio::select! {
                biased;
                _ = self.shutdown.wait() => {
                    break;
                }
                _ = self.queue.receive() => {}
            }
            while let Some(case) = self.queue.dequeue() {
                tokio::select! {
                    biased;
                    _ = self.shutdown.wait() => {
                        break 'outer;
                    }
                    _ = self.process(case) => {}
                }
            }
        }
        info!(target: "matcher.worker", reason = "shutdown_signal", "worker_stopped");
    }

    async fn process(&self, case: core_pattern::TestCase) {
        let (generation, compiled) = {
            let snap = self.board.borrow();
            (snap.generation, snap.pattern.compiled().cloned())
        };
        let Some(compiled) = compiled else {
            // Pattern empty or invalid: the session already published final states.
            self.metrics.skipped_before_run.fetch_add(1, Ordering::Relaxed);
            trace!(target: "matcher.worker", uuid = %case.uuid, generation, "skip_no_pattern");
            return;
        };

        let mut marked = Publish::Orphaned;
        self.board.send_if_modified(|snap| {
            marked = snap.mark_running(generation, &case);
            marked == Publish::Applied
        });
        if marked != Publish::Applied {
            self.metrics.skipped_before_run.fetch_add(1, Ordering::Relaxed);
            trace!(target: "matcher.worker", uuid = %case.uuid, generation, outcome = marked.as_str(), "skip_stale");
            return;
        }

        self.metrics.validations_run.fetch_add(1, Ordering::Relaxed);
        let uuid = case.uuid;
        let job_case = case.clone();
        let job = task::spawn_blocking(move || validate(&job_case, &compiled));
        let state = match job.await {
            Ok(state) => state,
            Err(join_err) => {
                warn!(target: "matcher.worker", %uuid, ?join_err, "validation_panicked");
                TestState {
                    uuid,
                    result: ValidationResult::Error(Failure::Engine(join_err.to_string())),
                    matches: Vec::new(),
                }
            }
        };

        let mut outcome = Publish::Orphaned;
        self.board.send_if_modified(|snap| {
            outcome = snap.apply(generation, &case, state);
            outcome == Publish::Applied
        });
        if outcome == Publish::Applied {
            self.metrics.results_applied.fetch_add(1, Ordering::Relaxed);
        } else {
            self.metrics.results_discarded.fetch_add(1, Ordering::Relaxed);
        }
        debug!(target: "matcher.worker", %uuid, generation, outcome = outcome.as_str(), "publish");
    }
}
