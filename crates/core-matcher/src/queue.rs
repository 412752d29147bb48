//! Pending validation queue.
//!
//! Ordered by first insertion; re-enqueueing a uuid already pending replaces
//! its payload in place (a test case edited several times before the worker
//! reaches it is validated once, against its latest content). The wake-up
//! signal is a single `Notify` permit, so any number of enqueues while the
//! consumer is busy collapse into one wake-up.

use core_pattern::TestCase;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::trace;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct TestCaseQueue {
    pending: Mutex<VecDeque<TestCase>>,
    signal: Notify,
}

impl TestCaseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<TestCase>> {
        // Every critical section leaves the deque consistent, so a panic
        // elsewhere never invalidates it.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn upsert(pending: &mut VecDeque<TestCase>, case: TestCase) {
        match pending.iter_mut().find(|p| p.uuid == case.uuid) {
            Some(slot) => *slot = case,
            None => pending.push_back(case),
        }
    }

    pub fn enqueue(&self, case: TestCase) {
        {
            let mut pending = self.lock();
            Self::upsert(&mut pending, case);
            trace!(target: "matcher.queue", depth = pending.len(), "enqueue");
        }
        self.signal.notify_one();
    }

    pub fn enqueue_all(&self, cases: impl IntoIterator<Item = TestCase>) {
        let added = {
            let mut pending = self.lock();
            let mut added = 0usize;
            for case in cases {
                Self::upsert(&mut pending, case);
                added += 1;
            }
            trace!(target: "matcher.queue", depth = pending.len(), added, "enqueue_all");
            added
        };
        if added > 0 {
            self.signal.notify_one();
        }
    }

    /// Remove and return the oldest pending entry.
    pub fn dequeue(&self) -> Option<TestCase> {
        self.lock().pop_front()
    }

    /// Drop a specific pending entry (test case deleted before it ran).
    pub fn remove(&self, uuid: Uuid) -> Option<TestCase> {
        let mut pending = self.lock();
        let idx = pending.iter().position(|p| p.uuid == uuid)?;
        trace!(target: "matcher.queue", depth = pending.len() - 1, "remove");
        pending.remove(idx)
    }

    pub fn clear(&self) {
        let mut pending = self.lock();
        trace!(target: "matcher.queue", dropped = pending.len(), "clear");
        pending.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Wait for the work-available signal. Does not take the lock.
    pub async fn receive(&self) {
        self.signal.notified().await;
    }
}
