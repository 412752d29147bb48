//! Validation orchestration: pattern state, the pending queue, and the worker.
//!
//! Flow:
//! - `MatcherSession::set_pattern` pushes into the pattern history and
//!   recompiles synchronously. A valid pattern bumps the generation, resets
//!   every test case to `Idle` and enqueues all of them; an invalid one marks
//!   every case `Error(InvalidPattern)` and queues nothing.
//! - Editing one test case's text or mode re-enqueues only that case.
//! - A single worker task waits on `TestCaseQueue::receive`, drains the queue
//!   one case at a time, runs `core_pattern::validate` on the blocking pool,
//!   and publishes each result as soon as it is ready.
//!
//! Freshness: results are stamped with the generation read when the case was
//! picked up. `MatcherSnapshot::apply` drops results whose generation is no
//! longer current, whose case was removed, or whose case text/mode changed
//! meanwhile. There is no cancellation of a running validation; its late
//! result is simply discarded.
//!
//! No timeout wraps the engine itself. With the backtracking engine the
//! per-search backtrack budget turns runaway patterns into an engine failure;
//! the linear engine cannot run away.

pub mod queue;
pub mod session;
pub mod snapshot;
mod worker;

pub use queue::TestCaseQueue;
pub use session::{MatcherSession, SessionOptions};
pub use snapshot::{CaseEntry, MatcherSnapshot, Publish};
pub use worker::{MatcherMetrics, MetricsSnapshot};
