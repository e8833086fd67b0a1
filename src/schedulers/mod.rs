//! The bulk-synchronous-parallel superstep engine.
//!
//! A [`Scheduler`] owns nothing about graph topology; it is handed a
//! frontier, a node registry, and a state snapshot, and it dispatches the
//! non-skippable frames concurrently, bounded by a concurrency limit. The
//! caller ([`crate::runtimes::runner::AppRunner`]) is responsible for
//! merging the resulting deltas through a barrier and computing the next
//! frontier.

pub mod scheduler;

pub use scheduler::{Scheduler, SchedulerError, SchedulerState, StepRunResult};
