use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::channels::Channel;
use crate::event_bus::EventEmitter;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::reducers::ReducerRegistry;
use crate::state::{StateSnapshot, VersionedState};
use crate::types::{ChannelType, NodeKind};

/// One payload to overlay on top of the shared snapshot for a single
/// dynamically-sent frame (see [`crate::control::FrontierCommand::Send`]).
pub type SendPayload = FxHashMap<String, Value>;

/// Per-node "has this snapshot already been seen" bookkeeping.
///
/// Keyed by an arbitrary node id string rather than [`NodeKind`] directly,
/// so persisted checkpoints (and tests) don't have to round-trip through
/// `NodeKind`'s `Hash` impl. The inner map's keys are channel names
/// (`"messages"`, `"extra"`).
#[derive(Clone, Debug, Default)]
pub struct SchedulerState {
    pub versions_seen: FxHashMap<String, FxHashMap<String, u64>>,
}

/// Outcome of one superstep: which nodes ran, which were skipped (either
/// because they're `End` or because their inputs hadn't changed), and the
/// raw per-node outputs in the same order as `ran_nodes`.
#[derive(Debug, Default)]
pub struct StepRunResult {
    pub ran_nodes: Vec<NodeKind>,
    pub skipped_nodes: Vec<NodeKind>,
    pub outputs: Vec<(NodeKind, NodePartial)>,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("node {kind:?} failed at step {step}: {source}")]
    NodeRun {
        kind: NodeKind,
        step: u64,
        #[source]
        source: NodeError,
    },
    #[error("scheduler task join failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Drives one bulk-synchronous-parallel superstep.
///
/// A `Scheduler` is stateless beyond its concurrency limit; version-gating
/// state lives in the caller-owned [`SchedulerState`] so it can be
/// checkpointed and restored independently.
#[derive(Clone, Debug)]
pub struct Scheduler {
    pub concurrency_limit: usize,
}

impl Scheduler {
    #[must_use]
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    /// Whether the node identified by `id` needs to run against `snapshot`:
    /// true if it has never run, or if the messages/extra channel versions
    /// it last observed are behind the snapshot's.
    #[must_use]
    pub fn should_run(&self, state: &SchedulerState, id: &str, snapshot: &StateSnapshot) -> bool {
        match state.versions_seen.get(id) {
            None => true,
            Some(seen) => {
                let messages_seen = seen.get("messages").copied().unwrap_or(0);
                let extra_seen = seen.get("extra").copied().unwrap_or(0);
                u64::from(snapshot.messages_version) > messages_seen
                    || u64::from(snapshot.extra_version) > extra_seen
            }
        }
    }

    /// Records that `id` has now observed `snapshot`'s channel versions.
    pub fn record_seen(&self, state: &mut SchedulerState, id: &str, snapshot: &StateSnapshot) {
        let entry = state.versions_seen.entry(id.to_string()).or_default();
        entry.insert(
            "messages".to_string(),
            u64::from(snapshot.messages_version),
        );
        entry.insert("extra".to_string(), u64::from(snapshot.extra_version));
    }

    /// Runs one superstep over `frontier`.
    ///
    /// `NodeKind::End` frames and frames whose channels haven't advanced
    /// since they last ran are skipped without dispatch. The rest run
    /// concurrently, bounded by `concurrency_limit`; a single node error
    /// aborts the whole superstep.
    ///
    /// `frontier` may contain the same `NodeKind` more than once (a dynamic
    /// fan-out targeting one node several times); duplicates are never
    /// deduplicated - each occurrence dispatches its own task. `payloads`
    /// supplies, per node, an ordered queue of per-frame overlays: the first
    /// occurrence of a kind in `frontier` consumes the first queued payload
    /// for that kind, the second occurrence the second, and so on. A
    /// payload-bearing frame always runs, bypassing the version-gated
    /// `should_run` skip that plain (non-sent) frames are subject to.
    ///
    /// A payload is overlaid onto its frame's `extra` channel by running it
    /// through `reducer_registry`'s registered `Extra`-channel reducers —
    /// the same merge the barrier applies to a node's own output — rather
    /// than a plain right-biased overwrite, so a key with a registered
    /// accumulator reducer sees `merge(state, payload)` per spec instead of
    /// last-write-wins.
    pub async fn superstep(
        &self,
        state: &mut SchedulerState,
        nodes: &FxHashMap<NodeKind, Arc<dyn Node>>,
        frontier: Vec<NodeKind>,
        payloads: FxHashMap<NodeKind, Vec<SendPayload>>,
        snapshot: StateSnapshot,
        step: u64,
        emitter: Arc<dyn EventEmitter>,
        reducer_registry: &ReducerRegistry,
    ) -> Result<StepRunResult, SchedulerError> {
        let mut result = StepRunResult::default();
        let mut to_run: Vec<(NodeKind, Option<SendPayload>)> = Vec::new();
        let mut queues: FxHashMap<NodeKind, VecDeque<SendPayload>> = payloads
            .into_iter()
            .map(|(k, v)| (k, VecDeque::from(v)))
            .collect();

        for kind in frontier {
            if kind.is_end() {
                result.skipped_nodes.push(kind);
                continue;
            }
            let payload = queues.get_mut(&kind).and_then(VecDeque::pop_front);
            if payload.is_none() {
                let id = kind.encode();
                if !self.should_run(state, &id, &snapshot) {
                    result.skipped_nodes.push(kind);
                    continue;
                }
            }
            to_run.push((kind, payload));
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let mut joins = JoinSet::new();

        for (index, (kind, payload)) in to_run.iter().cloned().enumerate() {
            let node = nodes.get(&kind).cloned();
            let semaphore = Arc::clone(&semaphore);
            let mut snapshot = snapshot.clone();
            if let Some(payload) = payload {
                let mut temp_state = VersionedState::from_snapshot(snapshot.clone());
                let partial = NodePartial::new().with_extra(payload);
                let _ = reducer_registry.try_update(ChannelType::Extra, &mut temp_state, &partial);
                snapshot.extra = temp_state.extra.snapshot();
            }
            let emitter = Arc::clone(&emitter);
            let node_id = kind.encode();

            joins.spawn(async move {
                let permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("scheduler semaphore is never closed");
                let outcome = match node {
                    Some(node) => {
                        let ctx = NodeContext {
                            node_id,
                            step,
                            event_emitter: emitter,
                        };
                        node.run(snapshot, ctx).await
                    }
                    None => Ok(NodePartial::new()),
                };
                drop(permit);
                (index, kind, outcome)
            });
        }

        let mut slots: Vec<Option<(NodeKind, NodePartial)>> = Vec::with_capacity(to_run.len());
        slots.resize_with(to_run.len(), || None);

        while let Some(joined) = joins.join_next().await {
            let (index, kind, outcome) = joined?;
            match outcome {
                Ok(partial) => slots[index] = Some((kind, partial)),
                Err(source) => return Err(SchedulerError::NodeRun { kind, step, source }),
            }
        }

        for ((kind, _payload), slot) in to_run.into_iter().zip(slots) {
            self.record_seen(state, &kind.encode(), &snapshot);
            result.ran_nodes.push(kind);
            if let Some(output) = slot {
                result.outputs.push(output);
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::create_test_snapshot;

    #[test]
    fn should_run_defaults_to_true_for_unseen_node() {
        let sched = Scheduler::new(1);
        let state = SchedulerState::default();
        let snap = create_test_snapshot(1, 1);
        assert!(sched.should_run(&state, "A", &snap));
    }

    #[test]
    fn record_seen_then_should_run_is_false_without_advance() {
        let sched = Scheduler::new(1);
        let mut state = SchedulerState::default();
        let snap = create_test_snapshot(1, 1);
        sched.record_seen(&mut state, "A", &snap);
        assert!(!sched.should_run(&state, "A", &snap));
    }
}
