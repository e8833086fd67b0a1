//! Shared fixtures for scheduler and runtime tests.
//!
//! Kept in the library proper (rather than `tests/common/`) so integration
//! tests across multiple files can import a single source of truth without
//! duplicating node/snapshot boilerplate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Builds a bare [`StateSnapshot`] carrying only the version numbers under
/// test; messages/extra/errors stay empty.
#[must_use]
pub fn create_test_snapshot(messages_version: u32, extra_version: u32) -> StateSnapshot {
    StateSnapshot {
        messages: Vec::new(),
        messages_version,
        extra: FxHashMap::default(),
        extra_version,
        errors: Vec::new(),
        errors_version: 1,
    }
}

/// A node that always fails with a fixed, recognizable error.
#[derive(Default)]
pub struct FailingNode;

#[async_trait]
impl Node for FailingNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Err(NodeError::MissingInput { what: "test_key" })
    }
}

struct EchoNode {
    label: &'static str,
    delay: Option<Duration>,
}

#[async_trait]
impl Node for EchoNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(NodePartial::new().with_messages(vec![Message::assistant(self.label)]))
    }
}

/// A two-node ("A", "B") registry with no artificial delay.
#[must_use]
pub fn make_test_registry() -> FxHashMap<NodeKind, Arc<dyn Node>> {
    let mut nodes: FxHashMap<NodeKind, Arc<dyn Node>> = FxHashMap::default();
    nodes.insert(
        NodeKind::Custom("A".into()),
        Arc::new(EchoNode {
            label: "A",
            delay: None,
        }),
    );
    nodes.insert(
        NodeKind::Custom("B".into()),
        Arc::new(EchoNode {
            label: "B",
            delay: None,
        }),
    );
    nodes
}

/// A two-node ("A", "B") registry where "A" takes longer than "B", useful
/// for asserting scheduler concurrency behavior.
#[must_use]
pub fn make_delayed_registry() -> FxHashMap<NodeKind, Arc<dyn Node>> {
    let mut nodes: FxHashMap<NodeKind, Arc<dyn Node>> = FxHashMap::default();
    nodes.insert(
        NodeKind::Custom("A".into()),
        Arc::new(EchoNode {
            label: "A",
            delay: Some(Duration::from_millis(30)),
        }),
    );
    nodes.insert(
        NodeKind::Custom("B".into()),
        Arc::new(EchoNode {
            label: "B",
            delay: Some(Duration::from_millis(5)),
        }),
    );
    nodes
}
