//! Control-flow primitives emitted by nodes to influence subsequent scheduling.
//!
//! Frontier commands are kept separate from state updates so nodes can
//! express routing intent without mutating application state directly. The
//! barrier aggregates these directives in a deterministic order and the runner
//! reconciles them with unconditional / conditional edges.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::types::NodeKind;

/// One dynamic fan-out target: a destination node plus the payload that
/// should be merged into its input for this invocation only.
///
/// A node returning one or more `SendItem`s (via
/// [`crate::node::NodePartial::with_send`]) bypasses its own outgoing edges
/// entirely for this step - the targets are exactly the `to` fields listed,
/// each executed once with `payload` overlaid on top of the current state.
#[derive(Clone, Debug, PartialEq)]
pub struct SendItem {
    pub to: NodeKind,
    pub payload: FxHashMap<String, Value>,
}

impl SendItem {
    #[must_use]
    pub fn new(to: impl Into<NodeKind>, payload: FxHashMap<String, Value>) -> Self {
        Self {
            to: to.into(),
            payload,
        }
    }
}

/// A request to suspend the current frame pending external input.
///
/// Carried by [`FrontierCommand::Interrupt`]. If the runner has a handler
/// registered (`AppRunner::on_interrupt`), the handler is given a chance to
/// supply a delta and the originating node re-runs with it merged in;
/// otherwise the run terminates cleanly with the pre-interrupt state.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct InterruptRequest {
    pub message: String,
    pub data: FxHashMap<String, Value>,
}

impl InterruptRequest {
    #[must_use]
    pub fn new(message: impl Into<String>, data: FxHashMap<String, Value>) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Route identifier used by frontier commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeRoute {
    /// Route to another node in the graph.
    Node(NodeKind),
}

impl NodeRoute {
    /// Return the concrete `NodeKind` for this route.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        match self {
            NodeRoute::Node(kind) => kind,
        }
    }

    /// Clone the underlying `NodeKind`.
    #[must_use]
    pub fn to_node_kind(&self) -> NodeKind {
        self.kind().clone()
    }
}

impl From<NodeKind> for NodeRoute {
    fn from(kind: NodeKind) -> Self {
        NodeRoute::Node(kind)
    }
}

/// Command emitted by a node to manipulate the next frontier.
#[derive(Clone, Debug, PartialEq)]
pub enum FrontierCommand {
    /// Append additional routes to the existing frontier calculation.
    Append(Vec<NodeRoute>),
    /// Replace the default routes emitted for the node.
    Replace(Vec<NodeRoute>),
    /// Dynamic fan-out: schedule one fresh frame per item, each merging its
    /// own payload into the state it is invoked with. The node's own edges
    /// are not evaluated.
    Send(Vec<SendItem>),
    /// Suspend this frame pending external input.
    Interrupt(InterruptRequest),
}
