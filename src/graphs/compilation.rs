//! Graph compilation logic and validation.
//!
//! This module contains the logic for compiling a GraphBuilder into an
//! executable App, including structural validation and error handling.

use miette::Diagnostic;
use thiserror::Error;

use crate::app::App;
use crate::types::NodeKind;

/// Errors raised while compiling a [`super::GraphBuilder`] into an [`App`].
#[derive(Debug, Error, Diagnostic)]
pub enum GraphCompileError {
    /// `NodeKind::Start` has no outgoing edges (static or conditional), so the
    /// graph would never dispatch a single frame.
    #[error("graph has no entry point: Start has no outgoing edges")]
    #[diagnostic(
        code(weavegraph::graphs::no_entry_point),
        help("add at least one edge or conditional edge from NodeKind::Start")
    )]
    NoEntryPoint,

    /// An edge (static or conditional) names a destination that was never
    /// registered via `add_node` and isn't one of the virtual endpoints.
    #[error("edge targets unknown node {node}")]
    #[diagnostic(
        code(weavegraph::graphs::unknown_node),
        help("register the node with add_node before routing an edge to it")
    )]
    UnknownNode { node: NodeKind },
}

/// Compilation logic for GraphBuilder.
impl super::builder::GraphBuilder {
    /// Compiles the graph into an executable application.
    ///
    /// Validates the graph configuration and converts it into an [`App`] that
    /// can execute workflows. This method performs the following checks:
    ///
    /// - `NodeKind::Start` must have at least one outgoing edge (static or
    ///   conditional), otherwise the graph would never run a node.
    /// - Every static edge and conditional-edge target must name either a
    ///   virtual endpoint (`Start`/`End`) or a node registered with
    ///   `add_node`.
    ///
    /// Nodes with no path back to `Start`, or with no statically provable
    /// path to `End`, are logged as warnings rather than rejected: dynamic
    /// routing (conditional edges, `Command`/`Send` frontier overrides) can
    /// make such a node reachable or terminating in ways this pass can't see
    /// ahead of time.
    ///
    /// # Errors
    ///
    /// Returns [`GraphCompileError::NoEntryPoint`] or
    /// [`GraphCompileError::UnknownNode`] if the checks above fail.
    ///
    /// # Examples
    ///
    /// ```
    /// use weavegraph::graphs::GraphBuilder;
    /// use weavegraph::types::NodeKind;
    ///
    /// # struct MyNode;
    /// # #[async_trait::async_trait]
    /// # impl weavegraph::node::Node for MyNode {
    /// #     async fn run(&self, _: weavegraph::state::StateSnapshot, _: weavegraph::node::NodeContext) -> Result<weavegraph::node::NodePartial, weavegraph::node::NodeError> {
    /// #         Ok(weavegraph::node::NodePartial::default())
    /// #     }
    /// # }
    ///
    /// let app = GraphBuilder::new()
    ///     .add_node(NodeKind::Custom("process".into()), MyNode)
    ///     .add_edge(NodeKind::Start, NodeKind::Custom("process".into()))
    ///     .add_edge(NodeKind::Custom("process".into()), NodeKind::End)
    ///     .compile()?;
    ///
    /// // App is ready for execution
    /// # Ok::<(), weavegraph::graphs::GraphCompileError>(())
    /// ```
    pub fn compile(self) -> Result<App, GraphCompileError> {
        self.validate()?;
        let (nodes, edges, conditional_edges, runtime_config, reducer_registry) =
            self.into_parts();
        Ok(App::from_parts(
            nodes,
            edges,
            conditional_edges,
            runtime_config,
            reducer_registry,
        ))
    }

    fn validate(&self) -> Result<(), GraphCompileError> {
        let nodes = self.nodes_ref();
        let edges = self.edges_ref();
        let conditional_edges = self.conditional_edges_ref();

        let is_known_target = |kind: &NodeKind| -> bool {
            kind.is_start() || kind.is_end() || nodes.contains_key(kind)
        };

        let has_start_edges = edges
            .get(&NodeKind::Start)
            .is_some_and(|dests| !dests.is_empty());
        let has_start_conditional = conditional_edges.iter().any(|ce| ce.from().is_start());
        if !has_start_edges && !has_start_conditional {
            return Err(GraphCompileError::NoEntryPoint);
        }

        for dests in edges.values() {
            for dest in dests {
                if !is_known_target(dest) {
                    return Err(GraphCompileError::UnknownNode {
                        node: dest.clone(),
                    });
                }
            }
        }

        for node in nodes.keys() {
            let reachable_from_start = edges
                .get(&NodeKind::Start)
                .is_some_and(|dests| dests.contains(node))
                || conditional_edges.iter().any(|ce| ce.from().is_start())
                || edges.values().any(|dests| dests.contains(node));
            if !reachable_from_start {
                tracing::warn!(node = %node, "node has no statically visible incoming edge from Start");
            }

            let has_outgoing = edges.get(node).is_some_and(|dests| !dests.is_empty())
                || conditional_edges.iter().any(|ce| ce.from() == node);
            if !has_outgoing {
                tracing::warn!(node = %node, "node has no outgoing edges and no conditional routing; it will default to End at runtime");
            }
        }

        Ok(())
    }
}
