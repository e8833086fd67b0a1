//! Capstone Demo: Iterative Refinement via a Conditional-Edge Loop
//!
//! Shows a node routing back to itself through a conditional edge until a
//! stop condition (an iteration cap recorded in the extra channel) is met,
//! then falling through to End. The refiner here is a deterministic local
//! transform rather than a live LLM call, so the demo has no network or
//! API-key dependency; swap `LocalRefinerNode` for a `weavegraph::llm::ChatNode`
//! bound to a real `ChatModelClient` (see `demos/llm_chat.rs`) to drive the
//! same loop from a model's output instead.

use async_trait::async_trait;
use miette::Result;
use rustc_hash::FxHashMap;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use weavegraph::channels::Channel;
use weavegraph::channels::errors::pretty_print;
use weavegraph::graphs::{EdgePredicate, GraphBuilder};
use weavegraph::message::Message;
use weavegraph::node::{Node, NodeContext, NodeError, NodePartial};
use weavegraph::state::{StateSnapshot, VersionedState};
use weavegraph::types::NodeKind;

#[derive(Clone)]
struct InputBootstrapperNode;

#[async_trait]
impl Node for InputBootstrapperNode {
    #[instrument(skip(self, snapshot, ctx), fields(step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        ctx.emit("bootstrap_start", "Creating initial content")?;

        let user_input = snapshot
            .messages
            .iter()
            .find(|msg| msg.has_role(Message::USER))
            .map(|msg| msg.content.as_str())
            .unwrap_or("Tell me about Weavegraph capabilities");

        let initial_content = format!(
            "Overview: {user_input}. Weavegraph is a Rust graph execution framework."
        );

        let mut extra = FxHashMap::default();
        extra.insert("needs_more_refinement".into(), json!(true));
        extra.insert("iteration_count".into(), json!(0));

        Ok(NodePartial::new()
            .with_messages(vec![Message::assistant(&initial_content)])
            .with_extra(extra))
    }
}

/// Deterministically expands the latest draft each pass, standing in for a
/// model-driven refinement step without a network dependency.
#[derive(Clone)]
struct LocalRefinerNode {
    max_iterations: usize,
}

#[async_trait]
impl Node for LocalRefinerNode {
    #[instrument(skip(self, snapshot, ctx), fields(step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let latest = snapshot
            .messages
            .iter()
            .rev()
            .find(|m| m.has_role(Message::ASSISTANT))
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let current_iter = snapshot
            .extra
            .get("iteration_count")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;

        let completed = current_iter + 1;
        let refinement_goal = match current_iter {
            0 => "add concrete examples",
            1 => "tighten the structure",
            _ => "polish the language",
        };
        let refined = format!("{latest} Refinement {completed} ({refinement_goal}).");

        ctx.emit(
            "refine_progress",
            format!("iteration {completed}/{}: {refinement_goal}", self.max_iterations),
        )?;

        let needs_more = completed < self.max_iterations;

        let mut extra = FxHashMap::default();
        extra.insert("iteration_count".into(), json!(completed));
        extra.insert("needs_more_refinement".into(), json!(needs_more));

        Ok(NodePartial::new()
            .with_messages(vec![Message::assistant(&refined)])
            .with_extra(extra))
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_filter(
                    EnvFilter::from_default_env()
                        .add_directive("weavegraph=info".parse().unwrap())
                        .add_directive("cap_demo=info".parse().unwrap()),
                ),
        )
        .with(ErrorLayer::default())
        .init();
}

fn init_miette() {
    miette::set_panic_hook();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_miette();

    info!("=== Capstone Demo: Iterative Refinement Loop ===\n");

    let initial_state = VersionedState::builder()
        .with_user_message("The team needs a short update on Weavegraph's capabilities.")
        .build();

    let refinement_predicate: EdgePredicate = Arc::new(|snapshot: StateSnapshot| {
        let needs_refinement = snapshot
            .extra
            .get("needs_more_refinement")
            .and_then(|value| value.as_bool())
            .unwrap_or(false);

        if needs_refinement {
            vec!["refiner".to_string()]
        } else {
            vec!["End".to_string()]
        }
    });

    let app = GraphBuilder::new()
        .add_node(
            NodeKind::Custom("bootstrapper".into()),
            InputBootstrapperNode,
        )
        .add_node(
            NodeKind::Custom("refiner".into()),
            LocalRefinerNode { max_iterations: 3 },
        )
        .add_edge(NodeKind::Start, NodeKind::Custom("bootstrapper".into()))
        .add_edge(
            NodeKind::Custom("bootstrapper".into()),
            NodeKind::Custom("refiner".into()),
        )
        .add_conditional_edge(
            NodeKind::Custom("refiner".into()),
            Arc::clone(&refinement_predicate),
        )
        .compile()?;

    info!("pipeline: Bootstrapper -> Refiner (loops until iteration cap) -> End");

    let final_state = app.invoke(initial_state).await?;
    let snapshot = final_state.snapshot();

    if let Some(latest) = snapshot
        .messages
        .iter()
        .rev()
        .find(|m| m.has_role(Message::ASSISTANT))
    {
        info!("final content: {}", latest.content);
    }

    let iterations = snapshot
        .extra
        .get("iteration_count")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    info!("completed {iterations} refinement iteration(s)");

    let errors = final_state.errors.snapshot();
    if !errors.is_empty() {
        info!("errors encountered:\n{}", pretty_print(&errors));
    }

    Ok(())
}
