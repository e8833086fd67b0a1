//! Demo: Chat + Tool Nodes via the Vendor-Neutral LLM Contract
//!
//! Weavegraph's core has no hard dependency on any single LLM SDK. Instead
//! it exposes `ChatModelClient`/`Tool` traits (see `weavegraph::llm`) that a
//! caller implements against whichever provider they use, then binds to a
//! workflow with `ChatNode`/`ToolNode`.
//!
//! This demo stands in a toy `EchoClient`/`UppercaseTool` pair for a real
//! provider so it has no network or API-key dependency; swapping in an
//! OpenAI/Anthropic/local-model client only requires implementing
//! `ChatModelClient` against that provider's wire format.

use async_trait::async_trait;
use miette::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use weavegraph::channels::Channel;
use weavegraph::event_bus::EventEmitter;
use weavegraph::graphs::GraphBuilder;
use weavegraph::llm::{
    ChatCallResult, ChatModelClient, ChatModelError, ChatNode, Tool, ToolNode, ToolSchema,
};
use weavegraph::message::Message;
use weavegraph::state::VersionedState;
use weavegraph::types::NodeKind;

struct EchoClient;

#[async_trait]
impl ChatModelClient for EchoClient {
    async fn call(
        &self,
        messages: Vec<Message>,
        _tools: Option<Vec<ToolSchema>>,
    ) -> Result<ChatCallResult, ChatModelError> {
        let last = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(ChatCallResult::Text(format!("echo: {last}")))
    }

    fn bind_tools(&self, _tools: Vec<ToolSchema>) -> Arc<dyn ChatModelClient> {
        Arc::new(EchoClient)
    }

    fn set_observers(&self, _observers: Vec<Arc<dyn EventEmitter>>, _node_name: String) {}
}

struct UppercaseTool;

#[async_trait]
impl Tool for UppercaseTool {
    async fn call(&self, name: &str, arguments: Value) -> Result<Value, ChatModelError> {
        if name != "uppercase" {
            return Err(ChatModelError::ToolFailed {
                name: name.to_string(),
                message: "unknown tool".to_string(),
            });
        }
        let text = arguments
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(Value::String(text.to_uppercase()))
    }

    fn to_schema(&self) -> ToolSchema {
        ToolSchema {
            name: "uppercase".to_string(),
            description: "Uppercases the given text".to_string(),
            parameters: json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"],
            }),
        }
    }
}

async fn run_demo() -> Result<()> {
    info!("=== LLM Chat + Tool Node Demo ===\n");

    let app = GraphBuilder::new()
        .add_node(NodeKind::Custom("chat".into()), ChatNode::new(Arc::new(EchoClient)))
        .add_node(
            NodeKind::Custom("uppercase".into()),
            ToolNode::new(Arc::new(UppercaseTool)),
        )
        .add_edge(NodeKind::Start, NodeKind::Custom("chat".into()))
        .add_edge(NodeKind::Custom("chat".into()), NodeKind::End)
        .compile()?;

    let initial = VersionedState::new_with_user_message("hello from the demo");
    let final_state = app.invoke(initial).await?;

    info!(
        "chat node response: {}",
        final_state.messages.snapshot().last().unwrap().content
    );

    // Run the tool node standalone against a hand-built state to show how a
    // `ChatNode` tool-call result (the "tool_calls" extra key) would be
    // dispatched by a downstream `ToolNode` in a larger graph.
    let tool_app = GraphBuilder::new()
        .add_node(
            NodeKind::Custom("uppercase".into()),
            ToolNode::new(Arc::new(UppercaseTool)),
        )
        .add_edge(NodeKind::Start, NodeKind::Custom("uppercase".into()))
        .add_edge(NodeKind::Custom("uppercase".into()), NodeKind::End)
        .compile()?;

    let mut tool_input = VersionedState::new();
    tool_input.add_extra(
        "tool_call",
        json!({"name": "uppercase", "arguments": {"text": "weavegraph"}}),
    );
    let tool_state = tool_app.invoke(tool_input).await?;
    info!(
        "tool node result: {:?}",
        tool_state.extra.snapshot().get("tool_result")
    );

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("error,weavegraph=info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_span_events(FmtSpan::CLOSE))
        .with(ErrorLayer::default())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    miette::set_panic_hook();
    run_demo().await
}
