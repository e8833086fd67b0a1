//! Vendor-neutral chat-model and tool contracts.
//!
//! These traits are the crate's *external collaborator* boundary: the
//! runtime never parses a provider's wire format, never picks a vendor SDK,
//! and never owns API keys. Callers implement [`ChatModelClient`]/[`Tool`]
//! against whichever provider (OpenAI, Anthropic, a local llama.cpp server,
//! ...) they need, and bind the result to a node with [`ChatNode`]/
//! [`ToolNode`] or their own [`Node`](crate::node::Node) impl.

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::event_bus::EventEmitter;
use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;
use crate::utils::collections::new_extra_map;

/// A single tool invocation requested by a chat model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Result of [`ChatModelClient::call`]: plain text, or one or more tool
/// invocations the caller is expected to dispatch and feed back as messages.
#[derive(Clone, Debug)]
pub enum ChatCallResult {
    Text(String),
    ToolCalls(Vec<ToolCall>),
}

/// Provider-agnostic function/tool metadata: name, description, and a
/// JSON-Schema-shaped parameter object, independent of any one vendor's
/// function-calling wire format.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Errors surfaced by [`ChatModelClient`]/[`Tool`] implementations.
#[derive(Debug, Error, Diagnostic)]
pub enum ChatModelError {
    #[error("chat model provider error: {0}")]
    #[diagnostic(code(weavegraph::llm::provider))]
    Provider(String),

    #[error("tool {name} failed: {message}")]
    #[diagnostic(code(weavegraph::llm::tool_failed))]
    ToolFailed { name: String, message: String },
}

/// Chat-model client contract (external collaborator).
///
/// The runtime passes `messages` through untouched; implementations own the
/// conversion to and from their provider's wire format.
#[async_trait]
pub trait ChatModelClient: Send + Sync {
    /// Send `messages` (and, if the model supports it, `tools`) to the
    /// underlying provider and return either assistant text or the tool
    /// calls the model wants dispatched.
    async fn call(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<ToolSchema>>,
    ) -> Result<ChatCallResult, ChatModelError>;

    /// Returns a new client with `tools` bound for subsequent calls. Does
    /// not mutate `self` — clients are expected to be cheaply cloneable
    /// (an `Arc`-wrapped config struct, typically).
    fn bind_tools(&self, tools: Vec<ToolSchema>) -> Arc<dyn ChatModelClient>;

    /// Wires this client's internal telemetry (request/response logging,
    /// token usage, ...) to `observers`, tagging emitted events with
    /// `node_name`.
    fn set_observers(&self, observers: Vec<Arc<dyn EventEmitter>>, node_name: String);
}

/// Tool contract (external collaborator).
#[async_trait]
pub trait Tool: Send + Sync {
    /// Invoke the tool named `name` with `arguments` and return its result.
    async fn call(&self, name: &str, arguments: Value) -> Result<Value, ChatModelError>;

    /// Provider-agnostic schema describing this tool, for inclusion in a
    /// [`ChatModelClient::call`]'s `tools` argument.
    fn to_schema(&self) -> ToolSchema;
}

/// Convenience [`Node`] that delegates to a bound [`ChatModelClient`].
///
/// Sends the current message history to the client; a text response is
/// appended as an assistant [`Message`], tool calls are recorded under the
/// `"tool_calls"` key of the extra channel for a downstream [`ToolNode`] (or
/// custom node) to act on.
pub struct ChatNode {
    client: Arc<dyn ChatModelClient>,
    tools: Option<Vec<ToolSchema>>,
}

impl ChatNode {
    #[must_use]
    pub fn new(client: Arc<dyn ChatModelClient>) -> Self {
        Self { client, tools: None }
    }

    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolSchema>) -> Self {
        self.tools = Some(tools);
        self
    }
}

#[async_trait]
impl Node for ChatNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let result = self
            .client
            .call(snapshot.messages.clone(), self.tools.clone())
            .await
            .map_err(|e| NodeError::Provider {
                provider: "chat_model",
                message: e.to_string(),
            })?;

        match result {
            ChatCallResult::Text(text) => {
                Ok(NodePartial::new().with_messages(vec![Message::assistant(&text)]))
            }
            ChatCallResult::ToolCalls(calls) => {
                let mut extra = new_extra_map();
                extra.insert(
                    "tool_calls".to_string(),
                    serde_json::to_value(&calls).map_err(NodeError::Serde)?,
                );
                Ok(NodePartial::new().with_extra(extra))
            }
        }
    }
}

/// Convenience [`Node`] that delegates a single named tool call to a bound
/// [`Tool`], reading `{name, arguments}` from the `"tool_call"` key of the
/// state's extra channel and writing the result back under `"tool_result"`.
pub struct ToolNode {
    tool: Arc<dyn Tool>,
}

impl ToolNode {
    #[must_use]
    pub fn new(tool: Arc<dyn Tool>) -> Self {
        Self { tool }
    }
}

#[async_trait]
impl Node for ToolNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let call = snapshot
            .extra
            .get("tool_call")
            .ok_or(NodeError::MissingInput { what: "tool_call" })?;

        let name = call
            .get("name")
            .and_then(Value::as_str)
            .ok_or(NodeError::MissingInput { what: "tool_call.name" })?;
        let arguments = call.get("arguments").cloned().unwrap_or(Value::Null);

        let result = self
            .tool
            .call(name, arguments)
            .await
            .map_err(|e| NodeError::Provider {
                provider: "tool",
                message: e.to_string(),
            })?;

        let mut extra = new_extra_map();
        extra.insert("tool_result".to_string(), result);
        Ok(NodePartial::new().with_extra(extra))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::collections::new_extra_map as extra_map;

    struct EchoClient;

    #[async_trait]
    impl ChatModelClient for EchoClient {
        async fn call(
            &self,
            messages: Vec<Message>,
            _tools: Option<Vec<ToolSchema>>,
        ) -> Result<ChatCallResult, ChatModelError> {
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
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
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"],
                }),
            }
        }
    }

    fn ctx() -> NodeContext {
        use crate::event_bus::{EventBus, MemorySink};
        let bus = EventBus::with_sink(MemorySink::default());
        NodeContext {
            node_id: "test".to_string(),
            step: 0,
            event_emitter: bus.get_emitter(),
        }
    }

    #[tokio::test]
    async fn chat_node_appends_assistant_text() {
        let node = ChatNode::new(Arc::new(EchoClient));
        let snapshot = StateSnapshot {
            messages: vec![Message::user("hi")],
            messages_version: 1,
            extra: extra_map(),
            extra_version: 1,
            errors: vec![],
            errors_version: 1,
        };
        let partial = node.run(snapshot, ctx()).await.unwrap();
        let messages = partial.messages.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "echo: hi");
    }

    #[tokio::test]
    async fn tool_node_dispatches_named_tool() {
        let node = ToolNode::new(Arc::new(UppercaseTool));
        let mut extra = extra_map();
        extra.insert(
            "tool_call".to_string(),
            serde_json::json!({"name": "uppercase", "arguments": {"text": "hi"}}),
        );
        let snapshot = StateSnapshot {
            messages: vec![],
            messages_version: 1,
            extra,
            extra_version: 1,
            errors: vec![],
            errors_version: 1,
        };
        let partial = node.run(snapshot, ctx()).await.unwrap();
        let result = partial.extra.unwrap().get("tool_result").cloned().unwrap();
        assert_eq!(result, Value::String("HI".to_string()));
    }

    #[tokio::test]
    async fn tool_node_missing_call_is_missing_input() {
        let node = ToolNode::new(Arc::new(UppercaseTool));
        let snapshot = StateSnapshot {
            messages: vec![],
            messages_version: 1,
            extra: extra_map(),
            extra_version: 1,
            errors: vec![],
            errors_version: 1,
        };
        let err = node.run(snapshot, ctx()).await.unwrap_err();
        assert!(matches!(err, NodeError::MissingInput { what: "tool_call" }));
    }
}
