//! Core identity types for the Weavegraph workflow framework.
//!
//! This module defines the fundamental types used throughout the system for
//! naming nodes in a workflow graph. These are the core domain concepts that
//! define what a workflow *is*, independent of how its state is shaped.
//!
//! For runtime execution types (session IDs, step numbers), see
//! [`crate::runtimes::types`].

use std::fmt;

/// Identifies a node within a workflow graph.
///
/// `Start` and `End` are synthetic, always-present markers: `Start` is the
/// single entry point every run begins at, `End` (referred to as `FINISH`
/// in routing rules) is the sentinel destination that terminates a run.
/// Neither is ever registered with a user-supplied [`Node`](crate::node::Node)
/// implementation; they exist purely to anchor graph topology.
///
/// # Examples
///
/// ```rust
/// use weavegraph::types::NodeKind;
///
/// let start = NodeKind::Start;
/// let custom = NodeKind::Custom("process_data".to_string());
/// let end = NodeKind::End;
///
/// let encoded = custom.encode();
/// assert_eq!(encoded, "Custom:process_data");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NodeKind {
    /// Synthetic entry point. Every run begins with a single frame at `Start`.
    Start,

    /// Synthetic terminal sentinel (the spec's `FINISH`). Routing a result to
    /// `End` ends the run; `End` is never itself dispatched as a frame.
    End,

    /// User-defined node identified by a unique, descriptive name.
    Custom(String),
}

impl NodeKind {
    /// Encode a `NodeKind` into its persisted string form.
    ///
    /// - `Start` -> `"Start"`
    /// - `End` -> `"End"`
    /// - `Custom("x")` -> `"Custom:x"`
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            NodeKind::Start => "Start".to_string(),
            NodeKind::End => "End".to_string(),
            NodeKind::Custom(s) => format!("Custom:{s}"),
        }
    }

    /// Decode a persisted string form back into a `NodeKind`.
    ///
    /// Unrecognized formats fall back to `Custom(s)` for forward compatibility.
    #[must_use]
    pub fn decode(s: &str) -> Self {
        if s == "Start" {
            NodeKind::Start
        } else if s == "End" {
            NodeKind::End
        } else if let Some(rest) = s.strip_prefix("Custom:") {
            NodeKind::Custom(rest.to_string())
        } else {
            NodeKind::Custom(s.to_string())
        }
    }

    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }

    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::End => write!(f, "End"),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}

impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        match s {
            "Start" => NodeKind::Start,
            "End" | "Finish" | "FINISH" => NodeKind::End,
            other => NodeKind::Custom(other.to_string()),
        }
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        NodeKind::from(s.as_str())
    }
}

/// Identifies which channel of [`crate::state::VersionedState`] a reducer
/// or registry entry applies to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChannelType {
    Message,
    Extra,
    Error,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message => write!(f, "message"),
            Self::Extra => write!(f, "extra"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        for kind in [
            NodeKind::Start,
            NodeKind::End,
            NodeKind::Custom("worker".into()),
        ] {
            assert_eq!(NodeKind::decode(&kind.encode()), kind);
        }
    }

    #[test]
    fn decode_unknown_falls_back_to_custom() {
        assert_eq!(
            NodeKind::decode("whatever"),
            NodeKind::Custom("whatever".into())
        );
    }

    #[test]
    fn from_str_recognizes_finish_alias() {
        assert_eq!(NodeKind::from("FINISH"), NodeKind::End);
    }
}
