//! State management for the Weavegraph workflow framework.
//!
//! State is split into three versioned channels — messages, extras, and
//! errors — each tracking its own version number, bumped whenever a
//! barrier merge actually touches it. See [`crate::channels`] for the
//! channel abstraction itself and [`crate::reducers`] for how updates
//! get merged in.
//!
//! # Core Types
//!
//! - [`VersionedState`]: the authoritative, mutable state container
//! - [`StateSnapshot`]: an immutable point-in-time view handed to nodes
//!
//! # Examples
//!
//! ```rust
//! use weavegraph::state::VersionedState;
//! use serde_json::json;
//!
//! let mut state = VersionedState::new_with_user_message("Hello, world!");
//! state.add_extra("user_id", json!("user123"));
//!
//! let snapshot = state.snapshot();
//! assert_eq!(snapshot.messages.len(), 1);
//! assert_eq!(snapshot.extra.get("user_id"), Some(&json!("user123")));
//! ```

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::channels::{Channel, ErrorsChannel, ExtrasChannel, MessagesChannel, errors::ErrorEvent};
use crate::message::Message;

/// The versioned, channel-based state container carried through a run.
///
/// Each channel's version increments only when a barrier merge actually
/// touches it — never on every step — so nodes can cheaply detect "did
/// this change since I last looked" via [`StateSnapshot`]'s version
/// fields.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct VersionedState {
    pub messages: MessagesChannel,
    pub extra: ExtrasChannel,
    pub errors: ErrorsChannel,
}

impl VersionedState {
    /// An empty state with every channel starting at version 1.
    pub fn new() -> Self {
        Self {
            messages: MessagesChannel::new(Vec::new(), 1),
            extra: ExtrasChannel::new(FxHashMap::default(), 1),
            errors: ErrorsChannel::new(Vec::new(), 1),
        }
    }

    /// Creates state seeded with a single user message.
    ///
    /// ```rust
    /// use weavegraph::state::VersionedState;
    ///
    /// let state = VersionedState::new_with_user_message("Analyze this data");
    /// let snapshot = state.snapshot();
    /// assert_eq!(snapshot.messages[0].content, "Analyze this data");
    /// assert_eq!(snapshot.messages_version, 1);
    /// ```
    pub fn new_with_user_message(user_text: &str) -> Self {
        Self::new_with_messages(vec![Message::user(user_text)])
    }

    /// Creates state seeded with an existing message history.
    pub fn new_with_messages(messages: Vec<Message>) -> Self {
        let mut state = Self::new();
        state.messages = MessagesChannel::new(messages, 1);
        state
    }

    /// Creates a fluent builder for constructing `VersionedState`.
    pub fn builder() -> StateBuilder {
        StateBuilder::default()
    }

    /// Appends a message without a reducer round trip. Version
    /// bookkeeping is left untouched; only the barrier merge bumps
    /// versions.
    #[must_use = "consider using the returned self for method chaining"]
    pub fn add_message(&mut self, role: &str, content: &str) -> &mut Self {
        self.messages.get_mut().push(Message::new(role, content));
        self
    }

    /// Inserts a value under an arbitrary extras key.
    #[must_use = "consider using the returned self for method chaining"]
    pub fn add_extra(&mut self, key: &str, value: Value) -> &mut Self {
        self.extra.get_mut().insert(key.to_string(), value);
        self
    }

    /// Produces an immutable, independently-owned snapshot of the
    /// current state. Snapshots are what nodes actually receive as
    /// input.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            messages: self.messages.snapshot(),
            messages_version: self.messages.version(),
            extra: self.extra.snapshot(),
            extra_version: self.extra.version(),
            errors: self.errors.snapshot(),
            errors_version: self.errors.version(),
        }
    }

    /// Rebuilds a `VersionedState` from a previously taken snapshot. Used
    /// when restoring from a checkpoint.
    pub fn from_snapshot(snapshot: StateSnapshot) -> Self {
        Self {
            messages: MessagesChannel::new(snapshot.messages, snapshot.messages_version),
            extra: ExtrasChannel::new(snapshot.extra, snapshot.extra_version),
            errors: ErrorsChannel::new(snapshot.errors, snapshot.errors_version),
        }
    }
}

/// An immutable, point-in-time view of [`VersionedState`] passed to
/// nodes.
///
/// Snapshots are cheap to clone further (they're plain owned
/// collections) and are never mutated by the runner once handed to a
/// node — a node that wants to change state returns a [`crate::node::NodePartial`]
/// instead.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StateSnapshot {
    pub messages: Vec<Message>,
    pub messages_version: u32,
    pub extra: FxHashMap<String, Value>,
    pub extra_version: u32,
    pub errors: Vec<ErrorEvent>,
    pub errors_version: u32,
}

/// Fluent builder for constructing an initial [`VersionedState`].
///
/// Particularly useful for tests or when seeding a run with a known set
/// of messages and extras.
///
/// ```rust
/// use weavegraph::state::VersionedState;
/// use serde_json::json;
///
/// let state = VersionedState::builder()
///     .with_user_message("What's the weather like?")
///     .with_assistant_message("I'll help you check the weather.")
///     .with_extra("location", json!("New York"))
///     .build();
///
/// let snapshot = state.snapshot();
/// assert_eq!(snapshot.messages.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct StateBuilder {
    messages: Vec<Message>,
    extra: FxHashMap<String, Value>,
}

impl StateBuilder {
    pub fn with_user_message(mut self, content: &str) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    pub fn with_assistant_message(mut self, content: &str) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }

    pub fn with_system_message(mut self, content: &str) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    pub fn with_message(mut self, role: &str, content: &str) -> Self {
        self.messages.push(Message::new(role, content));
        self
    }

    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Builds the final `VersionedState`. All three channels start at
    /// version 1.
    pub fn build(self) -> VersionedState {
        VersionedState {
            messages: MessagesChannel::new(self.messages, 1),
            extra: ExtrasChannel::new(self.extra, 1),
            errors: ErrorsChannel::new(Vec::new(), 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_with_user_message_seeds_one_message_at_version_one() {
        let state = VersionedState::new_with_user_message("hi");
        let snap = state.snapshot();
        assert_eq!(snap.messages.len(), 1);
        assert_eq!(snap.messages[0].role, "user");
        assert_eq!(snap.messages_version, 1);
    }

    #[test]
    fn snapshot_is_independent_of_later_mutation() {
        let mut state = VersionedState::new_with_user_message("hi");
        state.add_extra("status", json!("processing"));
        let snap = state.snapshot();

        state.add_extra("status", json!("complete"));

        assert_eq!(snap.extra.get("status"), Some(&json!("processing")));
        assert_eq!(state.extra.get().get("status"), Some(&json!("complete")));
    }

    #[test]
    fn builder_seeds_all_channels_at_version_one() {
        let state = VersionedState::builder()
            .with_user_message("hello")
            .with_extra("k", json!(1))
            .build();
        assert_eq!(state.messages.version(), 1);
        assert_eq!(state.extra.version(), 1);
        assert_eq!(state.errors.version(), 1);
    }

    #[test]
    fn from_snapshot_round_trips() {
        let state = VersionedState::builder().with_user_message("hi").build();
        let snap = state.snapshot();
        let rebuilt = VersionedState::from_snapshot(snap.clone());
        assert_eq!(rebuilt.snapshot(), snap);
    }
}
