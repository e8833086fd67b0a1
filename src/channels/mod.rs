//! Channel abstraction for versioned state storage.
//!
//! A channel pairs a single piece of collection state (messages, extras,
//! errors) with a version counter that the barrier merge step bumps
//! whenever a reducer actually touches it. [`VersionedState`](crate::state::VersionedState)
//! is just three of these glued together.

pub mod errors;

pub use errors::{ErrorEvent, ErrorScope, LadderError};

/// A single named slice of state, paired with a version counter.
///
/// Implementors own a plain collection (`Item`) and track how many times
/// it has been merged into. The version only advances on an actual
/// barrier merge, never on every step, so nodes can cheaply tell "did
/// this change since I last looked".
pub trait Channel: Clone {
    /// The underlying collection type this channel wraps.
    type Item: Clone;

    /// Current version of this channel.
    fn version(&self) -> u32;

    /// Overwrites the recorded version. Used by the barrier merge step
    /// after applying reducers.
    fn set_version(&mut self, version: u32);

    /// Shared reference to the underlying collection.
    fn get(&self) -> &Self::Item;

    /// Mutable reference to the underlying collection, for reducers.
    fn get_mut(&mut self) -> &mut Self::Item;

    /// An owned, independent copy of the underlying collection.
    fn snapshot(&self) -> Self::Item {
        self.get().clone()
    }
}

/// Channel carrying the conversation history.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessagesChannel {
    items: Vec<crate::message::Message>,
    version: u32,
}

impl MessagesChannel {
    pub fn new(items: Vec<crate::message::Message>, version: u32) -> Self {
        Self { items, version }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Channel for MessagesChannel {
    type Item = Vec<crate::message::Message>;

    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    fn get(&self) -> &Self::Item {
        &self.items
    }

    fn get_mut(&mut self) -> &mut Self::Item {
        &mut self.items
    }
}

/// Channel carrying arbitrary user-defined key/value extras.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtrasChannel {
    map: rustc_hash::FxHashMap<String, serde_json::Value>,
    version: u32,
}

impl ExtrasChannel {
    pub fn new(map: rustc_hash::FxHashMap<String, serde_json::Value>, version: u32) -> Self {
        Self { map, version }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Channel for ExtrasChannel {
    type Item = rustc_hash::FxHashMap<String, serde_json::Value>;

    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    fn get(&self) -> &Self::Item {
        &self.map
    }

    fn get_mut(&mut self) -> &mut Self::Item {
        &mut self.map
    }
}

/// Channel carrying accumulated error events.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErrorsChannel {
    items: Vec<ErrorEvent>,
    version: u32,
}

impl ErrorsChannel {
    pub fn new(items: Vec<ErrorEvent>, version: u32) -> Self {
        Self { items, version }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Channel for ErrorsChannel {
    type Item = Vec<ErrorEvent>;

    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    fn get(&self) -> &Self::Item {
        &self.items
    }

    fn get_mut(&mut self) -> &mut Self::Item {
        &mut self.items
    }
}
