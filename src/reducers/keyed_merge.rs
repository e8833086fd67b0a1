use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

use super::Reducer;
use crate::{channels::Channel, node::NodePartial, state::VersionedState};

/// A per-key merge function: `(old, new) -> merged`. `old` is `None` when
/// the key is absent from the current state.
pub type KeyReducerFn = Arc<dyn Fn(Option<&Value>, &Value) -> Value + Send + Sync>;

/// Extra-channel reducer with a per-key override table.
///
/// Keys with a registered function merge through it; every other key falls
/// back to right-biased overwrite, the same behavior as [`super::MapMerge`].
/// This is how a graph registers an accumulator (e.g. numeric sum) for one
/// extras key while leaving the rest of the map merging as plain last-write-
/// wins.
#[derive(Clone, Default)]
pub struct KeyedMerge {
    reducers: FxHashMap<String, KeyReducerFn>,
}

impl KeyedMerge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom merge function for `key`.
    #[must_use]
    pub fn with_key(
        mut self,
        key: impl Into<String>,
        f: impl Fn(Option<&Value>, &Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.reducers.insert(key.into(), Arc::new(f));
        self
    }

    /// Register the `append-sequence` built-in for `key`.
    #[must_use]
    pub fn with_append_sequence(self, key: impl Into<String>) -> Self {
        self.with_key(key, append_sequence)
    }

    /// Register the `concat-text` built-in for `key`.
    #[must_use]
    pub fn with_concat_text(self, key: impl Into<String>) -> Self {
        self.with_key(key, concat_text)
    }

    /// Register a numeric-sum accumulator for `key`.
    #[must_use]
    pub fn with_sum(self, key: impl Into<String>) -> Self {
        self.with_key(key, add_numbers)
    }

    /// Register the `merge-map` built-in for `key`.
    #[must_use]
    pub fn with_merge_map(self, key: impl Into<String>) -> Self {
        self.with_key(key, merge_map)
    }
}

impl Reducer for KeyedMerge {
    fn apply(&self, state: &mut VersionedState, update: &NodePartial) {
        let Some(extras_update) = &update.extra else {
            return;
        };
        if extras_update.is_empty() {
            return;
        }
        let state_map = state.extra.get_mut();
        for (k, v) in extras_update.iter() {
            let merged = match self.reducers.get(k) {
                Some(f) => f(state_map.get(k), v),
                None => v.clone(),
            };
            state_map.insert(k.clone(), merged);
        }
    }
}

/// Built-in `append-sequence` reducer: `old` is coerced to a sequence
/// (scalars become a one-element array, `None`/`null` becomes empty), `new`
/// is coerced the same way, and the two sequences are concatenated in order.
#[must_use]
pub fn append_sequence(old: Option<&Value>, new: &Value) -> Value {
    let mut seq = coerce_sequence(old.cloned().unwrap_or(Value::Null));
    seq.extend(coerce_sequence(new.clone()));
    Value::Array(seq)
}

fn coerce_sequence(v: Value) -> Vec<Value> {
    match v {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        scalar => vec![scalar],
    }
}

/// Built-in `concat-text` reducer: string concatenation, treating `null`/
/// missing as empty on either side.
#[must_use]
pub fn concat_text(old: Option<&Value>, new: &Value) -> Value {
    let old_str = old.and_then(Value::as_str).unwrap_or("");
    let new_str = new.as_str().unwrap_or("");
    Value::String(format!("{old_str}{new_str}"))
}

/// Built-in `merge-map` reducer: shallow-merges two JSON objects, right-
/// biased on key conflict. `old` missing/non-object is treated as `{}`; a
/// non-object `new` simply replaces `old` wholesale (there is nothing to
/// shallow-merge into).
#[must_use]
pub fn merge_map(old: Option<&Value>, new: &Value) -> Value {
    let Value::Object(new_map) = new else {
        return new.clone();
    };
    let mut merged = match old {
        Some(Value::Object(old_map)) => old_map.clone(),
        _ => serde_json::Map::new(),
    };
    for (k, v) in new_map {
        merged.insert(k.clone(), v.clone());
    }
    Value::Object(merged)
}

/// Numeric-sum accumulator, used by map-reduce style fan-out/reduce graphs.
/// Non-numeric operands are treated as `0`.
#[must_use]
pub fn add_numbers(old: Option<&Value>, new: &Value) -> Value {
    let old_n = old.and_then(Value::as_f64).unwrap_or(0.0);
    let new_n = new.as_f64().unwrap_or(0.0);
    let sum = old_n + new_n;
    serde_json::Number::from_f64(sum)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
