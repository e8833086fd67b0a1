//! Helpers for building and combining the extras map used by
//! [`crate::state::VersionedState`]'s extra channel.

use rustc_hash::FxHashMap;
use serde_json::{Number, Value};

/// An empty extras map, ready for a fresh [`crate::state::VersionedState`].
pub fn new_extra_map() -> FxHashMap<String, Value> {
    FxHashMap::default()
}

/// Builds an extras map from an iterator of key/value pairs.
pub fn extra_map_from_pairs<S, I>(pairs: I) -> FxHashMap<String, Value>
where
    S: Into<String>,
    I: IntoIterator<Item = (S, Value)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Merges several extras maps left-to-right; later maps overwrite keys from
/// earlier ones.
pub fn merge_extra_maps<'a, I>(maps: I) -> FxHashMap<String, Value>
where
    I: IntoIterator<Item = &'a FxHashMap<String, Value>>,
{
    let mut merged = FxHashMap::default();
    for map in maps {
        for (k, v) in map {
            merged.insert(k.clone(), v.clone());
        }
    }
    merged
}

/// Typed convenience accessors for the extras map's otherwise-untyped
/// `serde_json::Value` entries.
pub trait ExtraMapExt {
    fn insert_string(&mut self, key: &str, value: impl Into<String>);
    fn insert_number(&mut self, key: &str, value: impl Into<Number>);
    fn insert_bool(&mut self, key: &str, value: bool);
    fn get_string(&self, key: &str) -> Option<&str>;
    fn get_number(&self, key: &str) -> Option<Number>;
    fn get_bool(&self, key: &str) -> Option<bool>;
}

impl ExtraMapExt for FxHashMap<String, Value> {
    fn insert_string(&mut self, key: &str, value: impl Into<String>) {
        self.insert(key.to_string(), Value::String(value.into()));
    }

    fn insert_number(&mut self, key: &str, value: impl Into<Number>) {
        self.insert(key.to_string(), Value::Number(value.into()));
    }

    fn insert_bool(&mut self, key: &str, value: bool) {
        self.insert(key.to_string(), Value::Bool(value));
    }

    fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn get_number(&self, key: &str) -> Option<Number> {
        match self.get(key) {
            Some(Value::Number(n)) => Some(n.clone()),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }
}
