//! Property lookups over a node's raw property records.

use crate::document::PropertyEntry;
use crate::value::{self, SizedValue};
use serde_json::Value;
use std::collections::HashMap;

/// Name → `{type, value}` view over a node's ordered property list, built
/// once per node. A present key always wins over the caller's default, even
/// when its value is `0`, `false`, or `""`; the default is also used when a
/// present payload cannot be coerced to the requested shape.
#[derive(Debug, Default)]
pub struct PropertyBag {
    entries: HashMap<String, BagEntry>,
}

#[derive(Debug)]
struct BagEntry {
    kind: String,
    value: Value,
}

impl PropertyBag {
    pub fn from_entries(entries: &[PropertyEntry]) -> Self {
        let entries = entries
            .iter()
            .map(|e| {
                (
                    e.name.clone(),
                    BagEntry {
                        kind: e.kind.clone(),
                        value: e.value.clone(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The raw payload, if the key is present.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// The declared legacy type tag of a property, if present.
    pub fn kind_of(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.kind.as_str())
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.value(key).and_then(value::as_bool).unwrap_or(default)
    }

    pub fn f32_or(&self, key: &str, default: f32) -> f32 {
        self.value(key).and_then(value::as_f32).unwrap_or(default)
    }

    pub fn i64_or(&self, key: &str, default: i64) -> i64 {
        self.value(key).and_then(value::as_i64).unwrap_or(default)
    }

    pub fn str_or(&self, key: &str, default: &str) -> String {
        self.value(key)
            .and_then(value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    pub fn f32_pair_or(&self, key: &str, default: [f32; 2]) -> [f32; 2] {
        self.value(key)
            .and_then(value::as_f32_array::<2>)
            .unwrap_or(default)
    }

    pub fn bool_pair_or(&self, key: &str, default: [bool; 2]) -> [bool; 2] {
        self.value(key)
            .and_then(value::as_bool_array::<2>)
            .unwrap_or(default)
    }

    pub fn sized_or(&self, key: &str, default: SizedValue) -> SizedValue {
        self.value(key).and_then(value::as_sized).unwrap_or(default)
    }

    pub fn color3_or(&self, key: &str, default: [u8; 3]) -> [u8; 3] {
        self.value(key)
            .and_then(value::as_color3)
            .unwrap_or(default)
    }

    pub fn color_quad_pair_or(
        &self,
        key: &str,
        default: ([f32; 4], [f32; 4]),
    ) -> ([f32; 4], [f32; 4]) {
        self.value(key)
            .and_then(value::as_color_quad_pair)
            .unwrap_or(default)
    }

    /// A `[sheet, name]` sprite-frame reference, or `None` when absent/empty.
    pub fn frame_ref(&self, key: &str) -> Option<(String, String)> {
        self.value(key).and_then(value::as_frame_ref)
    }
}
