// used for hashmaps keyed by attribute names
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

use std::collections::HashMap;

use crate::value::{TagSet, Value};

pub type NameHasher = BuildHasherDefault<SeaHasher>;

/// The attribute the `#` shorthand in filters reads tags from.
pub const TAGS_FIELD: &str = "tags";

static NO_TAGS: TagSet = TagSet::new();

/// One entry of the library: attribute name to canonical value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: HashMap<String, Value, NameHasher>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with(mut self, attribute: &str, value: Value) -> Self {
        self.values.insert(attribute.to_string(), value);
        self
    }
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }
    /// Replaces the value, returning the previous one.
    pub fn set(&mut self, attribute: &str, value: Value) -> Option<Value> {
        self.values.insert(attribute.to_string(), value)
    }
    pub fn remove(&mut self, attribute: &str) -> Option<Value> {
        self.values.remove(attribute)
    }
    pub fn tags(&self) -> &TagSet {
        self.values
            .get(TAGS_FIELD)
            .and_then(Value::as_tags)
            .unwrap_or(&NO_TAGS)
    }
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
