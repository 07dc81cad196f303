//! Field descriptors: the parse, format and match behaviour of one named
//! attribute, collected into a [`FieldTable`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::compare::{
    match_bytes, match_date, match_duration, match_flag, match_int, match_score, match_string,
};
use crate::error::{NomiaError, Result};
use crate::record::NameHasher;
use crate::tags::match_tags;
use crate::value::{Value, ValueKind};

/// `(argument, stored value) -> matches?`
pub type MatchFn = Arc<dyn Fn(&str, &Value) -> Result<bool> + Send + Sync>;

#[derive(Clone)]
pub struct FieldDescriptor {
    name: String,
    kind: ValueKind,
    matcher: MatchFn,
}

impl FieldDescriptor {
    pub fn new(name: &str, kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            matcher: default_matcher(name, kind),
        }
    }
    pub fn with_matcher<F>(name: &str, kind: ValueKind, matcher: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            kind,
            matcher: Arc::new(matcher),
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn kind(&self) -> ValueKind {
        self.kind
    }
    pub fn matches(&self, arg: &str, value: &Value) -> Result<bool> {
        (self.matcher)(arg, value)
    }
    pub fn parse(&self, text: &str) -> Result<Value> {
        self.kind.parse(text)
    }
    pub fn format(&self, value: &Value) -> String {
        value.to_string()
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

fn default_matcher(name: &str, kind: ValueKind) -> MatchFn {
    let attribute = name.to_string();
    Arc::new(move |arg: &str, value: &Value| {
        match (kind, value) {
            (ValueKind::Int, Value::Int(i)) => match_int(arg, *i),
            (ValueKind::Score, Value::Score(s)) => match_score(arg, *s),
            (ValueKind::Date, Value::Date(d)) => match_date(arg, *d),
            (ValueKind::Duration, Value::Duration(seconds)) => match_duration(arg, *seconds),
            (ValueKind::Bytes, Value::Bytes(bytes)) => match_bytes(arg, *bytes),
            (ValueKind::Tags, Value::Tags(tags)) => Ok(match_tags(arg, tags)),
            (ValueKind::Text, Value::Text(text)) => Ok(match_string(arg, text)),
            (ValueKind::Flag, Value::Flag(flag)) => match_flag(arg, *flag),
            _ => Err(NomiaError::ValueMismatch {
                attribute: attribute.clone(),
                expected: kind.name(),
            }),
        }
    })
}

/// Lookup from attribute name to descriptor. Names are matched exactly.
#[derive(Debug, Clone, Default)]
pub struct FieldTable {
    fields: HashMap<String, FieldDescriptor, NameHasher>,
}

impl FieldTable {
    pub fn builder() -> FieldTableBuilder {
        FieldTableBuilder::default()
    }
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }
    pub fn descriptor(&self, name: &str) -> Result<&FieldDescriptor> {
        self.get(name)
            .ok_or_else(|| NomiaError::UnknownAttribute(name.to_string()))
    }
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
    /// Attribute names in alphabetical order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
    pub fn len(&self) -> usize {
        self.fields.len()
    }
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Registering a name twice keeps the last descriptor.
#[derive(Debug, Default)]
pub struct FieldTableBuilder {
    fields: HashMap<String, FieldDescriptor, NameHasher>,
}

impl FieldTableBuilder {
    pub fn field(self, name: &str, kind: ValueKind) -> Self {
        self.descriptor(FieldDescriptor::new(name, kind))
    }
    pub fn descriptor(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields.insert(descriptor.name.clone(), descriptor);
        self
    }
    pub fn build(self) -> FieldTable {
        FieldTable { fields: self.fields }
    }
}
