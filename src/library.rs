//! In-memory store of library entries.
//!
//! Entries are kept by numeric id. Filtering yields the set of matching ids
//! as a roaring bitmap, edits go through [`Library::set_values`] so that
//! every batch can be undone.

// used for sets of entry ids
use roaring::RoaringTreemap;
use serde_json::{Map, Value as Json};
use tracing::debug;

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::{NomiaError, Result};
use crate::expr::Expr;
use crate::field::FieldTable;
use crate::filter::run_filter;
use crate::record::{NameHasher, Record, TAGS_FIELD};
use crate::value::{format_date, parse_tags, TagSet, Value, ValueKind, SCORE_MAX};

pub type EntryId = u64;

/// One attribute assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub id: EntryId,
    pub attribute: String,
    pub value: Value,
}

// previous value of an attribute, None if it was unset
#[derive(Debug)]
struct Restore {
    id: EntryId,
    attribute: String,
    previous: Option<Value>,
}

#[derive(Debug, Default)]
pub struct Library {
    entries: BTreeMap<EntryId, Record>,
    undo_stack: Vec<Vec<Restore>>,
    // entries differ from what was last loaded or saved
    unsaved: bool,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, id: EntryId, record: Record) -> Option<Record> {
        self.entries.insert(id, record)
    }
    pub fn get(&self, id: EntryId) -> Option<&Record> {
        self.entries.get(&id)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// Whether any edit is left that could be undone.
    pub fn has_changes(&self) -> bool {
        !self.undo_stack.is_empty()
    }
    /// Whether edits or undos happened since loading or the last save.
    pub fn is_unsaved(&self) -> bool {
        self.unsaved
    }
    pub fn ids(&self) -> RoaringTreemap {
        self.entries.keys().copied().collect()
    }

    /// Ids of the entries passing `expr`. The first failing entry aborts.
    pub fn filter(&self, expr: &Expr, fields: &FieldTable) -> Result<RoaringTreemap> {
        let mut matching = RoaringTreemap::new();
        for (id, record) in &self.entries {
            if run_filter(expr, record, fields)? {
                matching.insert(*id);
            }
        }
        debug!(matching = matching.len(), total = self.entries.len(), "filtered");
        Ok(matching)
    }

    /// Orders `ids` by the value of `attribute`, ties broken by id.
    pub fn sort(
        &self,
        ids: &RoaringTreemap,
        attribute: &str,
        reverse: bool,
        fields: &FieldTable,
    ) -> Result<Vec<EntryId>> {
        let kind = fields.descriptor(attribute)?.kind();
        let default = kind.default_value();
        let mut keyed: Vec<(&Value, EntryId)> = ids
            .iter()
            .filter_map(|id| {
                let record = self.entries.get(&id)?;
                Some((record.get(attribute).unwrap_or(&default), id))
            })
            .collect();
        keyed.sort();
        if reverse {
            keyed.reverse();
        }
        Ok(keyed.into_iter().map(|(_, id)| id).collect())
    }

    pub fn set_value(&mut self, id: EntryId, attribute: &str, value: Value) -> Result<()> {
        self.set_values(vec![Change { id, attribute: attribute.to_string(), value }])
    }

    /// Applies all changes as one undoable batch. Nothing is applied if any
    /// id is unknown.
    pub fn set_values(&mut self, changes: Vec<Change>) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        if let Some(missing) = changes.iter().find(|c| !self.entries.contains_key(&c.id)) {
            return Err(NomiaError::IndexOutOfRange(missing.id as usize));
        }
        let mut undo = Vec::with_capacity(changes.len());
        for change in changes {
            if let Some(record) = self.entries.get_mut(&change.id) {
                let previous = record.set(&change.attribute, change.value);
                undo.push(Restore {
                    id: change.id,
                    attribute: change.attribute,
                    previous,
                });
            }
        }
        self.undo_stack.push(undo);
        self.unsaved = true;
        Ok(())
    }

    /// Reverts the last batch of changes and returns the affected ids.
    pub fn undo(&mut self) -> Result<Vec<EntryId>> {
        let batch = self.undo_stack.pop().ok_or(NomiaError::NothingToUndo)?;
        let mut touched = Vec::with_capacity(batch.len());
        // reversed so that repeated edits of one attribute unwind correctly
        for restore in batch.into_iter().rev() {
            if let Some(record) = self.entries.get_mut(&restore.id) {
                match restore.previous {
                    Some(value) => record.set(&restore.attribute, value),
                    None => record.remove(&restore.attribute),
                };
                touched.push(restore.id);
            }
        }
        self.unsaved = true;
        debug!(entries = touched.len(), "undone");
        Ok(touched)
    }

    /// Replaces `old` by `new` in the tags of the given entries. Without
    /// `old` the tag is added to every entry, without `new` it is removed.
    pub fn replace_tags(
        &mut self,
        ids: &RoaringTreemap,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<Vec<EntryId>> {
        if old.is_none() && new.is_none() {
            return Err(NomiaError::InvalidArgument("No tags specified".to_string()));
        }
        if let Some(tag) = new {
            parse_tags(tag)?;
        }
        let mut changes = Vec::new();
        for id in ids.iter() {
            let Some(record) = self.entries.get(&id) else {
                continue;
            };
            let tags = record.tags();
            if let Some(old) = old {
                if !tags.contains(old) {
                    continue;
                }
            }
            let mut replaced: TagSet = tags.clone();
            if let Some(old) = old {
                replaced.remove(old);
            }
            if let Some(new) = new {
                replaced.insert(new.to_string());
            }
            changes.push(Change { id, attribute: TAGS_FIELD.to_string(), value: Value::Tags(replaced) });
        }
        let touched = changes.iter().map(|c| c.id).collect();
        self.set_values(changes)?;
        Ok(touched)
    }

    /// Values of `attribute` starting with `prefix`, most frequent first and
    /// alphabetical among equals. Tags are counted one by one.
    pub fn suggestions(&self, attribute: &str, prefix: &str) -> Vec<String> {
        let mut counts: HashMap<String, usize, NameHasher> = HashMap::default();
        let mut count = |text: String| {
            if !text.is_empty() && text.starts_with(prefix) {
                *counts.entry(text).or_insert(0) += 1;
            }
        };
        for record in self.entries.values() {
            match record.get(attribute) {
                Some(Value::Tags(tags)) => tags.iter().cloned().for_each(&mut count),
                Some(value) => count(value.to_string()),
                None => (),
            }
        }
        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|(a, n), (b, m)| (Reverse(n), a).cmp(&(Reverse(m), b)));
        ranked.into_iter().map(|(text, _)| text).collect()
    }

    /// Reads the `{"<id>": {"<attribute>": <value>, ...}, ...}` layout.
    /// Attributes missing from `fields` are skipped.
    pub fn from_json(text: &str, fields: &FieldTable) -> Result<Self> {
        let raw: Map<String, Json> = serde_json::from_str(text)?;
        let mut library = Library::new();
        for (key, entry) in raw {
            let id: EntryId = key.parse().map_err(|_| NomiaError::InvalidFormat {
                kind: "entry id",
                text: key.clone(),
            })?;
            let Json::Object(attributes) = entry else {
                return Err(NomiaError::InvalidFormat { kind: "entry", text: key });
            };
            let mut record = Record::new();
            for (attribute, json) in &attributes {
                match fields.get(attribute) {
                    Some(descriptor) => {
                        let value = value_from_json(attribute, descriptor.kind(), json)?;
                        record.set(attribute, value);
                    }
                    None => debug!(attribute = attribute.as_str(), entry = id, "skipping unknown attribute"),
                }
            }
            library.insert(id, record);
        }
        Ok(library)
    }

    pub fn to_json(&self) -> Result<String> {
        let mut out = Map::new();
        for (id, record) in &self.entries {
            let attributes: Map<String, Json> = record
                .attributes()
                .map(|(name, value)| (name.to_string(), value_to_json(value)))
                .collect();
            out.insert(id.to_string(), Json::Object(attributes));
        }
        Ok(serde_json::to_string_pretty(&Json::Object(out))?)
    }

    /// Writes the entries to `path` if anything changed since the last
    /// write. Returns whether the file was written.
    pub fn save(&mut self, path: &Path) -> Result<bool> {
        if !self.unsaved {
            return Ok(false);
        }
        fs::write(path, self.to_json()?)?;
        self.unsaved = false;
        debug!(path = %path.display(), "saved");
        Ok(true)
    }
}

fn value_from_json(attribute: &str, kind: ValueKind, json: &Json) -> Result<Value> {
    let mismatch = || NomiaError::ValueMismatch {
        attribute: attribute.to_string(),
        expected: kind.name(),
    };
    match (kind, json) {
        (_, Json::Null) => Ok(kind.default_value()),
        (ValueKind::Text, Json::Number(n)) => Ok(Value::Text(n.to_string())),
        (_, Json::String(s)) => kind.parse(s),
        (ValueKind::Int, Json::Number(n)) => n.as_i64().map(Value::Int).ok_or_else(mismatch),
        (ValueKind::Score, Json::Number(n)) => match n.as_u64() {
            Some(s) if s <= SCORE_MAX as u64 => Ok(Value::Score(s as u8)),
            Some(s) => Err(NomiaError::OutOfRange { value: s as i64, min: 0, max: SCORE_MAX as i64 }),
            None => Err(mismatch()),
        },
        (ValueKind::Duration, Json::Number(n)) => n.as_u64().map(Value::Duration).ok_or_else(mismatch),
        (ValueKind::Bytes, Json::Number(n)) => n.as_u64().map(Value::Bytes).ok_or_else(mismatch),
        (ValueKind::Flag, Json::Bool(b)) => Ok(Value::Flag(*b)),
        (ValueKind::Tags, Json::Array(items)) => {
            let mut tags = TagSet::new();
            for item in items {
                let tag = item.as_str().ok_or_else(mismatch)?;
                tags.extend(parse_tags(tag)?);
            }
            Ok(Value::Tags(tags))
        }
        _ => Err(mismatch()),
    }
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Int(i) => Json::from(*i),
        Value::Score(s) => Json::from(*s),
        Value::Date(None) => Json::Null,
        Value::Date(d) => Json::from(format_date(*d)),
        Value::Duration(seconds) => Json::from(*seconds),
        Value::Bytes(bytes) => Json::from(*bytes),
        Value::Tags(tags) => Json::from(tags.iter().cloned().collect::<Vec<_>>()),
        Value::Text(text) => Json::from(text.as_str()),
        Value::Flag(flag) => Json::from(*flag),
    }
}
