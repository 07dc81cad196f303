//! The command line front end over a [`Library`].
//!
//! A [`Terminal`] keeps the view state (active filter, sort order, expanded
//! entries), executes parsed [`Command`]s and owns the autocompleter of its
//! single input line.

use roaring::RoaringTreemap;
use tracing::debug;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::autocomplete::{Autocompleter, CompletionPattern, Direction, SuggestionSource};
use crate::command::Command;
use crate::error::{NomiaError, Result};
use crate::expr::compile_filter;
use crate::field::FieldTable;
use crate::library::{EntryId, Library};
use crate::record::TAGS_FIELD;
use crate::settings::Settings;

/// What the caller should show after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The visible entries or their values changed.
    Refreshed,
    /// Text to put back into the input line for further editing.
    Prompt(String),
    Toggled { id: EntryId, expanded: bool },
    Quit,
}

pub struct Terminal {
    library: Arc<Mutex<Library>>,
    fields: Arc<FieldTable>,
    macros: HashMap<String, String>,
    display_attribute: String,
    autocompleter: Autocompleter,
    current_filter: Option<String>,
    visible: RoaringTreemap,
    order: Vec<EntryId>,
    sort: Option<(String, bool)>,
    expanded: RoaringTreemap,
}

impl Terminal {
    pub fn new(library: Library, settings: &Settings) -> Result<Self> {
        let visible = library.ids();
        let library = Arc::new(Mutex::new(library));
        let fields = Arc::new(settings.field_table());
        let mut macro_names: Vec<String> = settings.filter_macros.keys().cloned().collect();
        macro_names.sort();
        let source = suggestion_source(library.clone(), fields.clone(), macro_names);
        let mut autocompleter = Autocompleter::new();
        for pattern in standard_patterns(&settings.autocompleted_attributes, &source)? {
            autocompleter.register(pattern);
        }
        let mut terminal = Self {
            library,
            fields,
            macros: settings.filter_macros.clone(),
            display_attribute: settings.display_attribute.clone(),
            autocompleter,
            current_filter: None,
            visible,
            order: Vec::new(),
            sort: None,
            expanded: RoaringTreemap::new(),
        };
        terminal.refresh_order()?;
        Ok(terminal)
    }

    pub fn library(&self) -> &Arc<Mutex<Library>> {
        &self.library
    }
    pub fn fields(&self) -> &FieldTable {
        &self.fields
    }
    pub fn current_filter(&self) -> Option<&str> {
        self.current_filter.as_deref()
    }
    /// Visible entry ids in display order.
    pub fn visible_entries(&self) -> &[EntryId] {
        &self.order
    }
    pub fn is_expanded(&self, id: EntryId) -> bool {
        self.expanded.contains(id)
    }
    pub fn entry_id(&self, index: usize) -> Result<EntryId> {
        self.order
            .get(index)
            .copied()
            .ok_or(NomiaError::IndexOutOfRange(index))
    }

    /// Parses and runs one submitted line. Errors leave the view unchanged.
    pub fn execute(&mut self, line: &str) -> Result<Response> {
        self.autocompleter.reset();
        let command: Command = line.parse()?;
        debug!(?command, "executing");
        match command {
            Command::Filter(None) => match &self.current_filter {
                Some(filter) => Ok(Response::Prompt(format!("f {}", filter))),
                None => Err(NomiaError::InvalidCommand(String::from("No active filter"))),
            },
            Command::Filter(Some(text)) => {
                let expr = compile_filter(&text, &self.macros)?;
                let visible = self.library.lock()?.filter(&expr, &self.fields)?;
                self.visible = visible;
                self.current_filter = Some(text);
                self.refresh_order()?;
                Ok(Response::Refreshed)
            }
            Command::ClearFilter => {
                self.visible = self.library.lock()?.ids();
                self.current_filter = None;
                self.refresh_order()?;
                Ok(Response::Refreshed)
            }
            Command::Sort { attribute, reverse } => {
                self.fields.descriptor(&attribute)?;
                self.sort = Some((attribute, reverse));
                self.refresh_order()?;
                Ok(Response::Refreshed)
            }
            Command::Edit { index, attribute, data } => self.edit(index, &attribute, data.as_deref()),
            Command::Undo => {
                self.library.lock()?.undo()?;
                self.refresh_order()?;
                Ok(Response::Refreshed)
            }
            Command::ReplaceTags { old, new } => {
                self.library
                    .lock()?
                    .replace_tags(&self.visible, old.as_deref(), new.as_deref())?;
                self.refresh_order()?;
                Ok(Response::Refreshed)
            }
            Command::Toggle(index) => {
                let id = self.entry_id(index)?;
                let expanded = !self.expanded.remove(id);
                if expanded {
                    self.expanded.insert(id);
                }
                Ok(Response::Toggled { id, expanded })
            }
            Command::Quit => Ok(Response::Quit),
        }
    }

    fn edit(&mut self, index: usize, attribute: &str, data: Option<&str>) -> Result<Response> {
        let id = self.entry_id(index)?;
        let descriptor = self.fields.descriptor(attribute)?;
        let Some(data) = data else {
            let library = self.library.lock()?;
            let current = library
                .get(id)
                .and_then(|record| record.get(attribute))
                .map(|value| descriptor.format(value))
                .unwrap_or_default();
            return Ok(Response::Prompt(format!("e{} {}: {}", index, attribute, current)));
        };
        let value = descriptor.parse(data)?;
        self.library.lock()?.set_value(id, attribute, value)?;
        self.refresh_order()?;
        Ok(Response::Refreshed)
    }

    pub fn autocomplete(&mut self, text: &str, cursor: usize, direction: Direction) -> (String, usize) {
        self.autocompleter.complete(text, cursor, direction)
    }

    /// Has to be called whenever the cursor moves other than by completion.
    pub fn reset_suggestions(&mut self) {
        self.autocompleter.reset();
    }

    /// One line per visible entry, followed by the other attributes of
    /// expanded entries.
    pub fn listing(&self) -> Result<Vec<String>> {
        let library = self.library.lock()?;
        let mut lines = Vec::with_capacity(self.order.len());
        for (index, id) in self.order.iter().enumerate() {
            let Some(record) = library.get(*id) else {
                continue;
            };
            let title = record
                .get(&self.display_attribute)
                .map(|value| value.to_string())
                .unwrap_or_default();
            lines.push(format!("{:>4}  {}", index, title));
            if self.expanded.contains(*id) {
                let mut attributes: Vec<_> = record
                    .attributes()
                    .filter(|(name, _)| *name != self.display_attribute)
                    .collect();
                attributes.sort_by_key(|(name, _)| *name);
                for (name, value) in attributes {
                    lines.push(format!("        {}: {}", name, value));
                }
            }
        }
        Ok(lines)
    }

    fn refresh_order(&mut self) -> Result<()> {
        self.order = match &self.sort {
            Some((attribute, reverse)) => {
                self.library
                    .lock()?
                    .sort(&self.visible, attribute, *reverse, &self.fields)?
            }
            None => self.visible.iter().collect(),
        };
        Ok(())
    }
}

fn suggestion_source(
    library: Arc<Mutex<Library>>,
    fields: Arc<FieldTable>,
    macro_names: Vec<String>,
) -> SuggestionSource {
    Arc::new(move |name: &str, typed: &str| match name {
        "filter:attrname" | "edit:attrname" | "sort" => {
            let matching: Vec<String> = fields
                .names()
                .into_iter()
                .filter(|attribute| attribute.starts_with(typed))
                .map(String::from)
                .collect();
            if matching.len() == 1 && name != "sort" {
                vec![format!("{}: ", matching[0])]
            } else {
                matching
            }
        }
        "replace:attrname" => {
            let attribute = format!("{}: ", TAGS_FIELD);
            if attribute.starts_with(typed) { vec![attribute] } else { Vec::new() }
        }
        "filter:macros" => macro_names
            .iter()
            .filter(|macro_name| macro_name.starts_with(typed))
            .cloned()
            .collect(),
        _ => match (name.splitn(3, ':').nth(2), library.lock()) {
            (Some(attribute), Ok(library)) => library.suggestions(attribute, typed),
            _ => Vec::new(),
        },
    })
}

/// Completion patterns for the filter, sort, edit and tag replacement
/// commands, in priority order.
pub fn standard_patterns(
    autocompleted: &[String],
    source: &SuggestionSource,
) -> Result<Vec<CompletionPattern>> {
    let pattern = |name: &str| CompletionPattern::builder(name).shared_source(source.clone());
    let mut patterns = vec![
        pattern("filter:macros")
            .prefix(r"f\s*")
            .start(r"(^|[(),|])\s*-?@")
            .end(r"$|[(),|]")
            .illegal_chars("()|,")
            .build()?,
        pattern("filter:attr:tags")
            .prefix(r"f\s*")
            .start(r"(^|[(),|])\s*-?#")
            .end(r"$|[(),|]")
            .illegal_chars("()|,")
            .build()?,
        pattern("filter:attrname")
            .prefix(r"f\s*")
            .start(r"(^|[(),|])\s*-?")
            .end(r"$|[:(),|]")
            .illegal_chars(":()|,")
            .build()?,
    ];
    for attribute in autocompleted {
        patterns.push(
            pattern(&format!("filter:attr:{}", attribute))
                .prefix(r"f\s*")
                .start(&format!(r"(^|[(),|])\s*-?{}:\s*", regex::escape(attribute)))
                .end(r"$|[(),|]")
                .illegal_chars("()|,")
                .build()?,
        );
    }
    patterns.push(pattern("sort").prefix(r"s\s*-?").build()?);
    patterns.push(
        pattern("edit:attrname")
            .prefix(r"e\d+\s*")
            .end(r"$|:")
            .illegal_chars(":")
            .build()?,
    );
    for attribute in autocompleted {
        let name = format!("edit:attr:{}", attribute);
        let escaped = regex::escape(attribute);
        let built = if attribute == TAGS_FIELD {
            pattern(&name)
                .prefix(r"e\d+\s*")
                .start(&format!(r"(^{}:|,)\s*", escaped))
                .end(r"$|,")
                .illegal_chars(",")
                .build()?
        } else {
            pattern(&name)
                .prefix(r"e\d+\s*")
                .start(&format!(r"^{}:\s*", escaped))
                .build()?
        };
        patterns.push(built);
    }
    patterns.push(
        pattern("replace:attr:tags")
            .prefix(r"e\*\s*")
            .start(r"(^|,)\s*#")
            .end(r"$|,")
            .build()?,
    );
    patterns.push(
        pattern("replace:attrname")
            .prefix(r"e\*\s*")
            .end(r"$|:")
            .illegal_chars(":")
            .build()?,
    );
    patterns.push(
        pattern("replace:attr:tags")
            .prefix(r"e\*\s*")
            .start(r"(^\s*tags:|,)\s*")
            .build()?,
    );
    Ok(patterns)
}
