// used to layer a settings file and environment variables over the defaults
use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::debug;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::field::FieldTable;
use crate::value::ValueKind;

/// Runtime settings, read by [`Settings::load`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The JSON file holding the library entries.
    pub path: Option<PathBuf>,
    /// Never write changes back to `path`.
    pub dry_run: bool,
    pub filter_macros: HashMap<String, String>,
    pub autocompleted_attributes: Vec<String>,
    pub display_attribute: String,
    pub fields: BTreeMap<String, ValueKind>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            path: None,
            dry_run: false,
            filter_macros: HashMap::new(),
            autocompleted_attributes: ["rating", "status", "studio", "tags", "type"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            display_attribute: String::from("title"),
            fields: default_fields(),
        }
    }
}

impl Settings {
    /// Reads `<dir>/settings.*` if present, then `NOMIA_*` environment
    /// variables (`__` separates nested keys).
    pub fn load(dir: &Path) -> Result<Self> {
        let file = dir.join("settings");
        debug!(file = %file.display(), "loading settings");
        let settings = Config::builder()
            .add_source(File::with_name(&file.to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("NOMIA").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn field_table(&self) -> FieldTable {
        self.fields
            .iter()
            .fold(FieldTable::builder(), |builder, (name, kind)| builder.field(name, *kind))
            .build()
    }
}

fn default_fields() -> BTreeMap<String, ValueKind> {
    use ValueKind::*;
    [
        ("mal_id", Int),
        ("airing_started", Date),
        ("airing_finished", Date),
        ("watching_started", Date),
        ("watching_finished", Date),
        ("comment", Text),
        ("description", Text),
        ("rating", Text),
        ("status", Text),
        ("studio", Text),
        ("title", Text),
        ("type", Text),
        ("episode_length", Duration),
        ("episodes_progress", Int),
        ("episodes_total", Int),
        ("score_art", Score),
        ("score_characters", Score),
        ("score_enjoyment", Score),
        ("score_overall", Score),
        ("score_sound", Score),
        ("score_story", Score),
        ("space", Bytes),
        ("space_per_episode", Bytes),
        ("tags", Tags),
    ]
    .into_iter()
    .map(|(name, kind)| (name.to_string(), kind))
    .collect()
}
