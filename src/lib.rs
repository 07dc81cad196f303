//! Nomia – a typed filter language and inline autocompletion for a personal
//! media library.
//!
//! Library entries are [`record::Record`]s: bags of named attributes holding
//! canonical [`value::Value`]s (integers, scores from 0 to 10, dates,
//! durations, byte sizes, tag sets, text and flags). Each attribute is
//! described by a [`field::FieldDescriptor`] that knows how to parse typed
//! text into its value, format it back and match it against a filter
//! argument.
//!
//! ## Modules
//! * [`value`] – Value kinds and their text codecs (`1h 30m`, `1.5kib`, `2019-04-01`, ...).
//! * [`compare`] – Comparison operators in filter arguments (`>8`, `<=1h`, `>=jan 2019`).
//! * [`tags`] – Wildcard tag patterns.
//! * [`expr`] – Boolean filter expressions compiled from text with a pest grammar
//!   (`filter.pest`): `,` is AND, `|` is OR, parentheses group, `-` negates and
//!   `@name` expands a filter macro.
//! * [`filter`] – Routing of filter chunks (`#tag` or `attribute: argument`) to
//!   the match function of their attribute.
//! * [`field`] – Field descriptors and the table mapping names to them.
//! * [`autocomplete`] – Cursor aware tab completion driven by regex patterns.
//! * [`library`] – The in-memory entry store with undo and suggestion ranking.
//! * [`command`] and [`terminal`] – The line oriented front end (`f`, `s`, `e`, ...).
//! * [`settings`] – Settings read through the `config` crate.
//!
//! ## Quick Start
//! ```
//! use nomia::{compile_filter, run_filter, FieldTable, Record, Value, ValueKind};
//! use std::collections::HashMap;
//!
//! let fields = FieldTable::builder()
//!     .field("title", ValueKind::Text)
//!     .field("tags", ValueKind::Tags)
//!     .build();
//! let record = Record::new()
//!     .with("title", Value::Text(String::from("Mushishi")))
//!     .with("tags", Value::Tags(["iyashikei".to_string()].into_iter().collect()));
//! let expr = compile_filter("title: mushi, #iya*", &HashMap::new()).unwrap();
//! assert!(run_filter(&expr, &record, &fields).unwrap());
//! ```

pub mod autocomplete;
pub mod command;
pub mod compare;
pub mod error;
pub mod expr;
pub mod field;
pub mod filter;
pub mod library;
pub mod record;
pub mod settings;
pub mod tags;
pub mod terminal;
pub mod value;

pub use autocomplete::{Autocompleter, CompletionPattern, Direction};
pub use error::{NomiaError, Result};
pub use expr::{compile_filter, Expr, Junction};
pub use field::{FieldDescriptor, FieldTable};
pub use filter::run_filter;
pub use library::{EntryId, Library};
pub use record::Record;
pub use settings::Settings;
pub use tags::match_tags;
pub use terminal::{Response, Terminal};
pub use value::{TagSet, Value, ValueKind};
