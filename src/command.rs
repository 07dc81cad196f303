//! Parsing of terminal input lines.
//!
//! The first character selects the command, the rest is its argument:
//!
//! ```text
//! f <filter>            filter the entries, `f` shows the active filter, `f -` clears it
//! s [-]<attribute>      sort, `-` reverses
//! e<N> <attribute>      prompt the current value of entry N
//! e<N> <attribute>: x   set the value of entry N
//! eu                    undo the last edit
//! e* tags: old, new     replace a tag in every visible entry
//! e* #old, #new         same as above
//! <N>                   toggle the details of entry N
//! q                     quit
//! ```

use lazy_static::lazy_static;
use regex::Regex;

use std::str::FromStr;

use crate::error::{NomiaError, Result};

lazy_static! {
    static ref REPLACE_TAGS: Regex =
        Regex::new(r"^\*\s*tags:\s*([^,]*?)\s*,\s*([^,]*?)\s*$").unwrap();
    static ref REPLACE_TAG_SHORTHAND: Regex =
        Regex::new(r"^\*\s*(#[^,]+?)?\s*,\s*(#[^,]+?)?\s*$").unwrap();
    static ref EDIT: Regex =
        Regex::new(r"^(?P<index>\d+)\s*(?P<attribute>[^:]+)(?::(?P<data>.*))?$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `None` asks for the active filter.
    Filter(Option<String>),
    ClearFilter,
    Sort { attribute: String, reverse: bool },
    /// Without data the current value is prompted.
    Edit { index: usize, attribute: String, data: Option<String> },
    Undo,
    ReplaceTags { old: Option<String>, new: Option<String> },
    Toggle(usize),
    Quit,
}

impl FromStr for Command {
    type Err = NomiaError;

    fn from_str(line: &str) -> Result<Command> {
        let line = line.trim();
        if !line.is_empty() && line.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Command::Toggle(parse_index(line)?));
        }
        let mut chars = line.chars();
        let letter = chars
            .next()
            .ok_or_else(|| NomiaError::InvalidCommand(String::from("Empty command")))?;
        let arg = chars.as_str();
        match letter {
            'f' => parse_filter(arg),
            's' => parse_sort(arg),
            'e' => parse_edit(arg),
            'q' if arg.trim().is_empty() => Ok(Command::Quit),
            _ => Err(NomiaError::InvalidCommand(line.to_string())),
        }
    }
}

fn parse_filter(arg: &str) -> Result<Command> {
    match arg.trim() {
        "" => Ok(Command::Filter(None)),
        "-" => Ok(Command::ClearFilter),
        filter => Ok(Command::Filter(Some(filter.to_string()))),
    }
}

fn parse_sort(arg: &str) -> Result<Command> {
    let arg = arg.trim();
    let (reverse, attribute) = match arg.strip_prefix('-') {
        Some(rest) => (true, rest.trim()),
        None => (false, arg),
    };
    if attribute.is_empty() {
        return Err(NomiaError::InvalidCommand(String::from("Missing sort attribute")));
    }
    Ok(Command::Sort { attribute: attribute.to_string(), reverse })
}

fn parse_edit(arg: &str) -> Result<Command> {
    let arg = arg.trim();
    if arg == "u" {
        return Ok(Command::Undo);
    }
    if let Some(captures) = REPLACE_TAGS.captures(arg) {
        return Ok(Command::ReplaceTags {
            old: non_empty(&captures[1]),
            new: non_empty(&captures[2]),
        });
    }
    if let Some(captures) = REPLACE_TAG_SHORTHAND.captures(arg) {
        let tag = |i| {
            captures
                .get(i)
                .and_then(|m| non_empty(&m.as_str()[1..]))
        };
        return Ok(Command::ReplaceTags { old: tag(1), new: tag(2) });
    }
    let captures = EDIT
        .captures(arg)
        .ok_or_else(|| NomiaError::InvalidCommand(String::from("Invalid edit command")))?;
    Ok(Command::Edit {
        index: parse_index(&captures["index"])?,
        attribute: captures["attribute"].trim().to_string(),
        data: captures.name("data").and_then(|m| non_empty(m.as_str())),
    })
}

fn parse_index(digits: &str) -> Result<usize> {
    digits
        .parse()
        .map_err(|_| NomiaError::InvalidFormat { kind: "index", text: digits.to_string() })
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

