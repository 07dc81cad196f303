//! Canonical field values and the codecs converting them to and from the
//! text a user types into the terminal.
//!
//! Every parse function is pure. The reverse direction is the [`fmt::Display`]
//! implementation of [`Value`], whose output is always accepted again by
//! [`ValueKind::parse`] for the same kind.

// used for calendar dates
use chrono::{Local, NaiveDate};
// used when deserializing field kinds from the settings
use serde::Deserialize;
// used for regular expressions
use regex::Regex;
// so regular expressions are compiled once
use lazy_static::lazy_static;

// tags are kept sorted so that formatting is deterministic
use std::collections::BTreeSet;
// used to print out readable forms of a value
use std::fmt;

use crate::error::{NomiaError, Result};

pub type TagSet = BTreeSet<String>;

pub const SCORE_MIN: u8 = 0;
pub const SCORE_MAX: u8 = 10;
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Characters that may not appear inside a tag.
pub const TAG_ILLEGAL_CHARS: &[char] = &['(', ')', '|'];

lazy_static! {
    static ref DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    static ref DURATION: Regex =
        Regex::new(r"^(?:(?P<h>\d+)h)?(?:(?P<m>\d+)m(?:in)?)?(?:(?P<s>\d+)s)?$").unwrap();
    static ref BYTES: Regex =
        Regex::new(r"(?i)^(?P<int>\d+)(?:\.(?P<frac>\d+))? ?(?P<unit>[kmgt]?)(?P<suffix>ib|i|b)?$")
            .unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    Int(i64),
    /// Zero means unscored.
    Score(u8),
    Date(Option<NaiveDate>),
    /// Whole seconds.
    Duration(u64),
    Bytes(u64),
    Tags(TagSet),
    Text(String),
    Flag(bool),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Score(_) => ValueKind::Score,
            Value::Date(_) => ValueKind::Date,
            Value::Duration(_) => ValueKind::Duration,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Tags(_) => ValueKind::Tags,
            Value::Text(_) => ValueKind::Text,
            Value::Flag(_) => ValueKind::Flag,
        }
    }
    pub fn as_tags(&self) -> Option<&TagSet> {
        match self {
            Value::Tags(tags) => Some(tags),
            _ => None,
        }
    }
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Score(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", format_date(*d)),
            Value::Duration(seconds) => write!(f, "{}", format_duration(*seconds)),
            Value::Bytes(bytes) => write!(f, "{}", format_bytes(*bytes)),
            Value::Tags(tags) => write!(f, "{}", format_tags(tags)),
            Value::Text(text) => write!(f, "{}", text),
            Value::Flag(flag) => write!(f, "{}", format_flag(*flag)),
        }
    }
}

/// The kind of value an attribute holds. Kinds are named in lowercase in
/// the settings file, e.g. `episode_length = "duration"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Int,
    Score,
    Date,
    Duration,
    Bytes,
    Tags,
    Text,
    Flag,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Score => "score",
            ValueKind::Date => "date",
            ValueKind::Duration => "duration",
            ValueKind::Bytes => "bytes",
            ValueKind::Tags => "tags",
            ValueKind::Text => "text",
            ValueKind::Flag => "flag",
        }
    }
    pub fn parse(&self, text: &str) -> Result<Value> {
        Ok(match self {
            ValueKind::Int => Value::Int(parse_int(text)?),
            ValueKind::Score => Value::Score(parse_score(text)?),
            ValueKind::Date => Value::Date(parse_date(text)?),
            ValueKind::Duration => Value::Duration(parse_duration(text)?),
            ValueKind::Bytes => Value::Bytes(parse_bytes(text)?),
            ValueKind::Tags => Value::Tags(parse_tags(text)?),
            ValueKind::Text => Value::Text(parse_string(text)),
            ValueKind::Flag => Value::Flag(parse_flag(text)?),
        })
    }
    /// The value an entry is considered to hold when the attribute is missing.
    pub fn default_value(&self) -> Value {
        match self {
            ValueKind::Int => Value::Int(0),
            ValueKind::Score => Value::Score(0),
            ValueKind::Date => Value::Date(None),
            ValueKind::Duration => Value::Duration(0),
            ValueKind::Bytes => Value::Bytes(0),
            ValueKind::Tags => Value::Tags(TagSet::new()),
            ValueKind::Text => Value::Text(String::new()),
            ValueKind::Flag => Value::Flag(false),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn invalid(kind: &'static str, text: &str) -> NomiaError {
    NomiaError::InvalidFormat { kind, text: text.to_string() }
}

pub fn parse_int(text: &str) -> Result<i64> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("int", text));
    }
    text.parse::<i64>().map_err(|_| invalid("int", text))
}

pub fn parse_score(text: &str) -> Result<u8> {
    let score = parse_int(text).map_err(|_| invalid("score", text))?;
    if score > SCORE_MAX as i64 {
        return Err(NomiaError::OutOfRange {
            value: score,
            min: SCORE_MIN as i64,
            max: SCORE_MAX as i64,
        });
    }
    Ok(score as u8)
}

/// The empty string is the null date.
pub fn parse_date(text: &str) -> Result<Option<NaiveDate>> {
    parse_date_on(text, Local::now().date_naive())
}

/// Same as [`parse_date`] with an explicit value for `today`.
pub fn parse_date_on(text: &str, today: NaiveDate) -> Result<Option<NaiveDate>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if text.eq_ignore_ascii_case("today") {
        return Ok(Some(today));
    }
    if !DATE.is_match(text) {
        return Err(invalid("date", text));
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map(Some)
        .map_err(|_| invalid("date", text))
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format(DATE_FORMAT).to_string(),
        None => String::new(),
    }
}

/// Parses `[<N>h][<N>m|<N>min][<N>s]` into seconds. Whitespace and case are
/// ignored and the empty string is zero seconds.
pub fn parse_duration(text: &str) -> Result<u64> {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    let captures = DURATION
        .captures(&normalized)
        .ok_or_else(|| invalid("duration", text))?;
    let part = |name: &str, scale: u64| -> Result<u64> {
        match captures.name(name) {
            Some(m) => m
                .as_str()
                .parse::<u64>()
                .ok()
                .and_then(|n| n.checked_mul(scale))
                .ok_or_else(|| invalid("duration", text)),
            None => Ok(0),
        }
    };
    let (h, m, s) = (part("h", 3600)?, part("m", 60)?, part("s", 1)?);
    h.checked_add(m)
        .and_then(|hm| hm.checked_add(s))
        .ok_or_else(|| invalid("duration", text))
}

pub fn format_duration(seconds: u64) -> String {
    let parts = [
        (seconds / 3600, "h"),
        (seconds / 60 % 60, "m"),
        (seconds % 60, "s"),
    ];
    parts
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{}{}", n, unit))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a byte size such as `700`, `1.5kib`, `2 MB` or `4g`.
///
/// | suffix            | multiplier |
/// |-------------------|------------|
/// | none              | 1          |
/// | `k`, `ki`, `kib`  | 1024       |
/// | `kb`              | 1000       |
/// | `m`, `mi`, `mib`  | 1024²      |
/// | `mb`              | 1000²      |
///
/// and likewise for `g` and `t`. A bare `b` means bytes. The result is
/// truncated to whole bytes.
pub fn parse_bytes(text: &str) -> Result<u64> {
    let trimmed = text.trim();
    let captures = BYTES
        .captures(trimmed)
        .ok_or_else(|| invalid("byte size", text))?;
    let unit = captures
        .name("unit")
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default();
    let suffix = captures
        .name("suffix")
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default();
    let power = match unit.as_str() {
        "" => 0,
        "k" => 1,
        "m" => 2,
        "g" => 3,
        _ => 4,
    };
    if power == 0 && suffix.starts_with('i') {
        return Err(invalid("byte size", text));
    }
    let base: u128 = if suffix == "b" { 1000 } else { 1024 };
    let multiplier = base.pow(power);

    let int_part: u128 = captures["int"]
        .parse()
        .map_err(|_| invalid("byte size", text))?;
    let mut bytes = int_part
        .checked_mul(multiplier)
        .ok_or_else(|| invalid("byte size", text))?;
    if let Some(frac) = captures.name("frac") {
        // digits past the 18th cannot change a truncated result
        let digits = &frac.as_str()[..frac.as_str().len().min(18)];
        let numerator: u128 = digits.parse().map_err(|_| invalid("byte size", text))?;
        bytes = bytes
            .checked_add(numerator * multiplier / 10u128.pow(digits.len() as u32))
            .ok_or_else(|| invalid("byte size", text))?;
    }
    u64::try_from(bytes).map_err(|_| invalid("byte size", text))
}

pub fn format_bytes(bytes: u64) -> String {
    let mut scaled = bytes as f64;
    for unit in ["", "kib", "mib", "gib"] {
        if scaled < 1024.0 {
            return format!("{}{}", one_decimal(scaled), unit);
        }
        scaled /= 1024.0;
    }
    format!("{}tib", one_decimal(scaled))
}

fn one_decimal(n: f64) -> String {
    let printed = format!("{:.1}", n);
    match printed.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => printed,
    }
}

/// Splits on commas. Empty pieces are dropped.
pub fn parse_tags(text: &str) -> Result<TagSet> {
    let mut tags = TagSet::new();
    for tag in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if tag.contains(TAG_ILLEGAL_CHARS) {
            return Err(NomiaError::InvalidTag(tag.to_string()));
        }
        tags.insert(tag.to_string());
    }
    Ok(tags)
}

pub fn format_tags(tags: &TagSet) -> String {
    tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

pub fn parse_string(text: &str) -> String {
    text.to_string()
}

pub fn parse_flag(text: &str) -> Result<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(invalid("flag", text)),
    }
}

pub fn format_flag(flag: bool) -> String {
    let word = if flag { "yes" } else { "no" };
    word.to_string()
}
