//! Routing filter chunks to the match function of their attribute.
//!
//! A chunk is either `#<tag pattern>` or `<attribute>:<argument>`, optionally
//! preceded by `-` to negate it.

use regex::Regex;
use lazy_static::lazy_static;

use crate::error::{NomiaError, Result};
use crate::expr::Expr;
use crate::field::FieldTable;
use crate::record::Record;
use crate::tags::match_tags;

pub const TAG_SHORTHAND: char = '#';

lazy_static! {
    static ref ATTRIBUTE_CHUNK: Regex = Regex::new(r"(?s)^(.+?):(.*)$").unwrap();
}

/// Whether `record` passes the filter expression.
pub fn run_filter(expr: &Expr, record: &Record, fields: &FieldTable) -> Result<bool> {
    expr.evaluate(&mut |chunk: &str| match_positive_chunk(chunk, record, fields))
}

/// Matches a single written chunk, honouring a leading `-`.
pub fn match_chunk(chunk: &str, record: &Record, fields: &FieldTable) -> Result<bool> {
    let chunk = chunk.trim();
    match chunk.strip_prefix('-') {
        Some(rest) => Ok(!match_positive_chunk(rest, record, fields)?),
        None => match_positive_chunk(chunk, record, fields),
    }
}

fn match_positive_chunk(chunk: &str, record: &Record, fields: &FieldTable) -> Result<bool> {
    let chunk = chunk.trim();
    if let Some(pattern) = chunk.strip_prefix(TAG_SHORTHAND) {
        return Ok(match_tags(pattern, record.tags()));
    }
    let captures = ATTRIBUTE_CHUNK
        .captures(chunk)
        .ok_or_else(|| NomiaError::InvalidExpression(format!("Invalid filter chunk: {}", chunk)))?;
    let attribute = captures[1].trim();
    let arg = captures[2].trim();
    let descriptor = fields.descriptor(attribute)?;
    match record.get(attribute) {
        Some(value) => descriptor.matches(arg, value),
        None => descriptor.matches(arg, &descriptor.kind().default_value()),
    }
}
