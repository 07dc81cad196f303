//! Matching a single tag pattern against a tag set.

use regex::Regex;

use crate::value::TagSet;

pub const WILDCARD: char = '*';

/// Whether `pattern` holds for `tags`.
///
/// * an empty pattern matches only the empty tag set
/// * a plain pattern must be a member of the set
/// * a pattern containing `*` must match a whole tag, each `*` standing for
///   one or more arbitrary characters
pub fn match_tags(pattern: &str, tags: &TagSet) -> bool {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return tags.is_empty();
    }
    if !pattern.contains(WILDCARD) {
        return tags.contains(pattern);
    }
    match wildcard_regex(pattern) {
        Some(rx) => tags.iter().any(|tag| rx.is_match(tag)),
        None => false,
    }
}

fn wildcard_regex(pattern: &str) -> Option<Regex> {
    let body = pattern
        .split(WILDCARD)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".+");
    Regex::new(&format!("^{}$", body)).ok()
}
