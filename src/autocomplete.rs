//! Inline tab completion for the terminal input line.
//!
//! An [`Autocompleter`] holds an ordered list of [`CompletionPattern`]s and
//! one completion session. Each pattern describes where in the input its
//! suggestions apply:
//!
//! * `prefix` must match at the very start of the input and is never edited,
//! * the editable span starts at the end of the last `start` match before
//!   the cursor and stops at the first `end` match after it,
//! * the span may not contain any of the pattern's illegal characters.
//!
//! Repeated completion requests on the same span cycle through the
//! suggestions. The session has to be reset by the owner whenever the
//! cursor moves for any other reason than a completion.
//!
//! Cursor positions are counted in characters.

use regex::Regex;
use tracing::{debug, trace};

use std::fmt;
use std::sync::Arc;

use crate::error::{NomiaError, Result};

/// `(pattern name, text typed so far) -> ranked suggestions`
pub type SuggestionSource = Arc<dyn Fn(&str, &str) -> Vec<String> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

pub struct CompletionPattern {
    name: String,
    prefix: Regex,
    start: Regex,
    end: Regex,
    illegal_chars: Vec<char>,
    source: SuggestionSource,
}

impl CompletionPattern {
    pub fn builder(name: &str) -> PatternBuilder {
        PatternBuilder {
            name: name.to_string(),
            prefix: String::new(),
            start: String::from("^"),
            end: String::from("$"),
            illegal_chars: String::new(),
            source: None,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte range of the editable span, if the pattern applies at `cursor`.
    fn span(&self, text: &str, cursor: usize) -> Option<(usize, usize)> {
        let prefix_len = self.prefix.find(text)?.end();
        // nothing can be completed inside the prefix
        if cursor < prefix_len {
            return None;
        }
        let pos = cursor - prefix_len;
        let rest = &text[prefix_len..];
        let start = self
            .start
            .find_iter(rest)
            .filter(|m| m.end() <= pos)
            .last()?
            .end();
        let end = self.end.find_at(rest, pos)?.start();
        if self.illegal_chars.iter().any(|c| rest[start..end].contains(*c)) {
            return None;
        }
        Some((prefix_len + start, prefix_len + end))
    }
}

impl fmt::Debug for CompletionPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CompletionPattern")
            .field("name", &self.name)
            .field("prefix", &self.prefix.as_str())
            .field("start", &self.start.as_str())
            .field("end", &self.end.as_str())
            .field("illegal_chars", &self.illegal_chars)
            .finish()
    }
}

pub struct PatternBuilder {
    name: String,
    prefix: String,
    start: String,
    end: String,
    illegal_chars: String,
    source: Option<SuggestionSource>,
}

impl PatternBuilder {
    /// Matched at the start of the input and excluded from completion.
    pub fn prefix(mut self, regex: &str) -> Self {
        self.prefix = regex.to_string();
        self
    }
    pub fn start(mut self, regex: &str) -> Self {
        self.start = regex.to_string();
        self
    }
    pub fn end(mut self, regex: &str) -> Self {
        self.end = regex.to_string();
        self
    }
    pub fn illegal_chars(mut self, chars: &str) -> Self {
        self.illegal_chars = chars.to_string();
        self
    }
    pub fn source<F>(mut self, source: F) -> Self
    where
        F: Fn(&str, &str) -> Vec<String> + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }
    pub fn shared_source(mut self, source: SuggestionSource) -> Self {
        self.source = Some(source);
        self
    }
    pub fn build(self) -> Result<CompletionPattern> {
        let source = self
            .source
            .ok_or_else(|| NomiaError::MissingSuggestionSource(self.name.clone()))?;
        let compile = |regex: &str| {
            Regex::new(regex).map_err(|e| NomiaError::InvalidPattern {
                name: self.name.clone(),
                message: e.to_string(),
            })
        };
        Ok(CompletionPattern {
            prefix: compile(&format!("^(?:{})", self.prefix))?,
            start: compile(&self.start)?,
            end: compile(&self.end)?,
            illegal_chars: self.illegal_chars.chars().collect(),
            source,
            name: self.name.clone(),
        })
    }
}

#[derive(Debug)]
struct Session {
    suggestions: Vec<String>,
    index: usize,
    just_reset: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            suggestions: Vec::new(),
            index: 0,
            just_reset: true,
        }
    }
}

impl Session {
    fn next(&mut self, pattern: &CompletionPattern, typed: &str, direction: Direction) -> String {
        if self.suggestions.is_empty() {
            self.suggestions = (pattern.source)(pattern.name(), typed);
            trace!(pattern = pattern.name(), typed, count = self.suggestions.len(), "suggestions");
        }
        let count = self.suggestions.len();
        match count {
            0 => typed.to_string(),
            1 => {
                let only = self.suggestions.swap_remove(0);
                *self = Session::default();
                only
            }
            _ => {
                if self.just_reset {
                    self.index = match direction {
                        Direction::Forward => 0,
                        Direction::Backward => count - 1,
                    };
                    self.just_reset = false;
                } else {
                    self.index = match direction {
                        Direction::Forward => (self.index + 1) % count,
                        Direction::Backward => (self.index + count - 1) % count,
                    };
                }
                self.suggestions[self.index].clone()
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct Autocompleter {
    patterns: Vec<CompletionPattern>,
    session: Session,
}

impl Autocompleter {
    pub fn new() -> Self {
        Self::default()
    }
    /// Appends a pattern; earlier patterns take precedence.
    pub fn register(&mut self, pattern: CompletionPattern) {
        self.patterns.push(pattern);
    }
    pub fn patterns(&self) -> impl Iterator<Item = &CompletionPattern> {
        self.patterns.iter()
    }
    /// Forgets the current suggestions.
    pub fn reset(&mut self) {
        self.session = Session::default();
    }
    /// The suggestions being cycled through, empty when idle.
    pub fn suggestions(&self) -> &[String] {
        &self.session.suggestions
    }

    /// Completes the span around `cursor` with the first applicable pattern.
    /// Returns the new text and the cursor placed right after the inserted
    /// suggestion, or the input unchanged if no pattern applies.
    pub fn complete(&mut self, text: &str, cursor: usize, direction: Direction) -> (String, usize) {
        let cursor_byte = byte_offset(text, cursor);
        for pattern in &self.patterns {
            let Some((start, end)) = pattern.span(text, cursor_byte) else {
                continue;
            };
            debug!(pattern = pattern.name(), start, end, "completing");
            let replacement = self.session.next(pattern, &text[start..end], direction);
            let mut completed = String::with_capacity(text.len() + replacement.len());
            completed.push_str(&text[..start]);
            completed.push_str(&replacement);
            let new_cursor = completed.chars().count();
            completed.push_str(&text[end..]);
            return (completed, new_cursor);
        }
        (text.to_string(), cursor)
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(i, _)| i)
}
