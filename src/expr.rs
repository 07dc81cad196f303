//! Boolean filter expressions.
//!
//! A filter such as `#fantasy, -#ecchi | score_overall: >8` is compiled into
//! an [`Expr`] tree whose leaves are chunk strings. What a leaf means is up
//! to the caller of [`Expr::evaluate`]: the tag evaluator treats leaves as
//! tag patterns, while [`crate::filter::run_filter`] dispatches them to the
//! attribute match functions.

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use std::collections::HashMap;
use std::convert::Infallible;

use crate::error::{NomiaError, Result};
use crate::tags::match_tags;
use crate::value::TagSet;

#[derive(Parser)]
#[grammar = "filter.pest"]
struct FilterParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Junction {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Leaf { pattern: String, negated: bool },
    Group { op: Junction, children: Vec<Expr> },
}

impl Expr {
    /// A leaf from its written form; a leading `-` negates it.
    pub fn leaf(raw: &str) -> Expr {
        let raw = raw.trim();
        match raw.strip_prefix('-') {
            Some(pattern) => Expr::Leaf { pattern: pattern.to_string(), negated: true },
            None => Expr::Leaf { pattern: raw.to_string(), negated: false },
        }
    }
    pub fn and(children: Vec<Expr>) -> Expr {
        Expr::Group { op: Junction::And, children }
    }
    pub fn or(children: Vec<Expr>) -> Expr {
        Expr::Group { op: Junction::Or, children }
    }

    /// The logical complement, pushed down to the leaves.
    pub fn negate(self) -> Expr {
        match self {
            Expr::Leaf { pattern, negated } => Expr::Leaf { pattern, negated: !negated },
            Expr::Group { op, children } => Expr::Group {
                op: match op {
                    Junction::And => Junction::Or,
                    Junction::Or => Junction::And,
                },
                children: children.into_iter().map(Expr::negate).collect(),
            },
        }
    }

    /// Evaluates the tree, calling `leaf` with the pattern of every leaf that
    /// is visited. AND stops at the first false child, OR at the first true
    /// one. An empty AND is true and an empty OR is false.
    pub fn evaluate<E, F>(&self, leaf: &mut F) -> std::result::Result<bool, E>
    where
        F: FnMut(&str) -> std::result::Result<bool, E>,
    {
        match self {
            Expr::Leaf { pattern, negated } => Ok(leaf(pattern)? != *negated),
            Expr::Group { op: Junction::And, children } => {
                for child in children {
                    if !child.evaluate(leaf)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Expr::Group { op: Junction::Or, children } => {
                for child in children {
                    if child.evaluate(leaf)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Evaluates the tree with every leaf read as a tag pattern.
    pub fn matches_tags(&self, tags: &TagSet) -> bool {
        match self.evaluate::<Infallible, _>(&mut |pattern: &str| Ok(match_tags(pattern, tags))) {
            Ok(matched) => matched,
            Err(never) => match never {},
        }
    }
}

/// Compiles filter text into an expression. `@name` is replaced by the
/// compiled text of the macro `name`.
pub fn compile_filter(text: &str, macros: &HashMap<String, String>) -> Result<Expr> {
    let mut expanding = Vec::new();
    compile_with(text, macros, &mut expanding)
}

fn compile_with(
    text: &str,
    macros: &HashMap<String, String>,
    expanding: &mut Vec<String>,
) -> Result<Expr> {
    let mut pairs = FilterParser::parse(Rule::filter, text)
        .map_err(|e| NomiaError::InvalidExpression(e.to_string()))?;
    let filter = pairs.next().ok_or_else(|| invalid("empty filter"))?;
    let disjunction = filter
        .into_inner()
        .find(|p| p.as_rule() == Rule::disjunction)
        .ok_or_else(|| invalid("empty filter"))?;
    build(disjunction, macros, expanding)
}

fn build(
    pair: Pair<Rule>,
    macros: &HashMap<String, String>,
    expanding: &mut Vec<String>,
) -> Result<Expr> {
    match pair.as_rule() {
        Rule::disjunction | Rule::conjunction => {
            let op = if pair.as_rule() == Rule::disjunction { Junction::Or } else { Junction::And };
            let mut children = pair
                .into_inner()
                .map(|p| build(p, macros, expanding))
                .collect::<Result<Vec<_>>>()?;
            if children.len() == 1 {
                return children.pop().ok_or_else(|| invalid("empty group"));
            }
            Ok(Expr::Group { op, children })
        }
        Rule::group => {
            let mut negated = false;
            let mut inner = None;
            for p in pair.into_inner() {
                match p.as_rule() {
                    Rule::negation => negated = true,
                    _ => inner = Some(build(p, macros, expanding)?),
                }
            }
            let inner = inner.ok_or_else(|| invalid("empty parentheses"))?;
            Ok(if negated { inner.negate() } else { inner })
        }
        Rule::macro_ref => {
            let mut negated = false;
            let mut name = "";
            for p in pair.into_inner() {
                match p.as_rule() {
                    Rule::negation => negated = true,
                    _ => name = p.as_str(),
                }
            }
            let body = macros
                .get(name)
                .ok_or_else(|| invalid(&format!("unknown macro @{}", name)))?;
            if expanding.iter().any(|n| n == name) {
                return Err(invalid(&format!("macro @{} refers to itself", name)));
            }
            expanding.push(name.to_string());
            let expanded = compile_with(body, macros, expanding);
            expanding.pop();
            let expanded = expanded?;
            Ok(if negated { expanded.negate() } else { expanded })
        }
        Rule::chunk => Ok(Expr::leaf(pair.as_str())),
        rule => Err(invalid(&format!("unexpected {:?}", rule))),
    }
}

fn invalid(message: &str) -> NomiaError {
    NomiaError::InvalidExpression(message.to_string())
}
