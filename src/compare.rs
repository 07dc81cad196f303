//! Relational comparisons between a typed-in argument and a stored value.
//!
//! An argument is an optional operator (`<`, `>`, `<=`, `>=`, `=`) followed
//! by an operand in the notation of the attribute's value kind. A missing
//! operator means equality.

// used for dates
use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use lazy_static::lazy_static;

use std::fmt;

use crate::error::{NomiaError, Result};
use crate::value::{parse_bytes, parse_date_on, parse_duration, parse_int};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

lazy_static! {
    static ref YEAR: Regex = Regex::new(r"^(\d{2}|\d{4})$").unwrap();
    static ref MONTH_YEAR: Regex = Regex::new(r"(?i)^([a-z]+)\s*(\d{4})$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
}

impl Operator {
    pub fn apply<T: PartialOrd + ?Sized>(&self, left: &T, right: &T) -> bool {
        match self {
            Operator::Lt => left < right,
            Operator::Gt => left > right,
            Operator::Le => left <= right,
            Operator::Ge => left >= right,
            Operator::Eq => left == right,
        }
    }
    /// Splits the leading operator off `text`, longest token first.
    fn split(text: &str) -> (Operator, &str) {
        for (token, operator) in [
            ("<=", Operator::Le),
            (">=", Operator::Ge),
            ("<", Operator::Lt),
            (">", Operator::Gt),
            ("=", Operator::Eq),
        ] {
            if let Some(rest) = text.strip_prefix(token) {
                return (operator, rest);
            }
        }
        (Operator::Eq, text)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let token = match self {
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Le => "<=",
            Operator::Ge => ">=",
            Operator::Eq => "=",
        };
        write!(f, "{}", token)
    }
}

/// An operator together with its parsed operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison<T> {
    pub operator: Operator,
    pub operand: T,
}

impl<T: PartialOrd> Comparison<T> {
    /// Whether `data <operator> operand` holds.
    pub fn matches(&self, data: &T) -> bool {
        self.operator.apply(data, &self.operand)
    }
}

/// Splits `arg` into operator and operand text. All spaces are removed first.
pub fn split_comparison(arg: &str) -> Result<(Operator, String)> {
    let compact: String = arg.chars().filter(|c| *c != ' ').collect();
    let (operator, rest) = Operator::split(&compact);
    if rest.is_empty() {
        return Err(NomiaError::InvalidArgument(arg.to_string()));
    }
    Ok((operator, rest.to_string()))
}

/// Like [`split_comparison`], but inner spaces survive so that operands such
/// as `mar 2014` stay readable.
pub fn split_date_comparison(arg: &str) -> Result<(Operator, String)> {
    let (operator, rest) = Operator::split(arg.trim());
    let rest = rest.trim();
    if rest.is_empty() {
        return Err(NomiaError::InvalidArgument(arg.to_string()));
    }
    Ok((operator, rest.to_string()))
}

pub fn parse_comparison<T, F>(arg: &str, parse: F) -> Result<Comparison<T>>
where
    F: Fn(&str) -> Result<T>,
{
    let (operator, operand) = split_comparison(arg)?;
    Ok(Comparison { operator, operand: parse(&operand)? })
}

pub fn match_int(arg: &str, data: i64) -> Result<bool> {
    Ok(parse_comparison(arg, parse_int)?.matches(&data))
}

/// An empty argument selects the unscored entries only; any other
/// comparison never selects them.
pub fn match_score(arg: &str, data: u8) -> Result<bool> {
    if arg.trim().is_empty() {
        return Ok(data == 0);
    }
    let comparison = parse_comparison(arg, parse_int)?;
    Ok(data != 0 && comparison.matches(&(data as i64)))
}

pub fn match_duration(arg: &str, data: u64) -> Result<bool> {
    Ok(parse_comparison(arg, parse_duration)?.matches(&data))
}

pub fn match_bytes(arg: &str, data: u64) -> Result<bool> {
    Ok(parse_comparison(arg, parse_bytes)?.matches(&data))
}

/// Case-insensitive containment.
pub fn match_string(arg: &str, data: &str) -> bool {
    data.to_lowercase().contains(&arg.to_lowercase())
}

/// Flags take no argument; the attribute name alone selects set flags.
pub fn match_flag(arg: &str, data: bool) -> Result<bool> {
    if !arg.trim().is_empty() {
        return Err(NomiaError::InvalidFormat { kind: "flag match", text: arg.to_string() });
    }
    Ok(data)
}

/// The precision a date operand was given with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateQuery {
    Year(i32),
    /// Year and month (1-12).
    YearMonth(i32, u32),
    Day(NaiveDate),
}

impl DateQuery {
    /// Parses `98`, `1998`, `mar 2014`, `2014-03-21` or `today`.
    pub fn parse(text: &str, today: NaiveDate) -> Result<DateQuery> {
        if let Some(captures) = YEAR.captures(text) {
            let digits = &captures[1];
            let year: i32 = digits
                .parse()
                .map_err(|_| NomiaError::InvalidFormat { kind: "year", text: text.to_string() })?;
            if digits.len() == 2 {
                return Ok(DateQuery::Year(nearest_century(year, today.year())));
            }
            return Ok(DateQuery::Year(year));
        }
        if let Some(captures) = MONTH_YEAR.captures(text) {
            let month = month_number(&captures[1]).ok_or_else(|| NomiaError::InvalidFormat {
                kind: "month",
                text: captures[1].to_string(),
            })?;
            let year: i32 = captures[2]
                .parse()
                .map_err(|_| NomiaError::InvalidFormat { kind: "year", text: text.to_string() })?;
            return Ok(DateQuery::YearMonth(year, month));
        }
        match parse_date_on(text, today)? {
            Some(date) => Ok(DateQuery::Day(date)),
            None => Err(NomiaError::InvalidArgument(text.to_string())),
        }
    }
    /// Compares `date` against this query at the query's own precision.
    pub fn compare(&self, operator: Operator, date: NaiveDate) -> bool {
        match *self {
            DateQuery::Year(year) => operator.apply(&date.year(), &year),
            DateQuery::YearMonth(year, month) => {
                let key = date.year() * 12 + date.month() as i32;
                operator.apply(&key, &(year * 12 + month as i32))
            }
            DateQuery::Day(day) => operator.apply(&date, &day),
        }
    }
}

/// Picks 19xx or 20xx, whichever is closer to `current_year`. Ties go to 19xx.
fn nearest_century(two_digits: i32, current_year: i32) -> i32 {
    let older = 1900 + two_digits;
    let newer = 2000 + two_digits;
    if (newer - current_year).abs() < (older - current_year).abs() {
        newer
    } else {
        older
    }
}

fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    MONTHS
        .iter()
        .position(|abbreviation| name.starts_with(abbreviation))
        .map(|i| i as u32 + 1)
}

pub fn match_date(arg: &str, data: Option<NaiveDate>) -> Result<bool> {
    match_date_on(arg, data, Local::now().date_naive())
}

/// Same as [`match_date`] with an explicit value for `today`. An entry
/// without a date never matches.
pub fn match_date_on(arg: &str, data: Option<NaiveDate>, today: NaiveDate) -> Result<bool> {
    let (operator, operand) = split_date_comparison(arg)?;
    let query = DateQuery::parse(&operand, today)?;
    Ok(match data {
        Some(date) => query.compare(operator, date),
        None => false,
    })
}
