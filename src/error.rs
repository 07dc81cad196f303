// Unified error type for the Nomia crate.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NomiaError {
    #[error("Invalid {kind}: {text:?}")]
    InvalidFormat { kind: &'static str, text: String },
    #[error("Value {value} out of range ({min}-{max})")]
    OutOfRange { value: i64, min: i64, max: i64 },
    #[error("Invalid argument: {0:?}")]
    InvalidArgument(String),
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),
    #[error("Invalid tag: {0:?}")]
    InvalidTag(String),
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),
    #[error("Attribute {attribute} does not hold a {expected} value")]
    ValueMismatch { attribute: String, expected: &'static str },
    #[error("Invalid completion pattern {name}: {message}")]
    InvalidPattern { name: String, message: String },
    #[error("Completion pattern {0} must have a suggestion source")]
    MissingSuggestionSource(String),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    #[error("Index out of range: {0}")]
    IndexOutOfRange(usize),
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Library lock poisoned: {0}")]
    Lock(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, NomiaError>;

// Helper conversions
impl From<config::ConfigError> for NomiaError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<serde_json::Error> for NomiaError {
    fn from(e: serde_json::Error) -> Self { Self::Io(e.to_string()) }
}
impl<T> From<std::sync::PoisonError<T>> for NomiaError {
    fn from(e: std::sync::PoisonError<T>) -> Self { Self::Lock(e.to_string()) }
}
impl From<std::io::Error> for NomiaError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}
