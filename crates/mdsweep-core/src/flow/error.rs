use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Label '{0}' is declared more than once")]
    DuplicateLabel(String),
    #[error("Operation '{0}' is declared more than once")]
    DuplicateOperation(String),
    #[error("Operation '{operation}' refers to unknown label '{label}'")]
    UnknownLabel { operation: String, label: String },
    #[error("Operation '{0}' declares no post-condition and could never complete")]
    MissingPostCondition(String),
    #[error("Operations form a dependency cycle: {}", .0.join(", "))]
    Cycle(Vec<String>),
    #[error("Unknown environment '{0}'")]
    UnknownEnvironment(String),
    #[error("Invalid hostname pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("Unknown template placeholder '{0}'")]
    UnknownPlaceholder(String),
    #[error("Unterminated template placeholder at byte {0}")]
    UnterminatedPlaceholder(usize),
}
