use thiserror::Error;

/// Errors raised by misuse of the aggregation API.
///
/// Running out of legal placements is not an error; growth calls report it
/// through [`crate::AggregateReport`] instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    #[error("unknown part name: {name}")]
    UnknownPart { name: String },

    #[error("connection {index} out of range (part {part} has {count} connections)")]
    ConnectionOutOfRange {
        part: String,
        index: usize,
        count: usize,
    },

    #[error("malformed rule text: {0}")]
    Rule(#[from] RuleParseError),

    #[error("field-driven growth requires a field")]
    MissingField,

    #[error("no field named {name}")]
    UnknownField { name: String },

    #[error("field {name} expects {expected} values, got {found}")]
    FieldShape {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("the part palette is empty")]
    EmptyPalette,

    #[error("part records are not densely numbered: expected id {expected}, found {found}")]
    NonDenseIds { expected: usize, found: usize },
}

/// Failure to parse the compact rule or sequence-step text encodings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleParseError {
    #[error("text not formatted correctly: {text:?}")]
    Malformed { text: String },

    #[error("invalid connection id {value:?} in {text:?}")]
    InvalidConnection { text: String, value: String },
}
