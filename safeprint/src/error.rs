//! Error types.
//!
//! Rendering itself never fails. These errors surface only from strict
//! selector parsing and from validating declarative rule configuration.

use thiserror::Error;

/// A selector that does not follow the path grammar.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("selector is empty")]
    Empty,

    #[error("unexpected character `{found}` at offset {offset} in selector `{selector}`")]
    UnexpectedChar {
        selector: String,
        found: char,
        offset: usize,
    },

    #[error("expected a field name at offset {offset} in selector `{selector}`")]
    ExpectedName { selector: String, offset: usize },

    #[error("unterminated bracket in selector `{selector}`")]
    Unterminated { selector: String },

    #[error("invalid index `{index}` in selector `{selector}`")]
    InvalidIndex { selector: String, index: String },
}

/// Declarative rule or printer configuration that failed validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid selector for {owner}: {source}")]
    InvalidSelector {
        owner: String,
        #[source]
        source: SelectorError,
    },

    #[error("unknown shape tag `{0}` (expected one of: map, sequence, record)")]
    UnknownShape(String),

    #[error("failed to decode configuration: {0}")]
    Decode(#[from] serde_json::Error),
}
