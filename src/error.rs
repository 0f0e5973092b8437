//! Error types for pgcypher.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The clause of a query an error or a piece of text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClauseKind {
    Match,
    Where,
    Return,
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClauseKind::Match => write!(f, "MATCH"),
            ClauseKind::Where => write!(f, "WHERE"),
            ClauseKind::Return => write!(f, "RETURN"),
        }
    }
}

/// The main error type for pgcypher operations.
#[derive(Debug, Error)]
pub enum CypherError {
    /// A mandatory clause (MATCH or RETURN) is absent or empty.
    #[error("{0} clause is required")]
    MissingClause(ClauseKind),

    /// The MATCH clause contains no node pattern that could anchor FROM.
    #[error("MATCH clause contains no parseable node pattern")]
    EmptyPattern,

    /// Text that would be skipped in best-effort mode (strict mode only).
    #[error("Parse error in {clause} clause at offset {position}: {message}")]
    Parse {
        clause: ClauseKind,
        position: usize,
        message: String,
    },

    /// A clause references a variable the pattern does not bind (strict mode only).
    #[error("Unknown variable '{variable}' in {clause} clause")]
    UnknownVariable {
        clause: ClauseKind,
        variable: String,
    },

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be decoded.
    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CypherError {
    /// Create a parse error at the given offset of a clause.
    pub fn parse(clause: ClauseKind, position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            clause,
            position,
            message: message.into(),
        }
    }

    /// Create an unknown variable error.
    pub fn unknown(clause: ClauseKind, variable: impl Into<String>) -> Self {
        Self::UnknownVariable {
            clause,
            variable: variable.into(),
        }
    }

    /// Whether this error is structural, i.e. raised regardless of strictness.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::MissingClause(_) | Self::EmptyPattern)
    }
}

/// Result type alias for pgcypher operations.
pub type CypherResult<T> = Result<T, CypherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CypherError::parse(ClauseKind::Match, 5, "expected node pattern");
        assert_eq!(
            err.to_string(),
            "Parse error in MATCH clause at offset 5: expected node pattern"
        );
        assert_eq!(
            CypherError::MissingClause(ClauseKind::Return).to_string(),
            "RETURN clause is required"
        );
    }

    #[test]
    fn test_structural_errors() {
        assert!(CypherError::MissingClause(ClauseKind::Match).is_structural());
        assert!(CypherError::EmptyPattern.is_structural());
        assert!(!CypherError::unknown(ClauseKind::Where, "x").is_structural());
    }
}
