//! Error types for the pfunc compiler
//!
//! All fallible operations return `Result<T, Error>`.
//! Lexing cannot fail; every other stage reports one of these variants and
//! aborts the whole batch.

use thiserror::Error;

/// pfunc compiler error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Unbalanced parentheses while reading the S-expression forest
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A form the compiler refuses to lower (`letrec`, `cond`, wrong arity)
    #[error("Unsupported construct `{form}`: {reason}")]
    UnsupportedConstruct { form: String, reason: String },

    /// A `define` (or a form inside it) lacks a clause it depends on
    #[error("Missing clause in `{form}`: {clause}")]
    MissingClause { form: String, clause: String },

    /// Compiled output could not be rendered as JSON
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    pub(crate) fn unsupported(form: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::UnsupportedConstruct {
            form: form.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(form: impl Into<String>, clause: impl Into<String>) -> Self {
        Error::MissingClause {
            form: form.into(),
            clause: clause.into(),
        }
    }
}

/// Result type alias for pfunc operations
pub type Result<T> = std::result::Result<T, Error>;
