//! Error types for template execution.

use linetmpl_syntax::ParseError;
use thiserror::Error;

/// Result type for execution.
pub type ExecResult<T> = Result<T, ExecError>;

/// Errors raised while executing a template.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Evaluation failed at a specific node.
    #[error("template: {parse_name}:{line}: executing {name:?} at <{node}>: {message}")]
    Eval {
        /// Name of the top-level template the failing node was parsed from.
        parse_name: String,
        /// Line of the failing node.
        line: usize,
        /// Name of the template being executed.
        name: String,
        /// The failing node, in canonical text form.
        node: String,
        /// What went wrong.
        message: String,
    },

    /// The requested template is not part of the set.
    #[error("template: no template {name:?} associated with template {set:?}")]
    NoTemplate {
        /// The requested name.
        name: String,
        /// Name of the template set.
        set: String,
    },

    /// Source passed to [`Template::parse`](crate::Template::parse) was rejected.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Writing output failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Error returned by a template function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FuncError(String);

impl FuncError {
    /// Create a function error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}
