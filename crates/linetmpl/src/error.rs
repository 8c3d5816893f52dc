//! Errors returned by parsing and traversal.

use std::convert::Infallible;

use linetmpl_syntax::{ParseError, Pos};
use thiserror::Error;

/// Errors from [`parse`](crate::parse) and [`Traversal::visit`](crate::Traversal::visit).
///
/// `E` is the error type of the visitor; the default visitor cannot fail.
#[derive(Debug, Error)]
pub enum Error<E = Infallible> {
    /// The grammar rejected the source. The diagnostic is passed through as is.
    #[error(transparent)]
    Syntax(#[from] ParseError),

    /// The tree contains a construct the node model cannot represent.
    #[error(transparent)]
    Unsupported(#[from] UnsupportedConstruct),

    /// The visitor rejected a node.
    #[error("{0}")]
    Visitor(E),
}

impl<E> Error<E> {
    /// The visitor's error, if this is one.
    pub fn into_visitor(self) -> Option<E> {
        match self {
            Self::Visitor(err) => Some(err),
            _ => None,
        }
    }
}

/// A conditional, loop or template invocation reached the traversal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported construct `{kind}` at line {}, offset {}", .pos.line, .pos.offset)]
pub struct UnsupportedConstruct {
    /// Kind of the offending node, e.g. `"if"` or `"range"`.
    pub kind: &'static str,
    /// Where it starts.
    pub pos: Pos,
}
