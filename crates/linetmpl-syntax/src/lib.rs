//! Lexer, parser and parse tree for linetmpl templates.
//!
//! This crate provides:
//! - A lexer that honors configurable action delimiters and trim markers
//! - A recursive-descent parser producing typed parse trees
//! - Source positions (byte offset and line) on every node
//!
//! # Example
//!
//! ```
//! use linetmpl_syntax::{Delims, NoFuncs, Parser};
//!
//! let trees = Parser::parse("greeting", "Hello, [.Name]!", &Delims::new("[", "]"), &NoFuncs)
//!     .unwrap();
//! assert_eq!(trees["greeting"].root.nodes.len(), 3);
//! ```

pub mod format;
pub mod lexer;
pub mod parser;
pub mod pos;
mod quote;
pub mod tree;

#[cfg(test)]
mod proptest_support;

pub use lexer::{lex, Delims, Item, ItemKind};
pub use parser::{FuncLookup, NoFuncs, ParseError, ParseResult, Parser, MAX_DEPTH};
pub use pos::Pos;
pub use tree::*;
