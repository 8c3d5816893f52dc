//! Serializable syntax trees for bracket-delimited templates.
//!
//! Templates use `[` and `]` as action delimiters:
//!
//! ```text
//! /[.Date]/[.Plate]/[.Year]
//! ```
//!
//! [`parse`] turns such a template into a [`Tree`] of tagged [`Node`]s that
//! serializes to JSON, for editors and other tools that need the structure of
//! a template without a grammar of their own. [`compile`] parses the same
//! text into an executable [`Template`].
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//!
//! let tree = linetmpl::parse("plate", "/[.Date]").unwrap();
//! assert_eq!(tree.nodes.len(), 2);
//! assert_eq!(tree.nodes[1].node_type(), linetmpl::NodeType::Action);
//!
//! let tmpl = linetmpl::compile("plate", "/[.Date]/[.Plate]").unwrap();
//! let out = tmpl.render(&json!({"Date": "20180201", "Plate": "ABC123"})).unwrap();
//! assert_eq!(out, "/20180201/ABC123");
//! ```

pub mod error;
pub mod frontend;
pub mod node;
pub mod traversal;

pub use error::{Error, UnsupportedConstruct};
pub use frontend::{compile, parse, Frontend, LEFT_DELIM, RIGHT_DELIM};
pub use linetmpl_exec::{FuncError, FuncMap, MissingKey, Template};
pub use linetmpl_syntax::{NodeRef, ParseError};
pub use node::{Node, NodeKind, NodeType, Tree};
pub use traversal::{NoopVisitor, Traversal, Visitor};
