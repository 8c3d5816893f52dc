//! Entry points that parse bracket-delimited templates.

use std::sync::Arc;

use linetmpl_exec::{FuncMap, Template};
use linetmpl_syntax::{Delims, ParseError, Parser, TreeSet};
use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::Error;
use crate::node::Tree;
use crate::traversal::{NoopVisitor, Traversal, Visitor};

/// Opening action delimiter.
pub const LEFT_DELIM: &str = "[";
/// Closing action delimiter.
pub const RIGHT_DELIM: &str = "]";

static DEFAULT: Lazy<Frontend> = Lazy::new(Frontend::default);

/// Parser configuration: the fixed delimiters plus a function table.
///
/// The table is shared, never mutated, and consulted by both [`parse`](Self::parse)
/// and [`compile`](Self::compile). A default frontend knows only the builtins.
#[derive(Debug, Clone, Default)]
pub struct Frontend {
    funcs: Arc<FuncMap>,
}

impl Frontend {
    /// Create a frontend with the given function table.
    #[must_use]
    pub fn new(funcs: impl Into<Arc<FuncMap>>) -> Self {
        Self {
            funcs: funcs.into(),
        }
    }

    /// The function table.
    #[must_use]
    pub fn funcs(&self) -> &FuncMap {
        &self.funcs
    }

    /// Parse `text` into a serializable tree.
    pub fn parse(&self, name: &str, text: &str) -> Result<Tree, Error> {
        self.parse_with(name, text, &mut NoopVisitor)
    }

    /// Parse `text`, calling `visitor` for every node built.
    pub fn parse_with<V: Visitor>(
        &self,
        name: &str,
        text: &str,
        visitor: &mut V,
    ) -> Result<Tree, Error<V::Error>> {
        let trees = self.parse_trees(name, text)?;
        let nodes = trees.get(name).map_or(&[][..], |tree| tree.root.nodes.as_slice());
        Traversal::from_nodes(name, nodes).visit(visitor)
    }

    /// Parse `text` and bind the result to the execution engine.
    pub fn compile(&self, name: &str, text: &str) -> Result<Template, ParseError> {
        let trees = self.parse_trees(name, text)?;
        Ok(Template::from_trees(name, trees, Arc::clone(&self.funcs)).delims(LEFT_DELIM, RIGHT_DELIM))
    }

    fn parse_trees(&self, name: &str, text: &str) -> Result<TreeSet, ParseError> {
        debug!(name, len = text.len(), "parse");
        let delims = Delims::new(LEFT_DELIM, RIGHT_DELIM);
        Parser::parse(name, text, &delims, &*self.funcs)
    }
}

/// Parse `text` with the default frontend.
pub fn parse(name: &str, text: &str) -> Result<Tree, Error> {
    DEFAULT.parse(name, text)
}

/// Compile `text` with the default frontend.
pub fn compile(name: &str, text: &str) -> Result<Template, ParseError> {
    DEFAULT.compile(name, text)
}
