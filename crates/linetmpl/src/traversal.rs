//! Conversion from parse trees to the serializable node model.
//!
//! The walk is recursive and single-pass. For actions, pipes, commands and
//! chains the visitor runs before the children are built; for leaves it runs
//! once the node's fields are filled in. A parent's child list is complete by
//! the time the parent is returned.
//!
//! Comments produce no node and are never shown to the visitor. Conditionals,
//! loops, loop control and template invocations fail with
//! [`UnsupportedConstruct`] before any tree is returned.

use std::convert::Infallible;

use linetmpl_syntax as syntax;
use linetmpl_syntax::{ActionNode, ChainNode, CommandNode, NodeRef, PipeNode, Pos, VariableNode};
use tracing::trace;

use crate::error::{Error, UnsupportedConstruct};
use crate::node::{Node, NodeKind, Tree};

/// Hook invoked once for every node the traversal builds.
///
/// `source` is the parse-tree node the output was built from. Returning an
/// error stops the traversal at once; no further siblings or children are
/// visited and the error is returned as [`Error::Visitor`].
pub trait Visitor {
    /// Error raised to abort the traversal.
    type Error;

    /// Inspect or adjust a freshly built node.
    fn visit(&mut self, source: NodeRef<'_>, node: &mut Node) -> Result<(), Self::Error>;
}

impl<F, E> Visitor for F
where
    F: FnMut(NodeRef<'_>, &mut Node) -> Result<(), E>,
{
    type Error = E;

    fn visit(&mut self, source: NodeRef<'_>, node: &mut Node) -> Result<(), E> {
        self(source, node)
    }
}

/// A visitor that accepts every node unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVisitor;

impl Visitor for NoopVisitor {
    type Error = Infallible;

    fn visit(&mut self, _source: NodeRef<'_>, _node: &mut Node) -> Result<(), Infallible> {
        Ok(())
    }
}

/// A traversal over the top-level nodes of one parsed template.
#[derive(Debug, Clone, Copy)]
pub struct Traversal<'a> {
    name: &'a str,
    nodes: &'a [syntax::Node],
}

impl<'a> Traversal<'a> {
    /// Traverse a parse tree; the output keeps the tree's name.
    #[must_use]
    pub fn new(tree: &'a syntax::Tree) -> Self {
        Self {
            name: &tree.name,
            nodes: &tree.root.nodes,
        }
    }

    /// Traverse a bare node sequence.
    #[must_use]
    pub const fn from_nodes(name: &'a str, nodes: &'a [syntax::Node]) -> Self {
        Self { name, nodes }
    }

    /// Build the output tree, calling `visitor` for every node built.
    pub fn visit<V: Visitor>(&self, visitor: &mut V) -> Result<Tree, Error<V::Error>> {
        let mut walker = Walker { visitor };
        let nodes = walker.list(self.nodes)?;
        Ok(Tree {
            name: self.name.to_string(),
            nodes,
        })
    }
}

struct Walker<'v, V> {
    visitor: &'v mut V,
}

impl<V: Visitor> Walker<'_, V> {
    fn list(&mut self, nodes: &[syntax::Node]) -> Result<Vec<Node>, Error<V::Error>> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let Some(built) = self.node(node)? {
                out.push(built);
            }
        }
        Ok(out)
    }

    /// Build one node. Comments yield `None`.
    fn node(&mut self, node: &syntax::Node) -> Result<Option<Node>, Error<V::Error>> {
        trace!(kind = node.kind_name(), pos = %node.pos(), "visit");
        let source = NodeRef::from(node);
        let built = match node {
            syntax::Node::Comment(_) => return Ok(None),
            syntax::Node::Action(action) => self.action(action)?,
            syntax::Node::Pipe(pipe) => self.pipe(pipe)?,
            syntax::Node::Command(command) => self.command(command)?,
            syntax::Node::Variable(variable) => self.variable(variable)?,
            syntax::Node::Chain(chain) => self.chain(chain)?,
            syntax::Node::Text(text) => self.leaf(source, NodeKind::Text { text: text.text.clone() })?,
            syntax::Node::Identifier(ident) => self.leaf(
                source,
                NodeKind::Identifier {
                    ident: vec![ident.ident.clone()],
                },
            )?,
            syntax::Node::Dot(_) => self.leaf(source, NodeKind::Dot)?,
            syntax::Node::Nil(_) => self.leaf(source, NodeKind::Nil)?,
            syntax::Node::Field(field) => self.leaf(
                source,
                NodeKind::Field {
                    ident: field.ident.clone(),
                },
            )?,
            syntax::Node::Bool(flag) => self.leaf(source, NodeKind::Bool { value: flag.value })?,
            syntax::Node::Number(number) => self.leaf(
                source,
                NodeKind::Number {
                    text: number.text.clone(),
                },
            )?,
            syntax::Node::String(string) => self.leaf(
                source,
                NodeKind::String {
                    text: string.text.clone(),
                },
            )?,
            syntax::Node::If(_)
            | syntax::Node::Range(_)
            | syntax::Node::With(_)
            | syntax::Node::Template(_)
            | syntax::Node::Break(_)
            | syntax::Node::Continue(_) => {
                return Err(UnsupportedConstruct {
                    kind: node.kind_name(),
                    pos: node.pos(),
                }
                .into());
            }
        };
        Ok(Some(built))
    }

    fn call(&mut self, source: NodeRef<'_>, node: &mut Node) -> Result<(), Error<V::Error>> {
        self.visitor.visit(source, node).map_err(Error::Visitor)
    }

    fn leaf(&mut self, source: NodeRef<'_>, kind: NodeKind) -> Result<Node, Error<V::Error>> {
        let mut node = located(kind, source.pos());
        self.call(source, &mut node)?;
        Ok(node)
    }

    fn action(&mut self, action: &ActionNode) -> Result<Node, Error<V::Error>> {
        let mut node = located(NodeKind::Action { pipe: None }, action.pos);
        self.call(NodeRef::Action(action), &mut node)?;
        let built = self.pipe(&action.pipe)?;
        if let NodeKind::Action { pipe } = node.kind_mut() {
            *pipe = Some(Box::new(built));
        }
        Ok(node)
    }

    fn pipe(&mut self, pipe: &PipeNode) -> Result<Node, Error<V::Error>> {
        let mut node = located(
            NodeKind::Pipe {
                is_assign: pipe.is_assign,
                decl: Vec::new(),
                cmds: Vec::new(),
            },
            pipe.pos,
        );
        self.call(NodeRef::Pipe(pipe), &mut node)?;
        let mut decls = Vec::with_capacity(pipe.decl.len());
        for variable in &pipe.decl {
            decls.push(self.variable(variable)?);
        }
        let mut commands = Vec::with_capacity(pipe.cmds.len());
        for command in &pipe.cmds {
            commands.push(self.command(command)?);
        }
        if let NodeKind::Pipe { decl, cmds, .. } = node.kind_mut() {
            *decl = decls;
            *cmds = commands;
        }
        Ok(node)
    }

    fn command(&mut self, command: &CommandNode) -> Result<Node, Error<V::Error>> {
        let mut node = located(NodeKind::Command { args: Vec::new() }, command.pos);
        self.call(NodeRef::Command(command), &mut node)?;
        let built = self.list(&command.args)?;
        if let NodeKind::Command { args } = node.kind_mut() {
            *args = built;
        }
        Ok(node)
    }

    fn variable(&mut self, variable: &VariableNode) -> Result<Node, Error<V::Error>> {
        self.leaf(
            NodeRef::Variable(variable),
            NodeKind::Variable {
                ident: variable.ident.clone(),
            },
        )
    }

    fn chain(&mut self, chain: &ChainNode) -> Result<Node, Error<V::Error>> {
        let mut node = located(
            NodeKind::Chain {
                node: None,
                field: Vec::new(),
            },
            chain.pos,
        );
        self.call(NodeRef::Chain(chain), &mut node)?;
        let built = self.node(&chain.node)?;
        if let NodeKind::Chain { node: base, field } = node.kind_mut() {
            *base = built.map(Box::new);
            field.clone_from(&chain.field);
        }
        Ok(node)
    }
}

fn located(kind: NodeKind, pos: Pos) -> Node {
    Node::new(kind, pos.offset).with_line(pos.line)
}
