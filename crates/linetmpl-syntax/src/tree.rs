//! Parse tree nodes produced by the template parser.
//!
//! Every node records the position of the token that starts it. The set of
//! node kinds is closed: consumers match on [`Node`] and get exhaustiveness
//! checking for free.

use indexmap::IndexMap;

use crate::pos::Pos;

// ============================================================================
// Trees
// ============================================================================

/// A parsed, named template.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    /// Name of the template this tree represents.
    pub name: String,
    /// Name of the top-level template being parsed, used in diagnostics.
    pub parse_name: String,
    /// Top-level nodes.
    pub root: ListNode,
}

impl Tree {
    /// Whether the tree has no content beyond whitespace and comments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty_tree()
    }
}

/// Trees produced by one parse, keyed by template name in definition order.
///
/// Besides the top-level template, every `define` and `block` contributes a tree.
pub type TreeSet = IndexMap<String, Tree>;

/// A sequence of nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListNode {
    /// Position of the first token in the list.
    pub pos: Pos,
    /// The nodes, in source order.
    pub nodes: Vec<Node>,
}

impl ListNode {
    /// Create an empty list.
    #[must_use]
    pub const fn new(pos: Pos) -> Self {
        Self {
            pos,
            nodes: Vec::new(),
        }
    }

    /// Whether the list has no content beyond whitespace and comments.
    #[must_use]
    pub fn is_empty_tree(&self) -> bool {
        self.nodes.iter().all(|node| match node {
            Node::Text(text) => text.text.trim().is_empty(),
            Node::Comment(_) => true,
            _ => false,
        })
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// A node of the parse tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Plain text.
    Text(TextNode),
    /// A comment.
    Comment(CommentNode),
    /// A non-control action such as `{{.Field}}`.
    Action(ActionNode),
    /// A parenthesized pipeline used as an operand.
    Pipe(PipeNode),
    /// A command; only appears inside pipelines.
    Command(CommandNode),
    /// A function name.
    Identifier(IdentifierNode),
    /// A variable reference with an optional field path.
    Variable(VariableNode),
    /// The cursor, `.`.
    Dot(DotNode),
    /// The untyped `nil` constant.
    Nil(NilNode),
    /// A field reference such as `.Name`.
    Field(FieldNode),
    /// A field path applied to another term.
    Chain(ChainNode),
    /// A boolean constant.
    Bool(BoolNode),
    /// A numeric constant.
    Number(NumberNode),
    /// A string constant.
    String(StringNode),
    /// An `if` action.
    If(BranchNode),
    /// A `range` action.
    Range(BranchNode),
    /// A `with` action.
    With(BranchNode),
    /// A `template` invocation (also produced by `block`).
    Template(TemplateNode),
    /// A `break` action.
    Break(BreakNode),
    /// A `continue` action.
    Continue(ContinueNode),
}

impl Node {
    /// Position of the node in the source.
    #[must_use]
    pub fn pos(&self) -> Pos {
        NodeRef::from(self).pos()
    }

    /// Short lowercase name of the node kind, e.g. `"field"` or `"range"`.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        NodeRef::from(self).kind_name()
    }
}

/// Plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    /// Source position.
    pub pos: Pos,
    /// The text, verbatim.
    pub text: String,
}

/// A comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    /// Source position.
    pub pos: Pos,
    /// Comment text including the `/*` and `*/` markers.
    pub text: String,
}

/// A non-control action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionNode {
    /// Source position.
    pub pos: Pos,
    /// The pipeline to evaluate.
    pub pipe: PipeNode,
}

/// A pipeline with optional declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeNode {
    /// Source position.
    pub pos: Pos,
    /// Whether the declarations assign (`=`) rather than declare (`:=`).
    pub is_assign: bool,
    /// Declared or assigned variables, in order.
    pub decl: Vec<VariableNode>,
    /// Commands, in pipeline order.
    pub cmds: Vec<CommandNode>,
}

/// A command: a function call, field access or literal with arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandNode {
    /// Source position.
    pub pos: Pos,
    /// Arguments in source order; the first is the operand being invoked.
    pub args: Vec<Node>,
}

/// A function name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierNode {
    /// Source position.
    pub pos: Pos,
    /// The function name.
    pub ident: String,
}

/// A variable reference. The first segment is the variable name including `$`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableNode {
    /// Source position.
    pub pos: Pos,
    /// Variable name followed by field names.
    pub ident: Vec<String>,
}

/// The cursor, `.`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DotNode {
    /// Source position.
    pub pos: Pos,
}

/// The `nil` constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NilNode {
    /// Source position.
    pub pos: Pos,
}

/// A field reference, `.A`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNode {
    /// Source position.
    pub pos: Pos,
    /// Field names without the leading dots.
    pub ident: Vec<String>,
}

/// A field path applied to a term, e.g. `.A.B.C` or `(pipeline).Field`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainNode {
    /// Position of the first chained field.
    pub pos: Pos,
    /// The term the fields apply to.
    pub node: Box<Node>,
    /// Field names without the leading dots.
    pub field: Vec<String>,
}

/// A boolean constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolNode {
    /// Source position.
    pub pos: Pos,
    /// The value.
    pub value: bool,
}

/// A numeric constant, with every interpretation that fits its value.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberNode {
    /// Source position.
    pub pos: Pos,
    /// Whether the number is representable as `i64`.
    pub is_int: bool,
    /// Whether the number is representable as `u64`.
    pub is_uint: bool,
    /// Whether the number is representable as `f64`.
    pub is_float: bool,
    /// Integer value, valid when `is_int`.
    pub int: i64,
    /// Unsigned value, valid when `is_uint`.
    pub uint: u64,
    /// Floating-point value, valid when `is_float`.
    pub float: f64,
    /// The original text.
    pub text: String,
}

/// A string constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringNode {
    /// Source position.
    pub pos: Pos,
    /// The original text, with quotes.
    pub quoted: String,
    /// The string after quote processing.
    pub text: String,
}

/// The shared shape of `if`, `range` and `with`.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchNode {
    /// Source position.
    pub pos: Pos,
    /// The controlling pipeline.
    pub pipe: PipeNode,
    /// Executed when the pipeline is non-empty.
    pub list: ListNode,
    /// Executed otherwise.
    pub else_list: Option<ListNode>,
}

/// A `template` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateNode {
    /// Source position.
    pub pos: Pos,
    /// Name of the invoked template.
    pub name: String,
    /// The argument that becomes the invoked template's dot.
    pub pipe: Option<PipeNode>,
}

/// A `break` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakNode {
    /// Source position.
    pub pos: Pos,
}

/// A `continue` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinueNode {
    /// Source position.
    pub pos: Pos,
}

// ============================================================================
// Borrowed views
// ============================================================================

/// A borrowed reference to any parse-tree node.
///
/// Pipelines store their declarations and commands as concrete node types
/// rather than [`Node`], so code that needs to talk about "some node" uses
/// this view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    /// Plain text.
    Text(&'a TextNode),
    /// A comment.
    Comment(&'a CommentNode),
    /// A non-control action.
    Action(&'a ActionNode),
    /// A pipeline.
    Pipe(&'a PipeNode),
    /// A command.
    Command(&'a CommandNode),
    /// A function name.
    Identifier(&'a IdentifierNode),
    /// A variable reference.
    Variable(&'a VariableNode),
    /// The cursor.
    Dot(&'a DotNode),
    /// The `nil` constant.
    Nil(&'a NilNode),
    /// A field reference.
    Field(&'a FieldNode),
    /// A field chain.
    Chain(&'a ChainNode),
    /// A boolean constant.
    Bool(&'a BoolNode),
    /// A numeric constant.
    Number(&'a NumberNode),
    /// A string constant.
    String(&'a StringNode),
    /// An `if` action.
    If(&'a BranchNode),
    /// A `range` action.
    Range(&'a BranchNode),
    /// A `with` action.
    With(&'a BranchNode),
    /// A `template` invocation.
    Template(&'a TemplateNode),
    /// A `break` action.
    Break(&'a BreakNode),
    /// A `continue` action.
    Continue(&'a ContinueNode),
}

impl NodeRef<'_> {
    /// Position of the node in the source.
    #[must_use]
    pub const fn pos(&self) -> Pos {
        match self {
            Self::Text(n) => n.pos,
            Self::Comment(n) => n.pos,
            Self::Action(n) => n.pos,
            Self::Pipe(n) => n.pos,
            Self::Command(n) => n.pos,
            Self::Identifier(n) => n.pos,
            Self::Variable(n) => n.pos,
            Self::Dot(n) => n.pos,
            Self::Nil(n) => n.pos,
            Self::Field(n) => n.pos,
            Self::Chain(n) => n.pos,
            Self::Bool(n) => n.pos,
            Self::Number(n) => n.pos,
            Self::String(n) => n.pos,
            Self::If(n) | Self::Range(n) | Self::With(n) => n.pos,
            Self::Template(n) => n.pos,
            Self::Break(n) => n.pos,
            Self::Continue(n) => n.pos,
        }
    }

    /// Short lowercase name of the node kind.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Comment(_) => "comment",
            Self::Action(_) => "action",
            Self::Pipe(_) => "pipe",
            Self::Command(_) => "command",
            Self::Identifier(_) => "identifier",
            Self::Variable(_) => "variable",
            Self::Dot(_) => "dot",
            Self::Nil(_) => "nil",
            Self::Field(_) => "field",
            Self::Chain(_) => "chain",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::If(_) => "if",
            Self::Range(_) => "range",
            Self::With(_) => "with",
            Self::Template(_) => "template",
            Self::Break(_) => "break",
            Self::Continue(_) => "continue",
        }
    }
}

impl<'a> From<&'a Node> for NodeRef<'a> {
    fn from(node: &'a Node) -> Self {
        match node {
            Node::Text(n) => Self::Text(n),
            Node::Comment(n) => Self::Comment(n),
            Node::Action(n) => Self::Action(n),
            Node::Pipe(n) => Self::Pipe(n),
            Node::Command(n) => Self::Command(n),
            Node::Identifier(n) => Self::Identifier(n),
            Node::Variable(n) => Self::Variable(n),
            Node::Dot(n) => Self::Dot(n),
            Node::Nil(n) => Self::Nil(n),
            Node::Field(n) => Self::Field(n),
            Node::Chain(n) => Self::Chain(n),
            Node::Bool(n) => Self::Bool(n),
            Node::Number(n) => Self::Number(n),
            Node::String(n) => Self::String(n),
            Node::If(n) => Self::If(n),
            Node::Range(n) => Self::Range(n),
            Node::With(n) => Self::With(n),
            Node::Template(n) => Self::Template(n),
            Node::Break(n) => Self::Break(n),
            Node::Continue(n) => Self::Continue(n),
        }
    }
}
