//! The serializable node model.
//!
//! Every node is a [`Node`]: a tagged [`NodeKind`] plus a source position.
//! Only the fields that belong to a tag exist for it, so the JSON form of a
//! node never carries another kind's fields:
//!
//! | Tag | Fields |
//! |---|---|
//! | `TEXT`, `NUMBER`, `STRING` | `text` |
//! | `ACTION` | `pipe` |
//! | `PIPE` | `isAssign`, `decl`, `cmds` |
//! | `COMMAND` | `args` |
//! | `VARIABLE`, `FIELD`, `IDENTIFIER` | `ident` |
//! | `CHAIN` | `node` (when there is a base), `field` |
//! | `BOOL` | `true` |
//! | `DOT`, `NIL` | none |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Symbolic tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    /// Plain text.
    Text,
    /// An action such as `[.Name]`.
    Action,
    /// A pipeline with optional variable declarations.
    Pipe,
    /// One command of a pipeline.
    Command,
    /// A variable reference.
    Variable,
    /// A function name.
    Identifier,
    /// The cursor, `.`.
    Dot,
    /// The `nil` constant.
    Nil,
    /// A field path on the cursor.
    Field,
    /// A field path on another term.
    Chain,
    /// A boolean constant.
    Bool,
    /// A numeric constant.
    Number,
    /// A string constant.
    String,
}

impl NodeType {
    /// The tag as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Action => "ACTION",
            Self::Pipe => "PIPE",
            Self::Command => "COMMAND",
            Self::Variable => "VARIABLE",
            Self::Identifier => "IDENTIFIER",
            Self::Dot => "DOT",
            Self::Nil => "NIL",
            Self::Field => "FIELD",
            Self::Chain => "CHAIN",
            Self::Bool => "BOOL",
            Self::Number => "NUMBER",
            Self::String => "STRING",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A serialized template: its name and top-level nodes in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Name of the source template.
    pub name: String,
    /// Top-level nodes.
    pub nodes: Vec<Node>,
}

/// One node of a [`Tree`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    kind: NodeKind,
    /// Byte offset of the node in the source.
    pub pos: usize,
    /// Line of the node in the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Node {
    /// Create a node without line information.
    #[must_use]
    pub const fn new(kind: NodeKind, pos: usize) -> Self {
        Self {
            kind,
            pos,
            line: None,
        }
    }

    /// Attach a line number.
    #[must_use]
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// The node's contents. The tag is fixed once the node exists.
    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The node's tag.
    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Direct children in order: an action's pipe, a pipe's declarations then
    /// commands, a command's arguments, or a chain's base.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match &self.kind {
            NodeKind::Action { pipe } => pipe.iter().map(|pipe| &**pipe).collect(),
            NodeKind::Pipe { decl, cmds, .. } => decl.iter().chain(cmds).collect(),
            NodeKind::Command { args } => args.iter().collect(),
            NodeKind::Chain { node, .. } => node.iter().map(|base| &**base).collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }
}

/// Tag and tag-specific fields of a [`Node`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "nodeType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    /// Plain text.
    Text {
        /// The literal text.
        text: String,
    },
    /// An action.
    Action {
        /// The action's pipeline. Filled once the traversal has built it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pipe: Option<Box<Node>>,
    },
    /// A pipeline.
    Pipe {
        /// Whether the declarations assign (`=`) rather than declare (`:=`).
        #[serde(rename = "isAssign")]
        is_assign: bool,
        /// Declared or assigned variables.
        decl: Vec<Node>,
        /// Commands, in pipeline order.
        cmds: Vec<Node>,
    },
    /// A command.
    Command {
        /// Arguments; the first is the function or value being invoked.
        args: Vec<Node>,
    },
    /// A variable with an optional field path, e.g. `["$x", "A"]`.
    Variable {
        /// Variable name followed by field names.
        ident: Vec<String>,
    },
    /// A function name, as a one-element path.
    Identifier {
        /// The name.
        ident: Vec<String>,
    },
    /// The cursor.
    Dot,
    /// The `nil` constant.
    Nil,
    /// A field path on the cursor.
    Field {
        /// Field names without their leading dots.
        ident: Vec<String>,
    },
    /// A field path on another term.
    Chain {
        /// The term the path applies to.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node: Option<Box<Node>>,
        /// Field names without their leading dots.
        field: Vec<String>,
    },
    /// A boolean constant.
    Bool {
        /// The value.
        #[serde(rename = "true")]
        value: bool,
    },
    /// A numeric constant, as written.
    Number {
        /// Source text of the number.
        text: String,
    },
    /// A string constant.
    String {
        /// The unquoted value.
        text: String,
    },
}

impl NodeKind {
    /// The tag of this kind.
    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        match self {
            Self::Text { .. } => NodeType::Text,
            Self::Action { .. } => NodeType::Action,
            Self::Pipe { .. } => NodeType::Pipe,
            Self::Command { .. } => NodeType::Command,
            Self::Variable { .. } => NodeType::Variable,
            Self::Identifier { .. } => NodeType::Identifier,
            Self::Dot => NodeType::Dot,
            Self::Nil => NodeType::Nil,
            Self::Field { .. } => NodeType::Field,
            Self::Chain { .. } => NodeType::Chain,
            Self::Bool { .. } => NodeType::Bool,
            Self::Number { .. } => NodeType::Number,
            Self::String { .. } => NodeType::String,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn tags_serialize_by_name() {
        assert_eq!(serde_json::to_value(NodeType::Identifier).unwrap(), json!("IDENTIFIER"));
        assert_eq!(NodeType::Chain.to_string(), "CHAIN");
        let parsed: NodeType = serde_json::from_value(json!("NIL")).unwrap();
        assert_eq!(parsed, NodeType::Nil);
    }

    #[test]
    fn fields_follow_the_tag() {
        let dot = Node::new(NodeKind::Dot, 3);
        assert_eq!(serde_json::to_value(&dot).unwrap(), json!({"nodeType": "DOT", "pos": 3}));

        let flag = Node::new(NodeKind::Bool { value: false }, 0).with_line(2);
        assert_eq!(
            serde_json::to_value(&flag).unwrap(),
            json!({"nodeType": "BOOL", "true": false, "pos": 0, "line": 2})
        );

        let chain = Node::new(
            NodeKind::Chain {
                node: None,
                field: vec!["B".to_string()],
            },
            5,
        );
        assert_eq!(
            serde_json::to_value(&chain).unwrap(),
            json!({"nodeType": "CHAIN", "field": ["B"], "pos": 5})
        );
    }

    #[test]
    fn children_in_order() {
        let var = Node::new(NodeKind::Variable { ident: vec!["$x".to_string()] }, 1);
        let cmd = Node::new(NodeKind::Command { args: vec![Node::new(NodeKind::Dot, 7)] }, 7);
        let pipe = Node::new(
            NodeKind::Pipe {
                is_assign: false,
                decl: vec![var],
                cmds: vec![cmd],
            },
            1,
        );
        let types: Vec<_> = pipe.children().iter().map(|n| n.node_type()).collect();
        assert_eq!(types, vec![NodeType::Variable, NodeType::Command]);
        assert!(Node::new(NodeKind::Nil, 0).children().is_empty());
    }
}
