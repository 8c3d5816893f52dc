//! Canonical text form of parse-tree nodes.
//!
//! Expressions render the way they would be written inside an action;
//! control structures render with the default `{{ }}` delimiters. The output
//! is meant for diagnostics, so whitespace and trim markers are normalized.

use std::fmt::{self, Display, Formatter, Write};

use crate::tree::*;

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        NodeRef::from(self).fmt(f)
    }
}

impl Display for NodeRef<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(n) => n.fmt(f),
            Self::Comment(n) => n.fmt(f),
            Self::Action(n) => n.fmt(f),
            Self::Pipe(n) => n.fmt(f),
            Self::Command(n) => n.fmt(f),
            Self::Identifier(n) => n.fmt(f),
            Self::Variable(n) => n.fmt(f),
            Self::Dot(_) => f.write_char('.'),
            Self::Nil(_) => f.write_str("nil"),
            Self::Field(n) => n.fmt(f),
            Self::Chain(n) => n.fmt(f),
            Self::Bool(n) => n.value.fmt(f),
            Self::Number(n) => f.write_str(&n.text),
            Self::String(n) => f.write_str(&n.quoted),
            Self::If(n) => write_branch(f, "if", n),
            Self::Range(n) => write_branch(f, "range", n),
            Self::With(n) => write_branch(f, "with", n),
            Self::Template(n) => n.fmt(f),
            Self::Break(_) => f.write_str("{{break}}"),
            Self::Continue(_) => f.write_str("{{continue}}"),
        }
    }
}

impl Display for ListNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.nodes.iter().try_for_each(|node| node.fmt(f))
    }
}

impl Display for TextNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Display for CommentNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{{{{}}}}}", self.text)
    }
}

impl Display for ActionNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{{{{}}}}}", self.pipe)
    }
}

impl Display for PipeNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if !self.decl.is_empty() {
            for (i, variable) in self.decl.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                variable.fmt(f)?;
            }
            f.write_str(if self.is_assign { " = " } else { " := " })?;
        }
        for (i, command) in self.cmds.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            command.fmt(f)?;
        }
        Ok(())
    }
}

impl Display for CommandNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_char(' ')?;
            }
            if let Node::Pipe(pipe) = arg {
                write!(f, "({pipe})")?;
            } else {
                arg.fmt(f)?;
            }
        }
        Ok(())
    }
}

impl Display for IdentifierNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ident)
    }
}

impl Display for VariableNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ident.join("."))
    }
}

impl Display for FieldNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.ident.iter().try_for_each(|ident| write!(f, ".{ident}"))
    }
}

impl Display for ChainNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Node::Pipe(pipe) = self.node.as_ref() {
            write!(f, "({pipe})")?;
        } else {
            self.node.fmt(f)?;
        }
        self.field.iter().try_for_each(|field| write!(f, ".{field}"))
    }
}

impl Display for TemplateNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.pipe {
            Some(pipe) => write!(f, "{{{{template {:?} {pipe}}}}}", self.name),
            None => write!(f, "{{{{template {:?}}}}}", self.name),
        }
    }
}

fn write_branch(f: &mut Formatter<'_>, keyword: &str, branch: &BranchNode) -> fmt::Result {
    write!(f, "{{{{{keyword} {}}}}}{}", branch.pipe, branch.list)?;
    if let Some(else_list) = &branch.else_list {
        write!(f, "{{{{else}}}}{else_list}")?;
    }
    f.write_str("{{end}}")
}

#[cfg(test)]
mod tests {
    use crate::{Delims, Parser};

    fn roundtrip(source: &str) -> String {
        let funcs = |name: &str| matches!(name, "printf" | "len" | "upper");
        let trees = Parser::parse("t", source, &Delims::default(), &funcs).unwrap();
        trees["t"].root.to_string()
    }

    #[test]
    fn format_expressions() {
        assert_eq!(roundtrip("{{.A.B}}"), "{{.A.B}}");
        assert_eq!(roundtrip("{{ $x := .A | len }}"), "{{$x := .A | len}}");
        assert_eq!(roundtrip("{{(.A).B}}"), "{{(.A).B}}");
        assert_eq!(roundtrip(r#"{{printf "%d" 1}}"#), r#"{{printf "%d" 1}}"#);
    }

    #[test]
    fn format_control() {
        assert_eq!(
            roundtrip("{{if .A}}a{{else}}b{{end}}"),
            "{{if .A}}a{{else}}b{{end}}"
        );
        assert_eq!(
            roundtrip(r#"{{range $i, $e := .L}}{{$e}}{{end}}{{template "x" .}}"#),
            r#"{{range $i, $e := .L}}{{$e}}{{end}}{{template "x" .}}"#
        );
    }
}
