//! Recursive-descent parser that turns lexer items into parse trees.

use thiserror::Error;

use crate::lexer::{lex, Delims, Item, ItemKind};
use crate::pos::Pos;
use crate::quote::{unquote, unquote_char};
use crate::tree::*;

/// Maximum nesting of parenthesized pipelines and control structures.
pub const MAX_DEPTH: usize = 200;

/// A template that the grammar rejects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template: {name}:{line}: {message}")]
pub struct ParseError {
    /// Name of the template being parsed.
    pub name: String,
    /// Line of the offending token (1-indexed).
    pub line: usize,
    /// What went wrong.
    pub message: String,
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Answers whether a function name may be called from a template.
pub trait FuncLookup {
    /// Whether `name` is a callable function.
    fn has_func(&self, name: &str) -> bool;
}

impl<F: Fn(&str) -> bool> FuncLookup for F {
    fn has_func(&self, name: &str) -> bool {
        self(name)
    }
}

/// A function table that knows no functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFuncs;

impl FuncLookup for NoFuncs {
    fn has_func(&self, _name: &str) -> bool {
        false
    }
}

/// What a step of the item-list parser produced.
enum Step {
    Node(Node),
    End,
    Else(Pos),
}

/// Parser for template source.
pub struct Parser<'a> {
    parse_name: String,
    items: Vec<Item>,
    cursor: usize,
    funcs: &'a dyn FuncLookup,
    vars: Vec<String>,
    trees: TreeSet,
    action_line: usize,
    range_depth: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Parse `source` as the template `name`.
    ///
    /// The returned set contains the top-level tree under `name`, plus one tree
    /// per `define` or `block` in the source.
    pub fn parse(
        name: &str,
        source: &str,
        delims: &Delims,
        funcs: &'a dyn FuncLookup,
    ) -> ParseResult<TreeSet> {
        let mut parser = Parser {
            parse_name: name.to_string(),
            items: lex(source, delims),
            cursor: 0,
            funcs,
            vars: vec!["$".to_string()],
            trees: TreeSet::new(),
            action_line: 0,
            range_depth: 0,
            depth: 0,
        };
        let root = parser.parse_root()?;
        parser.add(Tree {
            name: name.to_string(),
            parse_name: name.to_string(),
            root,
        })?;
        Ok(parser.trees)
    }

    // ------------------------------------------------------------------------
    // Token access
    // ------------------------------------------------------------------------

    fn next(&mut self) -> Item {
        if self.cursor < self.items.len() {
            self.cursor += 1;
        }
        self.items[self.cursor - 1].clone()
    }

    fn backup(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn peek(&self) -> Item {
        self.items[self.cursor.min(self.items.len() - 1)].clone()
    }

    fn next_non_space(&mut self) -> Item {
        loop {
            let item = self.next();
            if item.kind != ItemKind::Space {
                return item;
            }
        }
    }

    fn peek_non_space(&mut self) -> Item {
        let item = self.next_non_space();
        self.backup();
        item
    }

    fn expect(&mut self, expected: ItemKind, context: &str) -> ParseResult<Item> {
        let token = self.next_non_space();
        if token.kind != expected {
            return self.unexpected(&token, context);
        }
        Ok(token)
    }

    fn expect_one_of(&mut self, a: ItemKind, b: ItemKind, context: &str) -> ParseResult<Item> {
        let token = self.next_non_space();
        if token.kind != a && token.kind != b {
            return self.unexpected(&token, context);
        }
        Ok(token)
    }

    // ------------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------------

    fn error<T>(&self, message: impl Into<String>) -> ParseResult<T> {
        let last = self.cursor.saturating_sub(1).min(self.items.len() - 1);
        Err(ParseError {
            name: self.parse_name.clone(),
            line: self.items[last].pos.line,
            message: message.into(),
        })
    }

    fn unexpected<T>(&self, token: &Item, context: &str) -> ParseResult<T> {
        if token.kind == ItemKind::Error {
            let mut extra = String::new();
            if self.action_line != 0 && self.action_line != token.pos.line {
                extra = format!(
                    " in action started at {}:{}",
                    self.parse_name, self.action_line
                );
                if token.val.ends_with(" action") {
                    extra = extra[" in action".len()..].to_string();
                }
            }
            return self.error(format!("{token}{extra}"));
        }
        self.error(format!("unexpected {token} in {context}"))
    }

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return self.error("max expression depth exceeded");
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ------------------------------------------------------------------------
    // Trees
    // ------------------------------------------------------------------------

    /// Add a tree to the set. An empty tree never replaces a non-empty one.
    fn add(&mut self, tree: Tree) -> ParseResult<()> {
        let replace = match self.trees.get(&tree.name) {
            Some(existing) if !existing.is_empty() => {
                if !tree.is_empty() {
                    return self.error(format!(
                        "template: multiple definition of template {:?}",
                        tree.name
                    ));
                }
                false
            }
            _ => true,
        };
        if replace {
            self.trees.insert(tree.name.clone(), tree);
        }
        Ok(())
    }

    fn parse_root(&mut self) -> ParseResult<ListNode> {
        let mut root = ListNode::new(self.peek().pos);
        while self.peek().kind != ItemKind::Eof {
            if self.peek().kind == ItemKind::LeftDelim {
                let mark = self.cursor;
                self.next();
                if self.next_non_space().kind == ItemKind::Define {
                    self.parse_definition()?;
                    continue;
                }
                self.cursor = mark;
            }
            match self.text_or_action()? {
                Step::Node(node) => root.nodes.push(node),
                Step::End => return self.error("unexpected {{end}}"),
                Step::Else(_) => return self.error("unexpected {{else}}"),
            }
        }
        Ok(root)
    }

    /// Parse a nested tree body with a fresh variable scope.
    fn nested_body(&mut self) -> ParseResult<(ListNode, Step)> {
        let vars = std::mem::replace(&mut self.vars, vec!["$".to_string()]);
        let range_depth = std::mem::replace(&mut self.range_depth, 0);
        let body = self.item_list();
        self.vars = vars;
        self.range_depth = range_depth;
        body
    }

    /// `{{define "name"}} ... {{end}}`; the `define` keyword has been consumed.
    fn parse_definition(&mut self) -> ParseResult<()> {
        const CONTEXT: &str = "define clause";
        let token = self.expect_one_of(ItemKind::String, ItemKind::RawString, CONTEXT)?;
        let name = match unquote(&token.val) {
            Ok(name) => name,
            Err(message) => return self.error(message),
        };
        self.expect(ItemKind::RightDelim, CONTEXT)?;
        let (root, end) = self.nested_body()?;
        if !matches!(end, Step::End) {
            return self.error(format!("unexpected {{{{else}}}} in {CONTEXT}"));
        }
        self.add(Tree {
            name,
            parse_name: self.parse_name.clone(),
            root,
        })
    }

    // ------------------------------------------------------------------------
    // Lists and actions
    // ------------------------------------------------------------------------

    fn item_list(&mut self) -> ParseResult<(ListNode, Step)> {
        self.enter()?;
        let mut list = ListNode::new(self.peek_non_space().pos);
        while self.peek_non_space().kind != ItemKind::Eof {
            match self.text_or_action()? {
                Step::Node(node) => list.nodes.push(node),
                end => {
                    self.leave();
                    return Ok((list, end));
                }
            }
        }
        self.error("unexpected EOF")
    }

    fn text_or_action(&mut self) -> ParseResult<Step> {
        let token = self.next_non_space();
        match token.kind {
            ItemKind::Text => Ok(Step::Node(Node::Text(TextNode {
                pos: token.pos,
                text: token.val,
            }))),
            ItemKind::LeftDelim => {
                self.action_line = token.pos.line;
                let step = self.action();
                self.action_line = 0;
                step
            }
            ItemKind::Comment => Ok(Step::Node(Node::Comment(CommentNode {
                pos: token.pos,
                text: token.val,
            }))),
            _ => self.unexpected(&token, "input"),
        }
    }

    /// Parse an action; the left delimiter has been consumed.
    fn action(&mut self) -> ParseResult<Step> {
        let token = self.next_non_space();
        let node = match token.kind {
            ItemKind::Block => self.block_control()?,
            ItemKind::Break => self.loop_control(token.pos, "break")?,
            ItemKind::Continue => self.loop_control(token.pos, "continue")?,
            ItemKind::Else => return self.else_control(),
            ItemKind::End => return self.end_control(),
            ItemKind::If => self.if_control()?,
            ItemKind::Range => self.range_control()?,
            ItemKind::Template => self.template_control()?,
            ItemKind::With => self.with_control()?,
            _ => {
                self.backup();
                let pos = self.peek().pos;
                let pipe = self.pipeline("command", ItemKind::RightDelim)?;
                Node::Action(ActionNode { pos, pipe })
            }
        };
        Ok(Step::Node(node))
    }

    // ------------------------------------------------------------------------
    // Control structures
    // ------------------------------------------------------------------------

    fn parse_control(
        &mut self,
        context: &str,
    ) -> ParseResult<(Pos, PipeNode, ListNode, Option<ListNode>)> {
        let vars = self.vars.len();
        let result = self.parse_control_scoped(context);
        self.vars.truncate(vars);
        result
    }

    fn parse_control_scoped(
        &mut self,
        context: &str,
    ) -> ParseResult<(Pos, PipeNode, ListNode, Option<ListNode>)> {
        let pipe = self.pipeline(context, ItemKind::RightDelim)?;
        let is_range = context == "range";
        if is_range {
            self.range_depth += 1;
        }
        let body = self.item_list();
        if is_range {
            self.range_depth -= 1;
        }
        let (list, next) = body?;
        let mut else_list = None;
        if let Step::Else(else_pos) = next {
            // "{{else if ...}}" is "{{else}}{{if ...}}...{{end}}"; the inner
            // control consumes the single {{end}}. Likewise for "with".
            if context == "if" && self.peek().kind == ItemKind::If {
                self.next();
                let mut list = ListNode::new(else_pos);
                list.nodes.push(self.if_control()?);
                else_list = Some(list);
            } else if context == "with" && self.peek().kind == ItemKind::With {
                self.next();
                let mut list = ListNode::new(else_pos);
                list.nodes.push(self.with_control()?);
                else_list = Some(list);
            } else {
                let (list, next) = self.item_list()?;
                if !matches!(next, Step::End) {
                    return self.error("expected end; found {{else}}");
                }
                else_list = Some(list);
            }
        }
        Ok((pipe.pos, pipe, list, else_list))
    }

    fn if_control(&mut self) -> ParseResult<Node> {
        let (pos, pipe, list, else_list) = self.parse_control("if")?;
        Ok(Node::If(BranchNode {
            pos,
            pipe,
            list,
            else_list,
        }))
    }

    fn range_control(&mut self) -> ParseResult<Node> {
        let (pos, pipe, list, else_list) = self.parse_control("range")?;
        Ok(Node::Range(BranchNode {
            pos,
            pipe,
            list,
            else_list,
        }))
    }

    fn with_control(&mut self) -> ParseResult<Node> {
        let (pos, pipe, list, else_list) = self.parse_control("with")?;
        Ok(Node::With(BranchNode {
            pos,
            pipe,
            list,
            else_list,
        }))
    }

    fn end_control(&mut self) -> ParseResult<Step> {
        self.expect(ItemKind::RightDelim, "end")?;
        Ok(Step::End)
    }

    fn else_control(&mut self) -> ParseResult<Step> {
        let peek = self.peek_non_space();
        // "else if" and "else with" leave the keyword for parse_control.
        if matches!(peek.kind, ItemKind::If | ItemKind::With) {
            return Ok(Step::Else(peek.pos));
        }
        let token = self.expect(ItemKind::RightDelim, "else")?;
        Ok(Step::Else(token.pos))
    }

    fn loop_control(&mut self, pos: Pos, keyword: &str) -> ParseResult<Node> {
        let context = format!("{{{{{keyword}}}}}");
        let token = self.next_non_space();
        if token.kind != ItemKind::RightDelim {
            return self.unexpected(&token, &context);
        }
        if self.range_depth == 0 {
            return self.error(format!("{context} outside {{{{range}}}}"));
        }
        Ok(if keyword == "break" {
            Node::Break(BreakNode { pos })
        } else {
            Node::Continue(ContinueNode { pos })
        })
    }

    fn template_control(&mut self) -> ParseResult<Node> {
        const CONTEXT: &str = "template clause";
        let token = self.next_non_space();
        let name = self.parse_template_name(&token, CONTEXT)?;
        let mut pipe = None;
        if self.next_non_space().kind != ItemKind::RightDelim {
            self.backup();
            pipe = Some(self.pipeline(CONTEXT, ItemKind::RightDelim)?);
        }
        Ok(Node::Template(TemplateNode {
            pos: token.pos,
            name,
            pipe,
        }))
    }

    /// `{{block "name" pipeline}} ... {{end}}` defines a template and invokes it.
    fn block_control(&mut self) -> ParseResult<Node> {
        const CONTEXT: &str = "block clause";
        let token = self.next_non_space();
        let name = self.parse_template_name(&token, CONTEXT)?;
        let pipe = self.pipeline(CONTEXT, ItemKind::RightDelim)?;
        let (root, end) = self.nested_body()?;
        if !matches!(end, Step::End) {
            return self.error(format!("unexpected {{{{else}}}} in {CONTEXT}"));
        }
        self.add(Tree {
            name: name.clone(),
            parse_name: self.parse_name.clone(),
            root,
        })?;
        Ok(Node::Template(TemplateNode {
            pos: token.pos,
            name,
            pipe: Some(pipe),
        }))
    }

    fn parse_template_name(&self, token: &Item, context: &str) -> ParseResult<String> {
        match token.kind {
            ItemKind::String | ItemKind::RawString => match unquote(&token.val) {
                Ok(name) => Ok(name),
                Err(message) => self.error(message),
            },
            _ => self.unexpected(token, context),
        }
    }

    // ------------------------------------------------------------------------
    // Pipelines and commands
    // ------------------------------------------------------------------------

    fn pipeline(&mut self, context: &str, end: ItemKind) -> ParseResult<PipeNode> {
        let mut pipe = PipeNode {
            pos: self.peek_non_space().pos,
            is_assign: false,
            decl: Vec::new(),
            cmds: Vec::new(),
        };
        self.declarations(&mut pipe, context)?;
        loop {
            let token = self.next_non_space();
            match token.kind {
                kind if kind == end => {
                    self.check_pipeline(&pipe, context)?;
                    return Ok(pipe);
                }
                ItemKind::Bool
                | ItemKind::CharConstant
                | ItemKind::Dot
                | ItemKind::Field
                | ItemKind::Identifier
                | ItemKind::Number
                | ItemKind::Nil
                | ItemKind::RawString
                | ItemKind::String
                | ItemKind::Variable
                | ItemKind::LeftParen => {
                    self.backup();
                    let command = self.command()?;
                    pipe.cmds.push(command);
                }
                _ => return self.unexpected(&token, context),
            }
        }
    }

    /// Parse `$x :=`, `$x =` or, in a range, `$i, $e :=`.
    fn declarations(&mut self, pipe: &mut PipeNode, context: &str) -> ParseResult<()> {
        loop {
            let variable = self.peek_non_space();
            if variable.kind != ItemKind::Variable {
                return Ok(());
            }
            let mark = self.cursor;
            self.next();
            let next = self.peek_non_space();
            match next.kind {
                ItemKind::Assign | ItemKind::Declare => {
                    pipe.is_assign = next.kind == ItemKind::Assign;
                    self.next_non_space();
                    self.declare(pipe, variable);
                    return Ok(());
                }
                ItemKind::Char if next.val == "," => {
                    self.next_non_space();
                    self.declare(pipe, variable);
                    if context == "range" && pipe.decl.len() < 2 {
                        match self.peek_non_space().kind {
                            ItemKind::Variable | ItemKind::RightDelim | ItemKind::RightParen => {
                                continue;
                            }
                            _ => return self.error("range can only initialize variables"),
                        }
                    }
                    return self.error(format!("too many declarations in {context}"));
                }
                _ => {
                    // Not a declaration; the variable is an operand.
                    self.cursor = mark;
                    return Ok(());
                }
            }
        }
    }

    fn declare(&mut self, pipe: &mut PipeNode, variable: Item) {
        pipe.decl.push(VariableNode {
            pos: variable.pos,
            ident: vec![variable.val.clone()],
        });
        self.vars.push(variable.val);
    }

    fn check_pipeline(&self, pipe: &PipeNode, context: &str) -> ParseResult<()> {
        if pipe.cmds.is_empty() {
            return self.error(format!("missing value for {context}"));
        }
        for (i, command) in pipe.cmds.iter().enumerate().skip(1) {
            if let Some(
                Node::Bool(_) | Node::Dot(_) | Node::Nil(_) | Node::Number(_) | Node::String(_),
            ) = command.args.first()
            {
                return self.error(format!(
                    "non executable command in pipeline stage {}",
                    i + 1
                ));
            }
        }
        Ok(())
    }

    fn command(&mut self) -> ParseResult<CommandNode> {
        let mut command = CommandNode {
            pos: self.peek_non_space().pos,
            args: Vec::new(),
        };
        loop {
            self.peek_non_space();
            if let Some(operand) = self.operand()? {
                command.args.push(operand);
            }
            let token = self.next();
            match token.kind {
                ItemKind::Space => continue,
                ItemKind::RightDelim | ItemKind::RightParen => self.backup(),
                ItemKind::Pipe => {}
                _ => return self.unexpected(&token, "operand"),
            }
            break;
        }
        if command.args.is_empty() {
            return self.error("empty command");
        }
        Ok(command)
    }

    /// A term possibly followed by field accesses.
    fn operand(&mut self) -> ParseResult<Option<Node>> {
        let Some(node) = self.term()? else {
            return Ok(None);
        };
        if self.peek().kind != ItemKind::Field {
            return Ok(Some(node));
        }
        let pos = self.peek().pos;
        let mut field = Vec::new();
        while self.peek().kind == ItemKind::Field {
            let item = self.next();
            field.push(item.val[1..].to_string());
        }
        match node {
            // `$x.A.B` stays a variable with a longer path.
            Node::Variable(mut variable) => {
                variable.ident.extend(field);
                Ok(Some(Node::Variable(variable)))
            }
            Node::Bool(_) | Node::String(_) | Node::Number(_) | Node::Nil(_) | Node::Dot(_) => {
                self.error(format!("unexpected . after term {:?}", node.to_string()))
            }
            base => Ok(Some(Node::Chain(ChainNode {
                pos,
                node: Box::new(base),
                field,
            }))),
        }
    }

    fn term(&mut self) -> ParseResult<Option<Node>> {
        let token = self.next_non_space();
        let pos = token.pos;
        let node = match token.kind {
            ItemKind::Identifier => {
                if !self.funcs.has_func(&token.val) {
                    return self.error(format!("function {:?} not defined", token.val));
                }
                Node::Identifier(IdentifierNode {
                    pos,
                    ident: token.val,
                })
            }
            ItemKind::Dot => Node::Dot(DotNode { pos }),
            ItemKind::Nil => Node::Nil(NilNode { pos }),
            ItemKind::Variable => Node::Variable(self.use_var(pos, token.val)?),
            ItemKind::Field => Node::Field(FieldNode {
                pos,
                ident: token.val[1..].split('.').map(str::to_string).collect(),
            }),
            ItemKind::Bool => Node::Bool(BoolNode {
                pos,
                value: token.val == "true",
            }),
            ItemKind::CharConstant | ItemKind::Number => {
                Node::Number(self.number(pos, &token.val, token.kind)?)
            }
            ItemKind::LeftParen => {
                self.enter()?;
                let pipe = self.pipeline("parenthesized pipeline", ItemKind::RightParen)?;
                self.leave();
                Node::Pipe(pipe)
            }
            ItemKind::String | ItemKind::RawString => match unquote(&token.val) {
                Ok(text) => Node::String(StringNode {
                    pos,
                    quoted: token.val,
                    text,
                }),
                Err(message) => return self.error(message),
            },
            _ => {
                self.backup();
                return Ok(None);
            }
        };
        Ok(Some(node))
    }

    fn use_var(&self, pos: Pos, name: String) -> ParseResult<VariableNode> {
        if !self.vars.contains(&name) {
            return self.error(format!("undefined variable {name:?}"));
        }
        Ok(VariableNode {
            pos,
            ident: vec![name],
        })
    }

    fn number(&self, pos: Pos, text: &str, kind: ItemKind) -> ParseResult<NumberNode> {
        let mut number = NumberNode {
            pos,
            is_int: false,
            is_uint: false,
            is_float: false,
            int: 0,
            uint: 0,
            float: 0.0,
            text: text.to_string(),
        };
        if kind == ItemKind::CharConstant {
            let c = match unquote_char(text) {
                Ok(c) => c,
                Err(message) => return self.error(message),
            };
            number.is_int = true;
            number.int = i64::from(u32::from(c));
            number.is_uint = true;
            number.uint = u64::from(u32::from(c));
            number.is_float = true;
            number.float = f64::from(u32::from(c));
            return Ok(number);
        }
        let literal = IntLiteral::split(text);
        if let Some(uint) = literal.as_ref().and_then(IntLiteral::to_u64) {
            number.is_uint = true;
            number.uint = uint;
        }
        if let Some(int) = literal.as_ref().and_then(IntLiteral::to_i64) {
            number.is_int = true;
            number.int = int;
            if int == 0 {
                number.is_uint = true;
                number.uint = 0;
            }
        }
        if number.is_int {
            number.is_float = true;
            number.float = int_to_float(number.int);
        } else if number.is_uint {
            number.is_float = true;
            number.float = uint_to_float(number.uint);
        } else if let Ok(float) = text.replace('_', "").parse::<f64>() {
            // Looks like an integer but did not fit in one.
            if !text.contains(['.', 'e', 'E', 'p', 'P']) {
                return self.error(format!("integer overflow: {text}"));
            }
            number.is_float = true;
            number.float = float;
            if let Some(int) = float_to_int(float) {
                number.is_int = true;
                number.int = int;
            }
            if let Some(uint) = float_to_uint(float) {
                number.is_uint = true;
                number.uint = uint;
            }
        }
        if !number.is_int && !number.is_float {
            return self.error(format!("illegal number syntax: {text:?}"));
        }
        Ok(number)
    }
}

#[allow(clippy::cast_precision_loss)]
fn int_to_float(int: i64) -> f64 {
    int as f64
}

/// The integer a float holds exactly, if any.
#[allow(clippy::cast_possible_truncation)]
fn float_to_int(float: f64) -> Option<i64> {
    (float.fract() == 0.0 && float.abs() < 9.2e18).then(|| float as i64)
}

#[allow(clippy::cast_precision_loss)]
fn uint_to_float(uint: u64) -> f64 {
    uint as f64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_to_uint(float: f64) -> Option<u64> {
    (float.fract() == 0.0 && (0.0..1.8e19).contains(&float)).then(|| float as u64)
}

/// An integer literal split into sign, base and digits.
struct IntLiteral {
    sign: Option<char>,
    radix: u32,
    digits: String,
}

impl IntLiteral {
    fn split(text: &str) -> Option<Self> {
        let cleaned = text.replace('_', "").to_ascii_lowercase();
        let (sign, unsigned) = match cleaned.chars().next()? {
            c @ ('-' | '+') => (Some(c), &cleaned[1..]),
            _ => (None, cleaned.as_str()),
        };
        let (radix, digits) = if let Some(rest) = unsigned.strip_prefix("0x") {
            (16, rest)
        } else if let Some(rest) = unsigned.strip_prefix("0o") {
            (8, rest)
        } else if let Some(rest) = unsigned.strip_prefix("0b") {
            (2, rest)
        } else if unsigned.len() > 1 && unsigned.starts_with('0') {
            (8, &unsigned[1..])
        } else {
            (10, unsigned)
        };
        if digits.is_empty() || digits.starts_with(['+', '-']) {
            return None;
        }
        Some(Self {
            sign,
            radix,
            digits: digits.to_string(),
        })
    }

    /// The signed value, parsed with its sign so `i64::MIN` fits.
    fn to_i64(&self) -> Option<i64> {
        let signed = match self.sign {
            Some('-') => format!("-{}", self.digits),
            _ => self.digits.clone(),
        };
        i64::from_str_radix(&signed, self.radix).ok()
    }

    /// The unsigned value; only unsigned literals qualify.
    fn to_u64(&self) -> Option<u64> {
        if self.sign.is_some() {
            return None;
        }
        u64::from_str_radix(&self.digits, self.radix).ok()
    }
}
