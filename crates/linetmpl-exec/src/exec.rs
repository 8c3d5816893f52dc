//! Tree-walking executor.
//!
//! The executor keeps a stack of variables, the template currently running,
//! and the output sink. Control-flow nodes report `break` and `continue`
//! through [`Flow`] so that `range` can act on them.

use std::io::Write;
use std::mem;

use linetmpl_syntax::{
    BranchNode, ChainNode, CommandNode, FieldNode, IdentifierNode, ListNode, Node, NodeRef,
    NumberNode, PipeNode, TemplateNode, Tree, VariableNode,
};
use serde_json::Value;
use tracing::trace;

use crate::error::{ExecError, ExecResult};
use crate::template::{MissingKey, Template};
use crate::value::{float, is_true, to_output, type_name};

/// Maximum depth of nested `template` invocations.
pub const MAX_EXEC_DEPTH: usize = 1000;

/// How control leaves a list of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    Break,
    Continue,
}

pub(crate) struct State<'a> {
    template: &'a Template,
    tree: &'a Tree,
    out: &'a mut dyn Write,
    vars: Vec<(String, Value)>,
    depth: usize,
}

impl<'a> State<'a> {
    pub(crate) fn new(template: &'a Template, tree: &'a Tree, out: &'a mut dyn Write, dot: &Value) -> Self {
        Self {
            template,
            tree,
            out,
            vars: vec![("$".to_string(), dot.clone())],
            depth: 0,
        }
    }

    pub(crate) fn run(&mut self, dot: &Value) -> ExecResult<()> {
        let tree = self.tree;
        self.walk_list(dot, &tree.root)?;
        Ok(())
    }

    fn error<T>(&self, node: NodeRef<'_>, message: impl Into<String>) -> ExecResult<T> {
        Err(ExecError::Eval {
            parse_name: self.tree.parse_name.clone(),
            line: node.pos().line,
            name: self.tree.name.clone(),
            node: node.to_string(),
            message: message.into(),
        })
    }

    // ------------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------------

    fn push(&mut self, name: &str, value: Value) {
        self.vars.push((name.to_string(), value));
    }

    fn set_var(&mut self, node: &VariableNode, value: Value) -> ExecResult<()> {
        let name = &node.ident[0];
        match self.vars.iter_mut().rev().find(|(n, _)| n == name) {
            Some(slot) => {
                slot.1 = value;
                Ok(())
            }
            None => self.error(NodeRef::Variable(node), format!("undefined variable: {name}")),
        }
    }

    /// Overwrite the `n`th variable from the top of the stack.
    fn set_top_var(&mut self, n: usize, value: Value) {
        let len = self.vars.len();
        self.vars[len - n].1 = value;
    }

    fn var_value(&self, node: &VariableNode) -> ExecResult<Value> {
        let name = &node.ident[0];
        match self.vars.iter().rev().find(|(n, _)| n == name) {
            Some((_, value)) => Ok(value.clone()),
            None => self.error(NodeRef::Variable(node), format!("undefined variable: {name}")),
        }
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn walk_list(&mut self, dot: &Value, list: &ListNode) -> ExecResult<Flow> {
        for node in &list.nodes {
            let flow = self.walk(dot, node)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn walk(&mut self, dot: &Value, node: &Node) -> ExecResult<Flow> {
        trace!(kind = node.kind_name(), pos = %node.pos(), "walk");
        match node {
            Node::Text(text) => self.out.write_all(text.text.as_bytes())?,
            Node::Comment(_) => {}
            Node::Action(action) => {
                let value = self.eval_pipeline(dot, &action.pipe)?;
                if action.pipe.decl.is_empty() {
                    self.out.write_all(to_output(&value).as_bytes())?;
                }
            }
            Node::If(branch) => return self.walk_if_or_with(dot, branch, false),
            Node::With(branch) => return self.walk_if_or_with(dot, branch, true),
            Node::Range(branch) => return self.walk_range(dot, branch),
            Node::Template(invocation) => self.walk_template(dot, invocation)?,
            Node::Break(_) => return Ok(Flow::Break),
            Node::Continue(_) => return Ok(Flow::Continue),
            other => return self.error(other.into(), format!("unknown node: {other}")),
        }
        Ok(Flow::Normal)
    }

    fn walk_if_or_with(&mut self, dot: &Value, branch: &BranchNode, is_with: bool) -> ExecResult<Flow> {
        let mark = self.vars.len();
        let value = self.eval_pipeline(dot, &branch.pipe)?;
        let flow = if is_true(&value) {
            let dot = if is_with { &value } else { dot };
            self.walk_list(dot, &branch.list)
        } else if let Some(else_list) = &branch.else_list {
            self.walk_list(dot, else_list)
        } else {
            Ok(Flow::Normal)
        };
        self.vars.truncate(mark);
        flow
    }

    fn walk_range(&mut self, dot: &Value, branch: &BranchNode) -> ExecResult<Flow> {
        let outer = self.vars.len();
        let value = self.eval_pipeline(dot, &branch.pipe)?;
        let mark = self.vars.len();
        let node = NodeRef::Range(branch);

        let elements: Vec<(Value, Value)> = match &value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| (Value::from(i), item.clone()))
                .collect(),
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                keys.into_iter()
                    .map(|key| (Value::from(key.as_str()), map[key].clone()))
                    .collect()
            }
            Value::Number(n) if n.as_i64().is_some() => {
                if branch.pipe.decl.len() > 1 {
                    return self.error(
                        node,
                        format!("can't use {n} to iterate over more than one variable"),
                    );
                }
                let count = n.as_i64().unwrap_or(0);
                (0..count.max(0)).map(|i| (Value::from(i), Value::from(i))).collect()
            }
            Value::Null => Vec::new(),
            other => {
                return self.error(node, format!("range can't iterate over {}", to_output(other)));
            }
        };

        let mut ran = false;
        for (index, element) in elements {
            ran = true;
            self.bind_range_vars(&branch.pipe, index, element.clone())?;
            let flow = self.walk_list(&element, &branch.list)?;
            self.vars.truncate(mark);
            if flow == Flow::Break {
                break;
            }
        }
        let result = match &branch.else_list {
            Some(else_list) if !ran => self.walk_list(dot, else_list),
            _ => Ok(Flow::Normal),
        };
        self.vars.truncate(outer);
        result
    }

    fn bind_range_vars(&mut self, pipe: &PipeNode, index: Value, element: Value) -> ExecResult<()> {
        match (pipe.decl.as_slice(), pipe.is_assign) {
            ([], _) => {}
            ([var], true) => self.set_var(var, element)?,
            ([index_var, element_var, ..], true) => {
                self.set_var(index_var, index)?;
                self.set_var(element_var, element)?;
            }
            ([_], false) => self.set_top_var(1, element),
            (_, false) => {
                self.set_top_var(1, element);
                self.set_top_var(2, index);
            }
        }
        Ok(())
    }

    fn walk_template(&mut self, dot: &Value, invocation: &TemplateNode) -> ExecResult<()> {
        let node = NodeRef::Template(invocation);
        let template = self.template;
        let Some(tree) = template.lookup(&invocation.name) else {
            return self.error(node, format!("template {:?} not defined", invocation.name));
        };
        if self.depth >= MAX_EXEC_DEPTH {
            return self.error(
                node,
                format!("exceeded maximum template depth ({MAX_EXEC_DEPTH})"),
            );
        }
        let new_dot = match &invocation.pipe {
            Some(pipe) => self.eval_pipeline(dot, pipe)?,
            None => Value::Null,
        };
        let saved_tree = mem::replace(&mut self.tree, tree);
        let saved_vars = mem::replace(&mut self.vars, vec![("$".to_string(), new_dot.clone())]);
        self.depth += 1;
        let result = self.walk_list(&new_dot, &tree.root);
        self.depth -= 1;
        self.vars = saved_vars;
        self.tree = saved_tree;
        result.map(|_| ())
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    fn eval_pipeline(&mut self, dot: &Value, pipe: &PipeNode) -> ExecResult<Value> {
        let mut value = None;
        for command in &pipe.cmds {
            value = Some(self.eval_command(dot, command, value)?);
        }
        let value = value.unwrap_or(Value::Null);
        for variable in &pipe.decl {
            if pipe.is_assign {
                self.set_var(variable, value.clone())?;
            } else {
                self.push(&variable.ident[0], value.clone());
            }
        }
        Ok(value)
    }

    fn eval_command(&mut self, dot: &Value, command: &CommandNode, last: Option<Value>) -> ExecResult<Value> {
        let Some(first) = command.args.first() else {
            return self.error(NodeRef::Command(command), "empty command");
        };
        match first {
            Node::Field(field) => return self.eval_field_node(dot, field, &command.args, last),
            Node::Chain(chain) => return self.eval_chain_node(dot, chain, &command.args, last),
            Node::Identifier(ident) => return self.eval_function(dot, ident, command, last),
            Node::Pipe(pipe) => {
                self.not_a_function(&command.args, last.as_ref())?;
                return self.eval_pipeline(dot, pipe);
            }
            Node::Variable(variable) => {
                return self.eval_variable_node(variable, &command.args, last);
            }
            _ => {}
        }
        self.not_a_function(&command.args, last.as_ref())?;
        match first {
            Node::Bool(b) => Ok(Value::Bool(b.value)),
            Node::Dot(_) => Ok(dot.clone()),
            Node::Nil(_) => self.error(first.into(), "nil is not a command"),
            Node::Number(n) => Ok(number(n)),
            Node::String(s) => Ok(Value::String(s.text.clone())),
            other => self.error(other.into(), format!("can't evaluate command {other}")),
        }
    }

    fn not_a_function(&self, args: &[Node], last: Option<&Value>) -> ExecResult<()> {
        if args.len() > 1 || last.is_some() {
            return self.error(
                (&args[0]).into(),
                format!("can't give argument to non-function {}", args[0]),
            );
        }
        Ok(())
    }

    fn eval_field_node(
        &mut self,
        dot: &Value,
        field: &FieldNode,
        args: &[Node],
        last: Option<Value>,
    ) -> ExecResult<Value> {
        self.eval_field_chain(NodeRef::Field(field), dot.clone(), &field.ident, args, last)
    }

    fn eval_chain_node(
        &mut self,
        dot: &Value,
        chain: &ChainNode,
        args: &[Node],
        last: Option<Value>,
    ) -> ExecResult<Value> {
        if chain.field.is_empty() {
            return self.error(NodeRef::Chain(chain), "chain has no fields");
        }
        if let Node::Nil(_) = chain.node.as_ref() {
            return self.error(
                NodeRef::Chain(chain),
                format!("indirection through explicit nil in {chain}"),
            );
        }
        let receiver = self.eval_arg(dot, &chain.node)?;
        self.eval_field_chain(NodeRef::Chain(chain), receiver, &chain.field, args, last)
    }

    fn eval_variable_node(
        &self,
        variable: &VariableNode,
        args: &[Node],
        last: Option<Value>,
    ) -> ExecResult<Value> {
        let value = self.var_value(variable)?;
        if variable.ident.len() == 1 {
            self.not_a_function(args, last.as_ref())?;
            return Ok(value);
        }
        self.eval_field_chain(NodeRef::Variable(variable), value, &variable.ident[1..], args, last)
    }

    /// Apply `idents` to `receiver` in turn. Only the last field may receive arguments.
    fn eval_field_chain(
        &self,
        node: NodeRef<'_>,
        receiver: Value,
        idents: &[String],
        args: &[Node],
        last: Option<Value>,
    ) -> ExecResult<Value> {
        let has_args = args.len() > 1 || last.is_some();
        let mut value = receiver;
        for (i, ident) in idents.iter().enumerate() {
            let final_field = i + 1 == idents.len();
            value = self.eval_field(node, ident, &value, final_field && has_args)?;
        }
        Ok(value)
    }

    fn eval_field(&self, node: NodeRef<'_>, name: &str, receiver: &Value, has_args: bool) -> ExecResult<Value> {
        match receiver {
            Value::Object(map) => {
                if has_args {
                    return self.error(node, format!("{name} is not a method but has arguments"));
                }
                match map.get(name) {
                    Some(value) => Ok(value.clone()),
                    None if self.template.missing_key() == MissingKey::Error => {
                        self.error(node, format!("map has no entry for key {name:?}"))
                    }
                    None => Ok(Value::Null),
                }
            }
            Value::Null => {
                if self.template.missing_key() == MissingKey::Error {
                    return self.error(node, format!("nil data; no entry for key {name:?}"));
                }
                Ok(Value::Null)
            }
            other => self.error(
                node,
                format!("can't evaluate field {name} in type {}", type_name(other)),
            ),
        }
    }

    fn eval_function(
        &mut self,
        dot: &Value,
        ident: &IdentifierNode,
        command: &CommandNode,
        last: Option<Value>,
    ) -> ExecResult<Value> {
        let node = NodeRef::Identifier(ident);
        let template = self.template;
        let Some(resolved) = template.func_map().find(&ident.ident) else {
            return self.error(node, format!("{:?} is not a defined function", ident.ident));
        };
        let operands = &command.args[1..];

        if let Some(name) = resolved.short_circuit() {
            if operands.is_empty() && last.is_none() {
                return self.error(
                    node,
                    format!("wrong number of args for {name}: want at least 1 got 0"),
                );
            }
            let stop_when = name == "or";
            let mut value = Value::Null;
            for operand in operands {
                value = self.eval_arg(dot, operand)?;
                if is_true(&value) == stop_when {
                    return Ok(value);
                }
            }
            if let Some(last) = last {
                value = last;
            }
            return Ok(value);
        }

        let mut values = Vec::with_capacity(operands.len() + 1);
        for operand in operands {
            values.push(self.eval_arg(dot, operand)?);
        }
        values.extend(last);
        resolved.func()(&values)
            .or_else(|err| self.error(node, format!("error calling {}: {err}", ident.ident)))
    }

    /// Evaluate a node used as a function argument or chain base.
    fn eval_arg(&mut self, dot: &Value, node: &Node) -> ExecResult<Value> {
        match node {
            Node::Dot(_) => Ok(dot.clone()),
            Node::Nil(_) => Ok(Value::Null),
            Node::Field(field) => self.eval_field_node(dot, field, std::slice::from_ref(node), None),
            Node::Variable(variable) => {
                self.eval_variable_node(variable, std::slice::from_ref(node), None)
            }
            Node::Pipe(pipe) => self.eval_pipeline(dot, pipe),
            Node::Identifier(ident) => {
                let command = CommandNode {
                    pos: ident.pos,
                    args: vec![node.clone()],
                };
                self.eval_function(dot, ident, &command, None)
            }
            Node::Chain(chain) => self.eval_chain_node(dot, chain, std::slice::from_ref(node), None),
            Node::Bool(b) => Ok(Value::Bool(b.value)),
            Node::Number(n) => Ok(number(n)),
            Node::String(s) => Ok(Value::String(s.text.clone())),
            other => self.error(other.into(), format!("can't handle {other} as an argument")),
        }
    }
}

fn number(n: &NumberNode) -> Value {
    if n.is_int {
        Value::from(n.int)
    } else if n.is_uint {
        Value::from(n.uint)
    } else {
        float(n.float)
    }
}
