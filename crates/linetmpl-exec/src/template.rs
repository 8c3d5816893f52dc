//! Named template sets and their execution entry points.

use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

use linetmpl_syntax::{Delims, ParseError, Parser, Tree, TreeSet};
use serde_json::Value;
use tracing::debug;

use crate::error::{ExecError, ExecResult};
use crate::exec::State;
use crate::funcs::FuncMap;

/// What a field lookup does when an object has no entry for the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingKey {
    /// Yield no value; an action printing it writes `<no value>`.
    #[default]
    Default,
    /// Stop execution with an error.
    Error,
}

impl FromStr for MissingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" | "invalid" | "zero" => Ok(Self::Default),
            "error" => Ok(Self::Error),
            other => Err(format!("unrecognized missingkey option {other:?}")),
        }
    }
}

impl fmt::Display for MissingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A set of named parse trees sharing a function table, with one of them
/// designated as the entry point.
///
/// ```
/// use linetmpl_exec::Template;
/// use serde_json::json;
///
/// let tmpl = Template::new("hello").parse("Hi {{.Name}}").unwrap();
/// assert_eq!(tmpl.render(&json!({"Name": "Ann"})).unwrap(), "Hi Ann");
/// ```
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    delims: Delims,
    funcs: Arc<FuncMap>,
    missing_key: MissingKey,
    trees: TreeSet,
}

impl Template {
    /// Create an empty template set whose entry point is `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delims: Delims::default(),
            funcs: Arc::new(FuncMap::new()),
            missing_key: MissingKey::Default,
            trees: TreeSet::new(),
        }
    }

    /// Bind trees that were parsed elsewhere.
    #[must_use]
    pub fn from_trees(name: impl Into<String>, trees: TreeSet, funcs: Arc<FuncMap>) -> Self {
        Self {
            trees,
            funcs,
            ..Self::new(name)
        }
    }

    /// Set the action delimiters used by later calls to [`parse`](Self::parse).
    /// Empty strings select the defaults.
    #[must_use]
    pub fn delims(mut self, left: &str, right: &str) -> Self {
        self.delims = Delims::new(left, right);
        self
    }

    /// Set the function table. Must happen before parsing.
    #[must_use]
    pub fn funcs(mut self, funcs: impl Into<Arc<FuncMap>>) -> Self {
        self.funcs = funcs.into();
        self
    }

    /// Set the missing-key behavior.
    #[must_use]
    pub const fn option(mut self, missing_key: MissingKey) -> Self {
        self.missing_key = missing_key;
        self
    }

    /// Parse `source` and add its trees to the set.
    ///
    /// A later definition replaces an earlier one of the same name unless the
    /// later one is empty.
    pub fn parse(mut self, source: &str) -> Result<Self, ParseError> {
        debug!(name = %self.name, len = source.len(), "parse");
        let trees = Parser::parse(&self.name, source, &self.delims, &*self.funcs)?;
        for (name, tree) in trees {
            let keep_existing = tree.is_empty()
                && self.trees.get(&name).is_some_and(|existing| !existing.is_empty());
            if !keep_existing {
                self.trees.insert(name, tree);
            }
        }
        Ok(self)
    }

    /// Name of the entry-point template.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A tree by template name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Tree> {
        self.trees.get(name)
    }

    /// Names of all templates in the set, in definition order.
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.trees.keys().map(String::as_str)
    }

    /// The function table.
    #[must_use]
    pub fn func_map(&self) -> &FuncMap {
        &self.funcs
    }

    /// The missing-key behavior.
    #[must_use]
    pub const fn missing_key(&self) -> MissingKey {
        self.missing_key
    }

    /// Execute the entry-point template against `data`.
    pub fn execute<W: Write>(&self, out: &mut W, data: &Value) -> ExecResult<()> {
        self.execute_template(out, &self.name, data)
    }

    /// Execute the named template of the set against `data`.
    pub fn execute_template<W: Write>(&self, out: &mut W, name: &str, data: &Value) -> ExecResult<()> {
        let Some(tree) = self.lookup(name) else {
            return Err(ExecError::NoTemplate {
                name: name.to_string(),
                set: self.name.clone(),
            });
        };
        debug!(template = name, "execute");
        State::new(self, tree, out, data).run(data)
    }

    /// Execute the entry-point template and collect the output.
    pub fn render(&self, data: &Value) -> ExecResult<String> {
        let mut buf = Vec::new();
        self.execute(&mut buf, data)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_key_options() {
        assert_eq!("zero".parse::<MissingKey>(), Ok(MissingKey::Default));
        assert_eq!("error".parse::<MissingKey>(), Ok(MissingKey::Error));
        assert!("bogus".parse::<MissingKey>().is_err());
        assert_eq!(MissingKey::Error.to_string(), "error");
    }

    #[test]
    fn empty_redefinition_keeps_body() {
        let tmpl = Template::new("t")
            .parse(r#"{{define "x"}}body{{end}}"#)
            .unwrap()
            .parse(r#"{{define "x"}}  {{end}}{{template "x"}}"#)
            .unwrap();
        assert_eq!(tmpl.render(&json!({})).unwrap(), "body");
    }

    #[test]
    fn later_definition_replaces_earlier() {
        let tmpl = Template::new("t")
            .parse(r#"{{define "x"}}one{{end}}"#)
            .unwrap()
            .parse(r#"{{define "x"}}two{{end}}{{template "x"}}"#)
            .unwrap();
        assert_eq!(tmpl.render(&json!({})).unwrap(), "two");
        assert_eq!(tmpl.templates().collect::<Vec<_>>(), vec!["x", "t"]);
    }

    #[test]
    fn unknown_entry_point() {
        let tmpl = Template::new("t").parse("x").unwrap();
        let err = tmpl.execute_template(&mut Vec::new(), "nope", &json!({})).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"template: no template "nope" associated with template "t""#
        );
    }
}
