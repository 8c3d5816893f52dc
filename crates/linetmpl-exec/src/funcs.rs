//! The function table consulted by the parser and the executor.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use linetmpl_syntax::FuncLookup;
use serde_json::Value;

use crate::builtins::BUILTINS;
use crate::error::FuncError;

/// A callable template function.
pub type Func = Arc<dyn Fn(&[Value]) -> Result<Value, FuncError> + Send + Sync>;

/// Maps function names to implementations.
///
/// User functions shadow builtins of the same name. The table is meant to be
/// built once and shared read-only, typically behind an [`Arc`].
#[derive(Clone, Default)]
pub struct FuncMap {
    funcs: IndexMap<String, Func>,
}

impl FuncMap {
    /// Create an empty table. Builtins are always available.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, replacing any previous one with the same name.
    pub fn insert<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, FuncError> + Send + Sync + 'static,
    {
        self.funcs.insert(name.into(), Arc::new(func));
        self
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, FuncError> + Send + Sync + 'static,
    {
        self.insert(name, func);
        self
    }

    /// A user-registered function.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Func> {
        self.funcs.get(name)
    }

    /// Resolve a name to a user function or, failing that, a builtin.
    pub(crate) fn find(&self, name: &str) -> Option<Resolved<'_>> {
        if let Some(func) = self.funcs.get(name) {
            return Some(Resolved::User(func));
        }
        BUILTINS
            .get_key_value(name)
            .map(|(&builtin, func)| Resolved::Builtin(builtin, func))
    }

    /// Names of user-registered functions, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.funcs.keys().map(String::as_str)
    }

    /// Number of user-registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    /// Whether no user functions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

/// Outcome of a function lookup.
pub(crate) enum Resolved<'a> {
    User(&'a Func),
    Builtin(&'a str, &'a Func),
}

impl Resolved<'_> {
    pub(crate) fn func(&self) -> &Func {
        match self {
            Self::User(func) | Self::Builtin(_, func) => func,
        }
    }

    /// The builtin's name when this is an `and` or `or` that must short-circuit.
    pub(crate) fn short_circuit(&self) -> Option<&str> {
        match self {
            Self::Builtin(name @ ("and" | "or"), _) => Some(*name),
            _ => None,
        }
    }
}

impl FuncLookup for FuncMap {
    fn has_func(&self, name: &str) -> bool {
        self.funcs.contains_key(name) || BUILTINS.contains_key(name)
    }
}

impl fmt::Debug for FuncMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.funcs.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn user_functions_shadow_builtins() {
        let funcs = FuncMap::new().with("len", |_: &[Value]| Ok(json!(-1)));
        let resolved = funcs.find("len").unwrap();
        assert!(matches!(resolved, Resolved::User(_)));
        assert_eq!(resolved.func()(&[json!("abc")]).unwrap(), json!(-1));
    }

    #[test]
    fn lookup_sees_builtins_and_user_functions() {
        let funcs = FuncMap::new().with("upper", |_: &[Value]| Ok(Value::Null));
        assert!(funcs.has_func("upper"));
        assert!(funcs.has_func("printf"));
        assert!(!funcs.has_func("missing"));
        assert_eq!(funcs.names().collect::<Vec<_>>(), vec!["upper"]);
    }

    #[test]
    fn and_or_short_circuit_only_as_builtins() {
        let funcs = FuncMap::new().with("or", |_: &[Value]| Ok(Value::Null));
        assert!(funcs.find("and").unwrap().short_circuit().is_some());
        assert!(funcs.find("or").unwrap().short_circuit().is_none());
    }
}
