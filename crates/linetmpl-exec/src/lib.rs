//! Execution engine for linetmpl templates.
//!
//! Templates are parsed by `linetmpl-syntax` and executed here against a
//! [`serde_json::Value`] data context. The engine provides:
//! - [`Template`], a named set of parse trees with builder-style configuration
//! - [`FuncMap`], the function table shared by the parser and the executor
//! - The builtin functions (`and`, `or`, `len`, `index`, `printf`, `eq`, ...)
//!
//! # Example
//!
//! ```
//! use linetmpl_exec::{FuncMap, Template};
//! use serde_json::{json, Value};
//!
//! let funcs = FuncMap::new().with("shout", |args: &[Value]| {
//!     Ok(json!(args[0].as_str().unwrap_or_default().to_uppercase()))
//! });
//! let tmpl = Template::new("t")
//!     .delims("[", "]")
//!     .funcs(funcs)
//!     .parse("[.Greeting | shout], [.Name]!")
//!     .unwrap();
//! let out = tmpl.render(&json!({"Greeting": "hello", "Name": "Ann"})).unwrap();
//! assert_eq!(out, "HELLO, Ann!");
//! ```

mod builtins;
pub mod error;
mod exec;
pub mod funcs;
pub mod printf;
pub mod template;
pub mod value;

pub use builtins::builtin_names;
pub use error::{ExecError, ExecResult, FuncError};
pub use exec::MAX_EXEC_DEPTH;
pub use funcs::{Func, FuncMap};
pub use printf::sprintf;
pub use template::{MissingKey, Template};
