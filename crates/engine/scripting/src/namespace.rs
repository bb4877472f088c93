//! The persistent Lua namespace
//!
//! One [`EngineNamespace`] wraps one Lua state. Every evaluation runs against
//! its globals table, so bindings made by one chunk stay visible to the next:
//! helpers defined by the bootstrap script, or by a document run earlier,
//! accumulate for the lifetime of the namespace.

use crate::{EngineError, Result, Value};
use mlua::prelude::*;
use std::cell::Cell;
use std::fmt;
use tracing::debug;

/// Chunk name used when the caller does not supply one
const ANONYMOUS_CHUNK: &str = "=chunk";

/// Dispatch target produced by the bootstrap script
///
/// Holds a reference to a table living in the namespace that created it; only
/// pass it back to that same [`EngineNamespace`].
#[derive(Clone)]
pub struct GlueHandle {
    name: String,
    table: LuaTable,
}

impl GlueHandle {
    /// Name of the global the handle was read from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying Lua table
    pub fn table(&self) -> &LuaTable {
        &self.table
    }

    /// Whether `field` holds a function; optional hooks are skipped when not
    pub fn has_function(&self, field: &str) -> bool {
        matches!(self.table.get::<LuaValue>(field), Ok(LuaValue::Function(_)))
    }
}

impl fmt::Debug for GlueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlueHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Marks the namespace busy for as long as it lives
struct EvalGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> EvalGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Result<Self> {
        if flag.replace(true) {
            return Err(EngineError::Reentrant);
        }
        Ok(Self { flag })
    }
}

impl Drop for EvalGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Lua state plus the single global namespace every script shares
pub struct EngineNamespace {
    lua: Lua,
    evaluating: Cell<bool>,
}

impl EngineNamespace {
    /// Create a fresh namespace with the Lua standard library loaded
    pub fn new() -> Self {
        Self {
            lua: Lua::new(),
            evaluating: Cell::new(false),
        }
    }

    /// Get the underlying Lua state
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Whether an evaluation or dispatch is currently on the stack
    pub fn is_evaluating(&self) -> bool {
        self.evaluating.get()
    }

    /// Execute source text as a top-level chunk
    pub fn evaluate(&self, source: &str) -> Result<()> {
        self.evaluate_chunk(ANONYMOUS_CHUNK, source.as_bytes())
    }

    /// Execute raw bytes as a named chunk
    ///
    /// `name` follows Lua conventions: `@path` for files, `=label` for a
    /// literal label in tracebacks.
    pub fn evaluate_chunk(&self, name: &str, source: &[u8]) -> Result<()> {
        let _guard = EvalGuard::enter(&self.evaluating)?;
        debug!(chunk = name, bytes = source.len(), "evaluating");
        self.lua.load(source).set_name(name).exec()?;
        Ok(())
    }

    /// Snapshot a global binding; unbound names read as [`Value::Nil`]
    pub fn attribute(&self, name: &str) -> Result<Value> {
        let value: LuaValue = self.lua.globals().get(name)?;
        Ok(Value::from_lua_value(&value)?)
    }

    /// Get a global converted to a Rust type
    pub fn get<T: FromLua>(&self, name: &str) -> Result<T> {
        let value = self.lua.globals().get(name)?;
        Ok(value)
    }

    /// Bind a global
    pub fn set<T: IntoLua>(&self, name: &str, value: T) -> Result<()> {
        self.lua.globals().set(name, value)?;
        Ok(())
    }

    /// Resolve the global `name` as a dispatch table
    pub fn glue(&self, name: &str) -> Result<GlueHandle> {
        match self.lua.globals().get::<LuaValue>(name)? {
            LuaValue::Table(table) => Ok(GlueHandle {
                name: name.to_string(),
                table,
            }),
            LuaValue::Nil => Err(EngineError::MissingAttribute(name.to_string())),
            other => Err(EngineError::TypeError {
                name: name.to_string(),
                expected: "table".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    /// Call `target[method](arg)`
    ///
    /// The field is called as a plain function with a single string argument;
    /// no implicit `self` is passed.
    pub fn call_method(&self, target: &GlueHandle, method: &str, arg: &str) -> Result<()> {
        let _guard = EvalGuard::enter(&self.evaluating)?;
        let qualified = format!("{}.{}", target.name, method);
        debug!(method = %qualified, arg, "dispatching");

        match target.table.get::<LuaValue>(method)? {
            LuaValue::Function(func) => {
                func.call::<()>(arg)?;
                Ok(())
            }
            LuaValue::Nil => Err(EngineError::MissingAttribute(qualified)),
            other => Err(EngineError::TypeError {
                name: qualified,
                expected: "function".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }
}

impl Default for EngineNamespace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_bindings_persist_between_evaluations() {
        let ns = EngineNamespace::new();
        ns.evaluate("x = 1").unwrap();
        ns.evaluate("y = x + 1").unwrap();

        assert_eq!(ns.attribute("y").unwrap(), Value::Int(2));
        assert_eq!(ns.get::<i64>("x").unwrap(), 1);
    }

    #[test]
    fn test_unbound_attribute_is_nil() {
        let ns = EngineNamespace::new();
        assert!(ns.attribute("nothing_here").unwrap().is_nil());
    }

    #[test]
    fn test_runtime_error_is_returned() {
        let ns = EngineNamespace::new();
        let err = ns
            .evaluate_chunk("=broken", b"error('boom')")
            .unwrap_err();

        assert!(matches!(err, EngineError::Lua(_)));
        let rendered = err.render();
        assert!(rendered.contains("boom"), "{rendered}");
        assert!(rendered.contains("broken"), "{rendered}");
        assert!(!ns.is_evaluating());
    }

    #[test]
    fn test_syntax_error_is_returned() {
        let ns = EngineNamespace::new();
        assert!(matches!(ns.evaluate("x = = 1"), Err(EngineError::Lua(_))));
        // namespace stays usable
        ns.evaluate("x = 3").unwrap();
        assert_eq!(ns.get::<i64>("x").unwrap(), 3);
    }

    #[test]
    fn test_set_then_read_from_lua() {
        let ns = EngineNamespace::new();
        ns.set("greeting", "hello").unwrap();
        ns.evaluate("shout = greeting:upper()").unwrap();
        assert_eq!(ns.attribute("shout").unwrap().as_str(), Some("HELLO"));
    }

    #[test]
    fn test_glue_lookup() {
        let ns = EngineNamespace::new();
        assert!(matches!(
            ns.glue("glue"),
            Err(EngineError::MissingAttribute(name)) if name == "glue"
        ));

        ns.evaluate("glue = 5").unwrap();
        assert!(matches!(ns.glue("glue"), Err(EngineError::TypeError { .. })));

        ns.evaluate("glue = {}").unwrap();
        assert_eq!(ns.glue("glue").unwrap().name(), "glue");
    }

    #[test]
    fn test_call_method_passes_single_argument() {
        let ns = EngineNamespace::new();
        ns.evaluate(
            r#"
            seen = {}
            glue = {}
            glue.runScript = function(name) table.insert(seen, name) end
        "#,
        )
        .unwrap();

        let glue = ns.glue("glue").unwrap();
        ns.call_method(&glue, "runScript", "first").unwrap();
        ns.call_method(&glue, "runScript", "second").unwrap();

        assert_eq!(ns.attribute("seen").unwrap(), Value::from(vec!["first", "second"]));
    }

    #[test]
    fn test_attribute_of_interlinked_stdlib_tables() {
        let ns = EngineNamespace::new();

        let package = ns.attribute("package").unwrap();
        let package = package.as_map().unwrap();
        assert!(package["path"].as_str().is_some());
        assert!(package.contains_key("loaded"));

        assert!(ns.attribute("_G").unwrap().as_map().is_some());
    }

    #[test]
    fn test_call_missing_method() {
        let ns = EngineNamespace::new();
        ns.evaluate("glue = {}").unwrap();
        let glue = ns.glue("glue").unwrap();

        let err = ns.call_method(&glue, "runScript", "x").unwrap_err();
        assert!(matches!(err, EngineError::MissingAttribute(name) if name == "glue.runScript"));
    }

    #[test]
    fn test_has_function() {
        let ns = EngineNamespace::new();
        ns.evaluate("glue = { runScript = function() end, label = 'x' }")
            .unwrap();
        let glue = ns.glue("glue").unwrap();

        assert!(glue.has_function("runScript"));
        assert!(!glue.has_function("label"));
        assert!(!glue.has_function("onNewDocument"));
    }

    #[test]
    fn test_nested_evaluation_is_rejected() {
        let ns = Rc::new(EngineNamespace::new());
        let inner = Rc::downgrade(&ns);

        let reenter = ns
            .lua()
            .create_function(move |_, source: String| {
                let ns = inner.upgrade().expect("namespace alive");
                let rejected = matches!(ns.evaluate(&source), Err(EngineError::Reentrant));
                Ok(rejected)
            })
            .unwrap();
        ns.set("reenter", reenter).unwrap();

        ns.evaluate("rejected = reenter('leaked = true')").unwrap();

        assert_eq!(ns.attribute("rejected").unwrap(), Value::Bool(true));
        assert!(ns.attribute("leaked").unwrap().is_nil());
        assert!(!ns.is_evaluating());
    }
}
