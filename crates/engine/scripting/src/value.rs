//! Snapshots of namespace bindings

use mlua::prelude::*;
use std::collections::{HashMap, HashSet};
use std::ffi::c_void;

/// Tables nested deeper than this are reported as opaque
const MAX_DEPTH: usize = 32;

/// 2^63; floats at or beyond this magnitude have no `i64` counterpart
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// A value read out of the namespace
///
/// This is a copy, not a live reference: mutating it does not touch the engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Unbound name or explicit `nil`
    #[default]
    Nil,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value (lossy UTF-8)
    String(String),
    /// Table with a sequence part
    Array(Vec<Value>),
    /// Table keyed by strings
    Map(HashMap<String, Value>),
    /// Functions, userdata, threads, over-deep tables and tables already
    /// copied elsewhere in the same snapshot, by Lua type name
    Opaque(&'static str),
}

impl Value {
    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Opaque(name) => name,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integers, and floats with no fractional part that fit in an `i64`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < I64_LIMIT => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Snapshot a Lua value
    ///
    /// Each table is copied at most once per snapshot. A table reached again,
    /// through a cycle or a second path, is recorded as `Opaque("table")`.
    pub fn from_lua_value(val: &LuaValue) -> LuaResult<Self> {
        let mut seen = HashSet::new();
        Self::convert(val, 0, &mut seen)
    }

    fn convert(val: &LuaValue, depth: usize, seen: &mut HashSet<*const c_void>) -> LuaResult<Self> {
        match val {
            LuaValue::Nil => Ok(Value::Nil),
            LuaValue::Boolean(b) => Ok(Value::Bool(*b)),
            LuaValue::Integer(i) => Ok(Value::Int(*i)),
            LuaValue::Number(n) => Ok(Value::Float(*n)),
            LuaValue::String(s) => Ok(Value::String(s.to_string_lossy())),
            LuaValue::Table(_) if depth >= MAX_DEPTH => Ok(Value::Opaque("table")),
            LuaValue::Table(t) if !seen.insert(t.to_pointer()) => Ok(Value::Opaque("table")),
            LuaValue::Table(t) => {
                // A sequence part means array, anything else is read as a map
                let len = t.raw_len();
                if len > 0 {
                    let mut arr = Vec::with_capacity(len);
                    for i in 1..=len {
                        let v: LuaValue = t.raw_get(i)?;
                        arr.push(Self::convert(&v, depth + 1, seen)?);
                    }
                    Ok(Value::Array(arr))
                } else {
                    let mut map = HashMap::new();
                    for pair in t.pairs::<LuaValue, LuaValue>() {
                        let (k, v) = pair?;
                        if let LuaValue::String(key) = k {
                            map.insert(key.to_string_lossy(), Self::convert(&v, depth + 1, seen)?);
                        }
                    }
                    Ok(Value::Map(map))
                }
            }
            other => Ok(Value::Opaque(other.type_name())),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}
