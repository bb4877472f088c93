//! Embedded Lua engine for the scriptpad host
//!
//! This crate provides:
//! - **EngineNamespace**: one Lua state whose globals persist across evaluations
//! - **GlueHandle**: reference to the dispatch table a bootstrap script defines
//! - **Value**: snapshots of namespace bindings
//! - **normalize**: CR / CRLF to LF rewriting for editor buffers
//!
//! # Example
//!
//! ```rust,ignore
//! use scripting::{EngineNamespace, EolMode, normalize};
//!
//! let ns = EngineNamespace::new();
//! ns.evaluate("x = 1")?;
//!
//! let text = normalize(b"y = x + 1\r\n", EolMode::CrLf);
//! ns.evaluate_chunk("=buffer", &text)?;
//!
//! assert_eq!(ns.attribute("y")?.as_i64(), Some(2));
//! ```

mod eol;
mod error;
mod namespace;
mod value;

pub use eol::{normalize, EolMode};
pub use error::{EngineError, Result};
pub use namespace::{EngineNamespace, GlueHandle};
pub use value::Value;

// Re-export mlua for downstream crates
pub use mlua;
