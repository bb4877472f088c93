//! Error types for the scripting engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures raised while evaluating source text or dispatching into the namespace
#[derive(Error, Debug)]
pub enum EngineError {
    /// Lua raised an error; the message carries the rendered traceback
    #[error("{0}")]
    Lua(#[from] mlua::Error),

    /// A binding the host relies on is not defined in the namespace
    #[error("no binding named `{0}` in the namespace")]
    MissingAttribute(String),

    /// A binding exists but holds the wrong kind of value
    #[error("`{name}` is a {actual}, expected a {expected}")]
    TypeError {
        name: String,
        expected: String,
        actual: String,
    },

    /// Evaluation was requested while another evaluation is still running
    #[error("nested evaluation rejected: the namespace is already evaluating")]
    Reentrant,
}

impl EngineError {
    /// Rendered message suitable for a diagnostic channel
    pub fn render(&self) -> String {
        self.to_string()
    }
}
