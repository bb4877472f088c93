//! Error types for the script host

use scripting::EngineError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for host operations
pub type Result<T> = std::result::Result<T, HostError>;

/// Errors that can occur while hosting the engine
#[derive(Error, Debug)]
pub enum HostError {
    /// Install directory missing or empty
    #[error("path configuration error: {0}")]
    PathConfig(String),

    /// Bootstrap file present but unreadable
    #[error("cannot load bootstrap script {}: {source}", path.display())]
    BootstrapLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Evaluation or dispatch failed inside the engine
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A named script was requested before a glue object exists
    #[error("script dispatch unavailable: bootstrap did not produce a glue object")]
    DispatchUnavailable,

    /// Invocation reference addressed to another language runner
    #[error("invocation `{0}` is not addressed to this runner")]
    ForeignLanguage(String),

    /// Invocation reference without a `<tag>:<name>` shape
    #[error("malformed invocation reference `{0}`")]
    InvalidInvocation(String),

    /// KDL parsing error
    #[error("config parse error: {0}")]
    Config(#[from] kdl::KdlError),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
