//! Host options
//!
//! The host tells the engine where it is installed and which file-type scheme
//! Lua scripts are associated with. Options come from a KDL file or from the
//! environment.
//!
//! # KDL layout
//!
//! ```kdl
//! host {
//!     install-path "/opt/scriptpad"
//!     scheme "lua"
//!     search-path "/usr/share/lua/5.4"
//!     search-path "/home/me/lua"
//! }
//! ```

use crate::{Result, LANGUAGE_TAG};
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Options surface the host application exposes to the script engine
pub trait HostOptions {
    /// Installation directory; empty when unknown
    fn install_path(&self) -> String;

    /// File-type scheme Lua scripts are associated with
    fn scheme(&self) -> String {
        LANGUAGE_TAG.to_string()
    }

    /// Directories appended to the module search path after the built-in ones
    fn extra_search_paths(&self) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// Concrete host options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub install_path: String,
    pub scheme: String,
    pub search_paths: Vec<PathBuf>,
}

impl HostConfig {
    pub fn new(install_path: impl Into<String>) -> Self {
        Self {
            install_path: install_path.into(),
            scheme: LANGUAGE_TAG.to_string(),
            search_paths: Vec::new(),
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    /// Read options from environment variables, falling back to the current
    /// directory as install path.
    ///
    /// - `SCRIPTPAD_HOME`: install directory
    /// - `SCRIPTPAD_SCHEME`: scheme for Lua file associations
    /// - `SCRIPTPAD_SEARCH_PATH`: extra module directories, platform path-list syntax
    pub fn from_env() -> Self {
        let install_path = env::var("SCRIPTPAD_HOME").unwrap_or_else(|_| ".".to_string());
        let scheme = env::var("SCRIPTPAD_SCHEME").unwrap_or_else(|_| LANGUAGE_TAG.into());
        let search_paths = env::var_os("SCRIPTPAD_SEARCH_PATH")
            .map(|paths| env::split_paths(&paths).collect())
            .unwrap_or_default();

        Self {
            install_path,
            scheme,
            search_paths,
        }
    }

    /// Parse a KDL options file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_string(&content)
    }

    /// Parse KDL options text
    pub fn from_string(content: &str) -> Result<Self> {
        let doc: kdl::KdlDocument = content.parse()?;
        let mut config = Self::new("");

        let Some(host) = doc.nodes().iter().find(|n| n.name().value() == "host") else {
            warn!("options file has no `host` node, using defaults");
            return Ok(config);
        };
        let Some(children) = host.children() else {
            return Ok(config);
        };

        for node in children.nodes() {
            let name = node.name().value();
            let Some(arg) = Self::first_string_arg(node) else {
                warn!(option = name, "option needs a string argument, ignored");
                continue;
            };
            match name {
                "install-path" => config.install_path = arg,
                "scheme" => config.scheme = arg,
                "search-path" => config.search_paths.push(PathBuf::from(arg)),
                other => warn!(option = other, "unknown host option, ignored"),
            }
        }

        Ok(config)
    }

    /// First positional string argument of a node
    fn first_string_arg(node: &kdl::KdlNode) -> Option<String> {
        node.entries()
            .iter()
            .filter(|e| e.name().is_none())
            .find_map(|e| match e.value() {
                kdl::KdlValue::String(s) => Some(s.clone()),
                _ => None,
            })
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::new("")
    }
}

impl HostOptions for HostConfig {
    fn install_path(&self) -> String {
        self.install_path.clone()
    }

    fn scheme(&self) -> String {
        self.scheme.clone()
    }

    fn extra_search_paths(&self) -> Vec<PathBuf> {
        self.search_paths.clone()
    }
}
