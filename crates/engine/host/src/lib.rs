//! Embedded Lua script host
//!
//! Lets an editor-style application run Lua against a namespace that lives as
//! long as the application does:
//! - **Bootstrap**: extend `package.path`, run `<install>/init.lua`, pick up `glue`
//! - **Registry bridge**: advertise `lua:<name>` scripts to the host's menus
//! - **Script runner**: `glue.runScript(name)` for registered scripts
//! - **Document executor**: run the text of an open buffer as a one-off script
//! - **Document events**: tell the glue about newly opened buffers (`glue.onNewDocument`)
//!
//! # Example
//!
//! ```rust,ignore
//! use script_host::{HostConfig, MemoryRegistry, ScriptHost, TextBuffer, TracingSink};
//! use std::{cell::RefCell, rc::Rc};
//!
//! let host = ScriptHost::new(HostConfig::from_env(), Rc::new(TracingSink));
//! let registry = Rc::new(RefCell::new(MemoryRegistry::new()));
//! host.start(registry.clone());
//!
//! host.run_script("formatTable");
//! host.run_document(&TextBuffer::from_file("scratch.lua")?);
//! ```

mod bootstrap;
mod config;
mod diagnostics;
mod document;
mod error;
mod host;
mod paths;
mod registry;
mod runner;

pub use bootstrap::{Bootstrapper, SearchPathList, GLUE_NAME};
pub use config::{HostConfig, HostOptions};
pub use diagnostics::{DiagnosticSink, MemorySink, TracingSink};
pub use document::{execute_document, Document, EditSurface, TextBuffer};
pub use error::{HostError, Result};
pub use host::ScriptHost;
pub use paths::{normalize_install_dir, resolve_bootstrap_path, BOOTSTRAP_FILE, SCRIPTS_DIR};
pub use registry::{
    InvocationRef, MemoryRegistry, RegistryBridge, Runner, RunnerHandle, ScriptDescriptor,
    ScriptRegistry, SharedRegistry, LANGUAGE_TAG, SELF_TEST_GROUP, SELF_TEST_NAME,
    SELF_TEST_SCRIPT,
};
pub use runner::{dispatch_script, notify_new_document, NEW_DOCUMENT_HOOK, RUN_SCRIPT_METHOD};

// Engine types appear throughout the public API
pub use scripting::{normalize, EngineError, EngineNamespace, EolMode, GlueHandle, Value};
