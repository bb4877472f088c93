//! Script registry bridge
//!
//! The host owns a registry of runnable scripts (menus, command palettes).
//! Each entry names the runner by language tag and the script by name, packed
//! into an invocation reference such as `lua:formatTable`. This module forwards
//! registrations to that registry and exposes them to Lua as
//! `host.registerScript(name, group, displayName)`.

use crate::{Document, HostError, Result};
use scripting::EngineNamespace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Language tag this host registers under
pub const LANGUAGE_TAG: &str = "lua";

/// Group of the built-in self-test entry
pub const SELF_TEST_GROUP: &str = "test";
/// Display name of the built-in self-test entry
pub const SELF_TEST_NAME: &str = "Test Script";
/// Script name of the built-in self-test entry
pub const SELF_TEST_SCRIPT: &str = "testScript";

/// A script entry as handed to the host registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDescriptor {
    pub invocation_ref: String,
    pub group: String,
    pub display_name: String,
}

impl ScriptDescriptor {
    pub fn new(
        invocation_ref: impl Into<String>,
        group: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            invocation_ref: invocation_ref.into(),
            group: group.into(),
            display_name: display_name.into(),
        }
    }
}

/// Parsed `<language-tag>:<script-name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRef {
    pub language_tag: String,
    pub script_name: String,
}

impl InvocationRef {
    pub fn new(language_tag: impl Into<String>, script_name: impl Into<String>) -> Self {
        Self {
            language_tag: language_tag.into(),
            script_name: script_name.into(),
        }
    }
}

impl fmt::Display for InvocationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.language_tag, self.script_name)
    }
}

impl FromStr for InvocationRef {
    type Err = HostError;

    /// Splits on the first `:`; both halves must be non-empty
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((tag, name)) if !tag.is_empty() && !name.is_empty() => Ok(Self::new(tag, name)),
            _ => Err(HostError::InvalidInvocation(s.to_string())),
        }
    }
}

/// Something the host registry can route script requests back to
pub trait Runner {
    fn run_script(&self, name: &str);
    fn run_document(&self, doc: &dyn Document);

    /// Called by the host application when a document is opened
    fn on_new_document(&self, _doc: &dyn Document) {}
}

/// Registries hold runners weakly; the runner owns the registry handle
pub type RunnerHandle = Weak<dyn Runner>;

/// The host's script registry
pub trait ScriptRegistry {
    fn register_runner(&mut self, language_tag: &str, runner: RunnerHandle);
    fn enable_scheme_scripts(&mut self, language_tag: &str, scheme: &str);
    fn add(&mut self, descriptor: ScriptDescriptor);
}

/// Registry handle shared between the host and the engine bindings
pub type SharedRegistry = Rc<RefCell<dyn ScriptRegistry>>;

/// Forwards registrations from the engine to the attached host registry
#[derive(Default)]
pub struct RegistryBridge {
    registry: RefCell<Option<SharedRegistry>>,
}

impl RegistryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.registry.borrow().is_some()
    }

    /// Register the runner, associate the scheme and add the self-test entry
    pub fn attach(&self, registry: SharedRegistry, runner: RunnerHandle, scheme: &str) {
        {
            let mut reg = registry.borrow_mut();
            reg.register_runner(LANGUAGE_TAG, runner);
            reg.enable_scheme_scripts(LANGUAGE_TAG, scheme);
            reg.add(ScriptDescriptor::new(
                InvocationRef::new(LANGUAGE_TAG, SELF_TEST_SCRIPT).to_string(),
                SELF_TEST_GROUP,
                SELF_TEST_NAME,
            ));
        }
        info!(tag = LANGUAGE_TAG, scheme, "attached to host script registry");
        *self.registry.borrow_mut() = Some(registry);
    }

    /// Compose `lua:<script_name>` and forward the descriptor.
    ///
    /// Registrations made before a registry is attached are dropped.
    pub fn register_script(
        &self,
        script_name: &str,
        group: &str,
        display_name: &str,
    ) -> ScriptDescriptor {
        let descriptor = ScriptDescriptor::new(
            InvocationRef::new(LANGUAGE_TAG, script_name).to_string(),
            group,
            display_name,
        );

        // Clone the handle out so a registry that calls back into us cannot
        // trip over our own borrow
        let registry = self.registry.borrow().clone();
        match registry {
            Some(registry) => {
                debug!(reference = %descriptor.invocation_ref, group, "registering script");
                registry.borrow_mut().add(descriptor.clone());
            }
            None => warn!(
                reference = %descriptor.invocation_ref,
                "no host registry attached, registration dropped"
            ),
        }
        descriptor
    }

    /// Expose `host.registerScript` and `host.log` to Lua
    pub fn install_bindings(self: &Rc<Self>, namespace: &EngineNamespace) -> scripting::Result<()> {
        let lua = namespace.lua();
        let host = lua.create_table()?;

        let bridge = Rc::clone(self);
        let register = lua.create_function(
            move |_, (name, group, display): (String, String, Option<String>)| {
                let display = display.unwrap_or_else(|| name.clone());
                bridge.register_script(&name, &group, &display);
                Ok(())
            },
        )?;
        host.set("registerScript", register)?;

        let log = lua.create_function(|_, message: String| {
            info!(target: "scriptpad::script", "{message}");
            Ok(())
        })?;
        host.set("log", log)?;
        host.set("languageTag", LANGUAGE_TAG)?;

        namespace.set("host", host)
    }
}

/// A host registry kept in memory
#[derive(Default)]
pub struct MemoryRegistry {
    runners: HashMap<String, RunnerHandle>,
    schemes: HashMap<String, String>,
    scripts: Vec<ScriptDescriptor>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripts(&self) -> &[ScriptDescriptor] {
        &self.scripts
    }

    /// Scheme associated with a language tag
    pub fn scheme_for(&self, language_tag: &str) -> Option<&str> {
        self.schemes.get(language_tag).map(String::as_str)
    }

    /// Live runner for a language tag
    pub fn runner_for(&self, language_tag: &str) -> Option<Rc<dyn Runner>> {
        self.runners.get(language_tag).and_then(Weak::upgrade)
    }

    /// Route an invocation reference to its runner.
    ///
    /// Takes the `RefCell` so the borrow is released before the script runs;
    /// scripts may register more entries while they execute.
    pub fn invoke(registry: &RefCell<MemoryRegistry>, reference: &str) -> Result<()> {
        let target: InvocationRef = reference.parse()?;
        let runner = registry
            .borrow()
            .runner_for(&target.language_tag)
            .ok_or_else(|| HostError::ForeignLanguage(reference.to_string()))?;

        runner.run_script(&target.script_name);
        Ok(())
    }
}

impl ScriptRegistry for MemoryRegistry {
    fn register_runner(&mut self, language_tag: &str, runner: RunnerHandle) {
        self.runners.insert(language_tag.to_string(), runner);
    }

    fn enable_scheme_scripts(&mut self, language_tag: &str, scheme: &str) {
        self.schemes
            .insert(language_tag.to_string(), scheme.to_string());
    }

    fn add(&mut self, descriptor: ScriptDescriptor) {
        self.scripts.retain(|s| s.invocation_ref != descriptor.invocation_ref);
        self.scripts.push(descriptor);
    }
}
