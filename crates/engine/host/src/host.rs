//! The script host
//!
//! [`ScriptHost`] owns the namespace and everything that hangs off it. The
//! host application creates one, calls [`ScriptHost::start`] once with its
//! script registry, and from then on asks it to run named scripts or open
//! documents. None of those calls return errors: failures are rendered to the
//! [`DiagnosticSink`] so a broken script cannot take the editor down with it.

use crate::bootstrap::Bootstrapper;
use crate::document::execute_document;
use crate::registry::{RegistryBridge, Runner, RunnerHandle, SharedRegistry};
use crate::runner::{dispatch_script, notify_new_document};
use crate::{
    DiagnosticSink, Document, HostError, HostOptions, InvocationRef, Result, SearchPathList,
    LANGUAGE_TAG,
};
use scripting::{EngineNamespace, GlueHandle};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{info, warn};

/// Embedded Lua host bound to one namespace
pub struct ScriptHost {
    namespace: EngineNamespace,
    options: Box<dyn HostOptions>,
    sink: Rc<dyn DiagnosticSink>,
    bridge: Rc<RegistryBridge>,
    glue: RefCell<Option<GlueHandle>>,
    search_paths: RefCell<SearchPathList>,
    bootstrapped: Cell<bool>,
}

impl ScriptHost {
    /// Create a host with a fresh namespace
    pub fn new(options: impl HostOptions + 'static, sink: Rc<dyn DiagnosticSink>) -> Rc<Self> {
        Self::with_namespace(EngineNamespace::new(), options, sink)
    }

    /// Create a host around an existing namespace
    pub fn with_namespace(
        namespace: EngineNamespace,
        options: impl HostOptions + 'static,
        sink: Rc<dyn DiagnosticSink>,
    ) -> Rc<Self> {
        let host = Self {
            namespace,
            options: Box::new(options),
            sink,
            bridge: Rc::new(RegistryBridge::new()),
            glue: RefCell::new(None),
            search_paths: RefCell::new(SearchPathList::default()),
            bootstrapped: Cell::new(false),
        };

        if let Err(err) = host.bridge.install_bindings(&host.namespace) {
            host.sink
                .emit(&format!("failed to install host bindings: {err}"));
        }
        Rc::new(host)
    }

    /// Attach to the host registry, then bootstrap; later calls are ignored
    pub fn start(self: &Rc<Self>, registry: SharedRegistry) {
        if self.is_attached() || self.is_bootstrapped() {
            warn!("host already started, ignoring repeated start");
            return;
        }
        self.attach_to_registry(registry);
        self.initialize();
    }

    /// Register as the Lua runner and add the built-in entries, once
    pub fn attach_to_registry(self: &Rc<Self>, registry: SharedRegistry) {
        if self.is_attached() {
            warn!("host already attached to a registry");
            return;
        }
        let runner: RunnerHandle = Rc::<ScriptHost>::downgrade(self);
        self.bridge
            .attach(registry, runner, &self.options.scheme());
    }

    /// Run the bootstrap sequence; only the first call has any effect
    pub fn initialize(&self) {
        if self.bootstrapped.replace(true) {
            warn!("bootstrap already ran, ignoring repeated initialization");
            return;
        }

        let mut bootstrapper = Bootstrapper::new(&self.namespace, self.sink.as_ref());
        let result = bootstrapper.initialize(self.options.as_ref());
        *self.search_paths.borrow_mut() = bootstrapper.into_search_paths();

        match result {
            Ok(Some(glue)) => {
                info!("bootstrap complete, glue ready");
                *self.glue.borrow_mut() = Some(glue);
            }
            Ok(None) => info!("bootstrap complete, idle without glue"),
            Err(err) => self.sink.emit(&format!("bootstrap failed: {err}")),
        }
    }

    /// Run a named script through the glue object; failures go to the sink
    pub fn run_script(&self, name: &str) {
        if let Err(err) = self.try_run_script(name) {
            self.sink.emit(&format!("script `{name}` failed: {err}"));
        }
    }

    /// [`run_script`](Self::run_script) returning the failure instead
    pub fn try_run_script(&self, name: &str) -> Result<()> {
        // Release the borrow before Lua runs
        let glue = self.glue.borrow().clone();
        dispatch_script(&self.namespace, glue.as_ref(), name)
    }

    /// Evaluate a document's text in the namespace; failures go to the sink
    pub fn run_document(&self, doc: &dyn Document) {
        if let Err(err) = self.try_run_document(doc) {
            self.sink
                .emit(&format!("document `{}` failed: {err}", doc.title()));
        }
    }

    /// [`run_document`](Self::run_document) returning the failure instead
    pub fn try_run_document(&self, doc: &dyn Document) -> Result<()> {
        execute_document(&self.namespace, doc)
    }

    /// Forward a newly opened document to `glue.onNewDocument`, if defined
    pub fn on_new_document(&self, doc: &dyn Document) {
        if let Err(err) = self.try_on_new_document(doc) {
            self.sink
                .emit(&format!("new-document hook for `{}` failed: {err}", doc.title()));
        }
    }

    /// [`on_new_document`](Self::on_new_document) returning the failure instead
    pub fn try_on_new_document(&self, doc: &dyn Document) -> Result<()> {
        let glue = self.glue.borrow().clone();
        notify_new_document(&self.namespace, glue.as_ref(), doc)
    }

    /// Run `lua:<name>`; references for other runners are reported
    pub fn invoke(&self, reference: &str) {
        if let Err(err) = self.try_invoke(reference) {
            self.sink.emit(&err.to_string());
        }
    }

    /// [`invoke`](Self::invoke) returning the failure instead
    pub fn try_invoke(&self, reference: &str) -> Result<()> {
        let target: InvocationRef = reference.parse()?;
        if target.language_tag != LANGUAGE_TAG {
            return Err(HostError::ForeignLanguage(reference.to_string()));
        }
        self.try_run_script(&target.script_name)
    }

    /// Forward a registration to the host registry
    pub fn register_script(&self, script_name: &str, group: &str, display_name: &str) {
        self.bridge
            .register_script(script_name, group, display_name);
    }

    pub fn namespace(&self) -> &EngineNamespace {
        &self.namespace
    }

    pub fn options(&self) -> &dyn HostOptions {
        self.options.as_ref()
    }

    /// The glue object, if bootstrap produced one
    pub fn glue(&self) -> Option<GlueHandle> {
        self.glue.borrow().clone()
    }

    /// Directories appended to the module search path at bootstrap
    pub fn search_paths(&self) -> SearchPathList {
        self.search_paths.borrow().clone()
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped.get()
    }

    /// Attached and bootstrapped
    pub fn is_started(&self) -> bool {
        self.is_attached() && self.is_bootstrapped()
    }

    pub fn is_attached(&self) -> bool {
        self.bridge.is_attached()
    }
}

impl Runner for ScriptHost {
    fn run_script(&self, name: &str) {
        ScriptHost::run_script(self, name);
    }

    fn run_document(&self, doc: &dyn Document) {
        ScriptHost::run_document(self, doc);
    }

    fn on_new_document(&self, doc: &dyn Document) {
        ScriptHost::on_new_document(self, doc);
    }
}
