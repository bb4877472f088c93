//! Engine bootstrap
//!
//! Runs once when the host starts:
//! 1. append the install directory, its `scripts` subdirectory and any
//!    configured directories to Lua's `package.path`
//! 2. evaluate `<install>/init.lua` if it exists
//! 3. pick up the global `glue` table the script defines
//!
//! A failure in step 1 is reported and skipped. A missing bootstrap file leaves
//! the host idle: documents still run, named scripts do not.

use crate::paths::{normalize_install_dir, resolve_bootstrap_path, SCRIPTS_DIR};
use crate::{DiagnosticSink, HostError, HostOptions, Result};
use scripting::{normalize, EngineNamespace, EolMode, GlueHandle};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Global the bootstrap script must define
pub const GLUE_NAME: &str = "glue";

/// Directories appended to the module search path, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPathList {
    dirs: Vec<PathBuf>,
}

impl SearchPathList {
    /// `install`, `install/scripts`, then `extra`
    pub fn for_install_dir(install_dir: &str, extra: impl IntoIterator<Item = PathBuf>) -> Self {
        let root = PathBuf::from(install_dir);
        let mut dirs = vec![root.clone(), root.join(SCRIPTS_DIR)];
        dirs.extend(extra);
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Lua source appending `<dir>/?.lua` for every entry to `package.path`
    pub fn to_lua_snippet(&self) -> String {
        self.dirs
            .iter()
            .map(|dir| {
                let pattern = dir.join("?.lua");
                format!(
                    "package.path = package.path .. \";\" .. {}\n",
                    lua_long_string(&pattern.to_string_lossy())
                )
            })
            .collect()
    }
}

/// Quote `s` as a Lua long string whose closing bracket cannot occur early
fn lua_long_string(s: &str) -> String {
    let mut level = 0;
    loop {
        let eq = "=".repeat(level);
        let close = format!("]{eq}]");
        let quoted = format!("{s}{close}");
        if quoted.find(&close) == Some(s.len()) {
            return format!("[{eq}[{quoted}");
        }
        level += 1;
    }
}

/// Prepares the namespace and loads the bootstrap script
pub struct Bootstrapper<'a> {
    namespace: &'a EngineNamespace,
    sink: &'a dyn DiagnosticSink,
    search_paths: SearchPathList,
}

impl<'a> Bootstrapper<'a> {
    pub fn new(namespace: &'a EngineNamespace, sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            namespace,
            sink,
            search_paths: SearchPathList::default(),
        }
    }

    /// Run the bootstrap sequence.
    ///
    /// `Ok(None)` means idle mode: no install directory or no bootstrap file.
    /// Errors come from evaluating the bootstrap script or from a missing or
    /// malformed `glue` binding.
    pub fn initialize(&mut self, options: &dyn HostOptions) -> Result<Option<GlueHandle>> {
        let install_dir = match normalize_install_dir(&options.install_path()) {
            Ok(dir) => dir,
            Err(err) => {
                self.sink.emit(&err.to_string());
                return Ok(None);
            }
        };

        self.search_paths =
            SearchPathList::for_install_dir(&install_dir, options.extra_search_paths());
        let snippet = self.search_paths.to_lua_snippet();
        if let Err(err) = self
            .namespace
            .evaluate_chunk("=search-path", snippet.as_bytes())
        {
            self.sink
                .emit(&format!("failed to extend module search path: {err}"));
        }

        let path = resolve_bootstrap_path(options)?;
        let source = match read_bootstrap(&path) {
            Ok(Some(source)) => source,
            Ok(None) => {
                info!(path = %path.display(), "no bootstrap script, running without glue");
                return Ok(None);
            }
            Err(err) => {
                warn!("{err}; running without glue");
                return Ok(None);
            }
        };

        info!(path = %path.display(), "running bootstrap script");
        let chunk = format!("@{}", path.display());
        self.namespace.evaluate_chunk(&chunk, &source)?;

        let glue = self.namespace.glue(GLUE_NAME)?;
        Ok(Some(glue))
    }

    /// Search path entries appended during [`initialize`](Self::initialize)
    pub fn into_search_paths(self) -> SearchPathList {
        self.search_paths
    }
}

/// Read the bootstrap file as LF text; `None` if it does not exist
fn read_bootstrap(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => {
            let eol = EolMode::detect(&bytes);
            Ok(Some(normalize(&bytes, eol)))
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(HostError::BootstrapLoad {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HostConfig, MemorySink};
    use scripting::EngineError;

    fn install(init: Option<&str>) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        if let Some(source) = init {
            std::fs::write(dir.path().join("init.lua"), source).unwrap();
        }
        dir
    }

    fn config(dir: &tempfile::TempDir) -> HostConfig {
        HostConfig::new(dir.path().to_string_lossy())
    }

    #[test]
    fn test_search_path_order() {
        let list = SearchPathList::for_install_dir("/opt/app", vec![PathBuf::from("/extra")]);
        assert_eq!(
            list.dirs(),
            &[
                PathBuf::from("/opt/app"),
                PathBuf::from("/opt/app").join("scripts"),
                PathBuf::from("/extra"),
            ]
        );
    }

    #[test]
    fn test_long_string_levels() {
        assert_eq!(lua_long_string("/a/b"), "[[/a/b]]");
        assert_eq!(lua_long_string("/a]]b"), "[=[/a]]b]=]");
        assert_eq!(lua_long_string("/a]"), "[=[/a]]=]");
        assert_eq!(lua_long_string("x]=]y]]"), "[==[x]=]y]]]==]");
    }

    #[test]
    fn test_snippet_survives_awkward_paths() {
        let ns = EngineNamespace::new();
        let list = SearchPathList::for_install_dir("/odd]]dir\\", Vec::new());
        ns.evaluate(&list.to_lua_snippet()).unwrap();
        ns.evaluate("current_path = package.path").unwrap();

        let path: String = ns.get("current_path").unwrap();
        assert!(path.contains("/odd]]dir\\"), "{path}");
    }

    #[test]
    fn test_missing_bootstrap_is_idle() {
        let dir = install(None);
        let ns = EngineNamespace::new();
        let sink = MemorySink::new();

        let mut boot = Bootstrapper::new(&ns, &sink);
        assert!(boot.initialize(&config(&dir)).unwrap().is_none());
        assert!(sink.is_empty());
        assert_eq!(boot.into_search_paths().dirs().len(), 2);
    }

    #[test]
    fn test_empty_install_dir_reports_and_idles() {
        let ns = EngineNamespace::new();
        let sink = MemorySink::new();

        let mut boot = Bootstrapper::new(&ns, &sink);
        assert!(boot.initialize(&HostConfig::new("")).unwrap().is_none());
        assert_eq!(sink.len(), 1);
        assert!(boot.into_search_paths().is_empty());
    }

    #[test]
    fn test_bootstrap_produces_glue() {
        let dir = install(Some("glue = { runScript = function(name) last = name end }\n"));
        let ns = EngineNamespace::new();
        let sink = MemorySink::new();

        let glue = Bootstrapper::new(&ns, &sink)
            .initialize(&config(&dir))
            .unwrap()
            .unwrap();
        ns.call_method(&glue, "runScript", "x").unwrap();
        assert_eq!(ns.attribute("last").unwrap().as_str(), Some("x"));
    }

    #[test]
    fn test_bootstrap_with_crlf_source() {
        let dir = install(Some("glue = {}\r\nmarker = [[a\r\nb]]\r\n"));
        let ns = EngineNamespace::new();
        let sink = MemorySink::new();

        assert!(Bootstrapper::new(&ns, &sink)
            .initialize(&config(&dir))
            .unwrap()
            .is_some());
        assert_eq!(ns.attribute("marker").unwrap().as_str(), Some("a\nb"));
    }

    #[test]
    fn test_bootstrap_without_glue_binding() {
        let dir = install(Some("x = 1\n"));
        let ns = EngineNamespace::new();
        let sink = MemorySink::new();

        let err = Bootstrapper::new(&ns, &sink)
            .initialize(&config(&dir))
            .unwrap_err();
        assert!(matches!(
            err,
            HostError::Engine(EngineError::MissingAttribute(name)) if name == "glue"
        ));
    }

    #[test]
    fn test_bootstrap_script_error() {
        let dir = install(Some("error('bad init')\n"));
        let ns = EngineNamespace::new();
        let sink = MemorySink::new();

        let err = Bootstrapper::new(&ns, &sink)
            .initialize(&config(&dir))
            .unwrap_err();
        assert!(err.to_string().contains("bad init"), "{err}");
    }

    #[test]
    fn test_bootstrap_can_require_from_scripts_dir() {
        let dir = install(Some(
            "local util = require('util')\nglue = { runScript = util.run }\n",
        ));
        std::fs::create_dir(dir.path().join("scripts")).unwrap();
        std::fs::write(
            dir.path().join("scripts").join("util.lua"),
            "return { run = function(name) ran = name end }\n",
        )
        .unwrap();

        let ns = EngineNamespace::new();
        let sink = MemorySink::new();
        let glue = Bootstrapper::new(&ns, &sink)
            .initialize(&config(&dir))
            .unwrap()
            .unwrap();

        ns.call_method(&glue, "runScript", "via-require").unwrap();
        assert_eq!(ns.attribute("ran").unwrap().as_str(), Some("via-require"));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_unreadable_bootstrap_is_idle() {
        // A directory where the file should be cannot be read as a file
        let dir = install(None);
        std::fs::create_dir(dir.path().join("init.lua")).unwrap();

        let ns = EngineNamespace::new();
        let sink = MemorySink::new();
        assert!(Bootstrapper::new(&ns, &sink)
            .initialize(&config(&dir))
            .unwrap()
            .is_none());
    }
}
