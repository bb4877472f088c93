//! scriptpad: drive the embedded Lua host from the command line
//!
//! Starts a host against an install directory, exactly as the editor would,
//! then runs one request. Any script failure makes the process exit non-zero.
//!
//! ```text
//! scriptpad --home /opt/scriptpad run formatTable
//! scriptpad exec notes.lua --eol crlf
//! scriptpad -c host.kdl list
//! ```

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use script_host::{
    DiagnosticSink, EolMode, HostConfig, MemoryRegistry, ScriptHost, TextBuffer, TracingSink,
};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scriptpad", version, about = "Run Lua through an embedded script host")]
struct Args {
    /// Host options file (KDL); defaults to SCRIPTPAD_* environment variables
    #[arg(long, short = 'c', value_name = "PATH")]
    config: Option<PathBuf>,

    /// Install directory, overriding the options file and SCRIPTPAD_HOME
    #[arg(long, value_name = "DIR")]
    home: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a script through the glue object
    Run { name: String },

    /// Run a file as if it were an open editor document
    Exec {
        file: PathBuf,

        /// Line-ending mode (lf, cr, crlf); detected from the file by default
        #[arg(long, value_name = "MODE")]
        eol: Option<EolMode>,
    },

    /// Evaluate a line of Lua in the host namespace
    Eval { source: String },

    /// Route an invocation reference such as `lua:formatTable` through the registry
    Invoke { reference: String },

    /// List the scripts registered during startup
    List,
}

/// Logs diagnostics and counts them for the exit status
#[derive(Default)]
struct CountingSink {
    inner: TracingSink,
    count: Cell<usize>,
}

impl DiagnosticSink for CountingSink {
    fn emit(&self, message: &str) {
        self.count.set(self.count.get() + 1);
        self.inner.emit(message);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let sink = Rc::new(CountingSink::default());
    let registry = Rc::new(RefCell::new(MemoryRegistry::new()));
    let host = ScriptHost::new(config, sink.clone());
    host.start(registry.clone());

    match args.command {
        Command::Run { name } => host.run_script(&name),
        Command::Exec { file, eol } => {
            let mut doc = TextBuffer::from_file(&file)
                .map_err(|e| anyhow!("cannot open {}: {e}", file.display()))?;
            if let Some(eol) = eol {
                doc = doc.with_eol_mode(eol);
            }
            host.on_new_document(&doc);
            host.run_document(&doc);
        }
        Command::Eval { source } => {
            host.run_document(&TextBuffer::new("eval", source, EolMode::Lf));
        }
        Command::Invoke { reference } => {
            if let Err(err) = MemoryRegistry::invoke(&registry, &reference) {
                sink.emit(&err.to_string());
            }
        }
        Command::List => {
            for script in registry.borrow().scripts() {
                println!(
                    "{:<16} {:<28} {}",
                    script.group, script.invocation_ref, script.display_name
                );
            }
        }
    }

    let failures = sink.count.get();
    anyhow::ensure!(failures == 0, "{failures} script failure(s), see log output");
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<HostConfig> {
    let mut config = match &args.config {
        Some(path) => HostConfig::from_file(path)
            .map_err(|e| anyhow!("cannot load options from {}: {e}", path.display()))?,
        None => HostConfig::from_env(),
    };
    if let Some(home) = &args.home {
        config.install_path = home.clone();
    }
    Ok(config)
}
