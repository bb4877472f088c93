//! Runs the sample install shipped under `demos/home`

use script_host::{EolMode, HostConfig, MemoryRegistry, MemorySink, ScriptHost, TextBuffer, Value};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

fn demo_home() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../../demos/home")
}

fn start_demo() -> (Rc<ScriptHost>, Rc<MemorySink>, Rc<RefCell<MemoryRegistry>>) {
    let sink = Rc::new(MemorySink::new());
    let registry = Rc::new(RefCell::new(MemoryRegistry::new()));
    let config = HostConfig::new(demo_home().to_string_lossy());

    let host = ScriptHost::new(config, sink.clone());
    host.start(registry.clone());
    (host, sink, registry)
}

#[test]
fn test_demo_registers_its_scripts() {
    let (host, sink, registry) = start_demo();

    assert!(host.glue().is_some(), "{:?}", sink.messages());
    let refs: Vec<String> = registry
        .borrow()
        .scripts()
        .iter()
        .map(|s| s.invocation_ref.clone())
        .collect();
    for expected in ["lua:testScript", "lua:wordCount", "lua:trimSelection"] {
        assert!(refs.iter().any(|r| r == expected), "{expected} missing from {refs:?}");
    }
}

#[test]
fn test_demo_scripts_share_state_with_documents() {
    let (host, sink, _) = start_demo();

    host.run_document(&TextBuffer::new(
        "selection",
        "selection = '  one two\\tthree  '\r\n",
        EolMode::CrLf,
    ));
    host.run_script("wordCount");
    host.run_script("trimSelection");
    host.run_script("testScript");

    let ns = host.namespace();
    assert_eq!(ns.attribute("last_word_count").unwrap(), Value::Int(3));
    assert_eq!(
        ns.attribute("selection").unwrap().as_str(),
        Some("one two\tthree")
    );
    assert!(sink.is_empty(), "{:?}", sink.messages());
}

#[test]
fn test_demo_unknown_script_is_reported() {
    let (host, sink, _) = start_demo();
    host.run_script("nope");

    let messages = sink.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("no script registered as 'nope'"), "{}", messages[0]);
}
