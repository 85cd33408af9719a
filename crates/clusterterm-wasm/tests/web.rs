#![cfg(target_arch = "wasm32")]

use clusterterm_wasm::TerminalConsole;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn mount(id: &str) -> web_sys::Element {
    let document = web_sys::window().unwrap().document().unwrap();
    let element = document.create_element("div").unwrap();
    element.set_id(id);
    document.body().unwrap().append_child(&element).unwrap();
    element
}

#[wasm_bindgen_test]
fn test_console_starts_empty() {
    let console = TerminalConsole::new(Some("https://cluster.example.com/api/v1".to_string())).unwrap();
    assert_eq!(console.session_count().unwrap(), 0);
    assert_eq!(console.state("task", "t-1").unwrap(), None);
    assert!(!console.close("task", "t-1").unwrap());
}

#[wasm_bindgen_test]
fn test_invalid_target_is_rejected() {
    let console = TerminalConsole::new(Some("https://cluster.example.com".to_string())).unwrap();
    mount("term-invalid");
    assert!(console.open("term-invalid", "node", "n-1", None).is_err());
    assert!(console.open("term-invalid", "task", "a/b", None).is_err());
    assert_eq!(console.session_count().unwrap(), 0);
}

#[wasm_bindgen_test]
fn test_failed_mount_leaves_no_session() {
    // xterm.js is not loaded in the test page
    let console = TerminalConsole::new(Some("https://cluster.example.com".to_string())).unwrap();
    let element = mount("term-unloaded");
    assert!(console.open("term-unloaded", "vm", "vm-1", None).is_err());
    assert_eq!(console.session_count().unwrap(), 0);
    assert_eq!(element.get_attribute("data-terminal-state"), None);
}
