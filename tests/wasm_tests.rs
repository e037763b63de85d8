//! Browser smoke tests. Run with: wasm-pack test --headless --firefox
#![cfg(target_arch = "wasm32")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod fixtures;
use fixtures::sales;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn renders_summary_json() {
    let json = serde_json::to_string(&sales()).unwrap();
    let html = flextable::render_summary_html(&json).unwrap();
    assert!(html.contains("data-pivot-key=\"East\""));
}

#[wasm_bindgen_test]
fn rejects_malformed_json() {
    assert!(flextable::render_summary_html("{").is_err());
}

#[wasm_bindgen_test]
fn reports_version() {
    assert_eq!(flextable::version(), env!("CARGO_PKG_VERSION"));
}
