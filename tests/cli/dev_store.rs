//! Tests for `bullpen dev-store`.

use crate::support::*;

#[test]
fn test_dev_store_prints_url_and_root_token() {
    let t = Test::new();
    let dir = t.home.path().join("store");

    let output = t.dev_store(&dir);
    assert_success(&output);
    assert_stdout_contains(&output, "local store ready");
    assert_stdout_contains(&output, "file://");

    let token = root_token(&stdout(&output)).unwrap();
    assert!(token.starts_with("hvs."), "unexpected token: {}", token);
}

#[test]
fn test_dev_store_reopen_keeps_root_token() {
    let t = Test::new();
    let dir = t.home.path().join("store");

    let first = root_token(&stdout(&t.dev_store(&dir))).unwrap();
    let second = root_token(&stdout(&t.dev_store(&dir))).unwrap();
    assert_eq!(first, second);
}
