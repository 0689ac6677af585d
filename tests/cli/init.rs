//! Tests for `bullpen credentials run init`.

use crate::support::*;
use std::fs;

#[test]
fn test_init_provisions_store_and_project() {
    let t = Test::with_store(&["test", "production"]);

    let output = t.run_action("init", &[]);
    assert_success(&output);
    assert_stdout_contains(&output, "mount: enabled bullpen");
    assert_stdout_contains(&output, "auth: enabled userpass");
    assert_stdout_contains(&output, "acme/api is ready");

    let ledger = t.ledger();
    for env in ["local", "test", "production"] {
        assert!(
            ledger.contains(&format!("name = \"{}\"", env)),
            "ledger missing {}: {}",
            env,
            ledger
        );
    }

    let gitignore = fs::read_to_string(t.dir.path().join(".gitignore")).unwrap();
    assert!(gitignore.contains("envs/"));
    assert!(gitignore.contains(".env"));
}

#[test]
fn test_init_twice_is_idempotent() {
    let t = Test::provisioned(&["test"]);

    let output = t.run_action("init", &[]);
    assert_success(&output);
    assert_stdout_contains(&output, "mount: bullpen already enabled");
    assert_stdout_contains(&output, "kept recorded versions");

    let gitignore = fs::read_to_string(t.dir.path().join(".gitignore")).unwrap();
    assert_eq!(gitignore.matches("envs/\n").count(), 1, "{}", gitignore);
}

#[test]
fn test_init_without_terminal_creates_no_user() {
    let t = Test::provisioned(&["test"]);

    let output = t.run_action("list-users", &[]);
    assert_success(&output);
    assert_stdout_contains(&output, "no users");
}
