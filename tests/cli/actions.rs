//! Tests for `bullpen credentials actions` and `run`.

use crate::support::*;

#[test]
fn test_actions_lists_vault_actions() {
    let t = Test::with_store(&["test"]);

    let output = t.cmd().args(["credentials", "actions"]).output().unwrap();
    assert_success(&output);
    for action in ["init", "create_user", "list_users", "create_deployment_token"] {
        assert_stdout_contains(&output, action);
    }
}

#[test]
fn test_unknown_action_fails() {
    let t = Test::with_store(&["test"]);

    let output = t.run_action("frobnicate", &[]);
    assert_failure(&output);
    assert_error_contains(&output, "unknown action: frobnicate");
}

#[test]
fn test_legacy_driver_has_no_actions() {
    let t = Test::new();
    t.write_config(
        "[project]\ngroup = \"acme\"\nname = \"api\"\n\n[credentials]\ndriver = \"legacy\"\n\n[legacy]\ndir = \"exports\"\n",
    );

    let output = t.cmd().args(["credentials", "actions"]).output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "the legacy driver has no actions");

    let output = t.run_action("init", &[]);
    assert_failure(&output);
    assert_error_contains(&output, "legacy driver does not support init");
}

#[test]
fn test_create_user_needs_a_terminal() {
    let t = Test::provisioned(&["test"]);

    // Nobody is there to answer the prompts.
    let output = t.run_action("create-user", &["alice"]);
    assert_failure(&output);

    let output = t.run_action("list-users", &[]);
    assert_success(&output);
    assert_stdout_contains(&output, "no users");
}
