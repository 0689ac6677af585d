//! Tests for `bullpen credentials pull|push|get|info`.

use crate::support::*;

#[test]
fn test_first_push_creates_empty_environment_files() {
    let t = Test::provisioned(&["test"]);

    let output = t.push();
    assert_success(&output);
    assert_stdout_contains(&output, "created empty environment files");
    assert_eq!(t.read_env("local"), "# Environment: local\n");
    assert_eq!(t.read_env("test"), "# Environment: test\n");
    assert_private(&t.env_path("test"));
}

#[test]
fn test_push_then_pull_round_trips_canonical_text() {
    let t = Test::provisioned(&["test"]);
    assert_success(&t.push());

    t.write_env("test", TEST_ENV_MESSY);
    let output = t.push();
    assert_success(&output);
    assert_stdout_contains(&output, "pushed");
    assert!(!t.dir.path().join("envs").exists(), "staging should be removed");

    let output = t.pull();
    assert_success(&output);
    assert_eq!(t.read_env("test"), TEST_ENV);
    assert_private(&t.env_path("test"));
}

#[test]
fn test_second_push_reports_unchanged() {
    let t = Test::provisioned(&["test"]);
    assert_success(&t.push());
    t.write_env("test", TEST_ENV);
    assert_success(&t.push());
    let ledger = t.ledger();

    assert_success(&t.pull());
    let output = t.push();
    assert_success(&output);
    assert_stdout_contains(&output, "test: unchanged");
    assert_eq!(t.ledger(), ledger);
}

#[test]
fn test_get_prints_recorded_version() {
    let t = Test::provisioned(&["test"]);
    assert_success(&t.push());
    t.write_env("test", TEST_ENV_MESSY);
    assert_success(&t.push());

    let output = t.get("test");
    assert_success(&output);
    assert_eq!(stdout(&output), TEST_ENV);
}

#[test]
fn test_get_without_version_fails() {
    let t = Test::provisioned(&["test"]);

    let output = t.get("test");
    assert_failure(&output);
    assert_error_contains(&output, "no pushed version for environment 'test'");
}

#[test]
fn test_get_unknown_environment_fails() {
    let t = Test::provisioned(&["test"]);

    let output = t.get("staging");
    assert_failure(&output);
    assert_error_contains(&output, "unknown environment: staging");
}

#[test]
fn test_malformed_file_aborts_push() {
    let t = Test::provisioned(&["test"]);
    assert_success(&t.push());
    let ledger = t.ledger();

    t.write_env("test", BROKEN_ENV);
    let output = t.push();
    assert_failure(&output);
    assert_error_contains(&output, "line 2");
    assert_eq!(t.ledger(), ledger);
    assert_eq!(t.read_env("test"), BROKEN_ENV);
}

#[test]
fn test_push_without_staging_after_versions_fails() {
    let t = Test::provisioned(&["test"]);
    assert_success(&t.push());
    t.write_env("test", TEST_ENV);
    assert_success(&t.push());

    let output = t.push();
    assert_failure(&output);
    assert_error_contains(&output, "staging directory envs/ not found");
}

#[test]
fn test_info_shows_driver_and_environments() {
    let t = Test::with_store(&["test", "production"]);

    let output = t.info();
    assert_success(&output);
    assert_stdout_contains(&output, "vault");
    assert_stdout_contains(&output, "local, test, production");
}
