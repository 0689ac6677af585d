//! Test assertion helpers.

use std::path::Path;
use std::process::Output;

/// Assert that a command output was successful.
pub fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "Command failed:\nstdout: {}\nstderr: {}",
            stdout(output),
            stderr(output)
        );
    }
}

/// Assert that a command output failed.
pub fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "Expected command to fail but it succeeded:\n{}",
        stdout(output)
    );
}

/// Get stdout as String.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Get stderr as String.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Assert stdout contains a string.
pub fn assert_stdout_contains(output: &Output, expected: &str) {
    let out = stdout(output);
    assert!(
        out.contains(expected),
        "stdout missing '{}', got: {}",
        expected,
        out
    );
}

/// Assert the printed error (the `✗` line on stderr) contains a string.
pub fn assert_error_contains(output: &Output, expected: &str) {
    let err = stderr(output);
    let line = err
        .lines()
        .find(|l| l.starts_with('✗'))
        .unwrap_or_else(|| panic!("no error line on stderr: {}", err));
    assert!(
        line.contains(expected),
        "error missing '{}', got: {}",
        expected,
        line
    );
}

/// Assert a file is readable by its owner only.
#[cfg(unix)]
pub fn assert_private(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::metadata(path)
        .unwrap_or_else(|e| panic!("{}: {}", path.display(), e))
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(mode, 0o600, "{} has mode {:o}", path.display(), mode);
}

#[cfg(not(unix))]
pub fn assert_private(_path: &Path) {}
