//! Test support utilities for bullpen integration tests.
//!
//! Provides reusable test environment setup and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// Each test gets its own project dir, home dir and local secret store.
/// Child processes use `.current_dir()`, so tests can run in parallel.
pub struct Test {
    /// Temporary directory for the test project
    pub dir: TempDir,
    /// Temporary home directory
    pub home: TempDir,
    /// Directory holding the local store, once created
    pub store: Option<PathBuf>,
    /// Root token of the local store
    pub token: String,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");

        Self {
            dir,
            home,
            store: None,
            token: String::new(),
        }
    }

    /// A project with a fresh local store, not yet provisioned.
    pub fn with_store(environments: &[&str]) -> Self {
        let mut t = Self::new();
        let store = t.home.path().join("store");
        let output = t.dev_store(&store);
        assert_success(&output);

        t.token = root_token(&stdout(&output)).expect("dev-store printed no root token");
        t.write_config(&project_toml(
            &format!("file://{}", store.display()),
            environments,
        ));
        t.store = Some(store);
        t
    }

    /// A provisioned project: store created and `init` run with the root token.
    pub fn provisioned(environments: &[&str]) -> Self {
        let t = Self::with_store(environments);
        let output = t.run_action("init", &[]);
        assert_success(&output);
        t
    }

    /// Write `.bullpen.toml`.
    pub fn write_config(&self, contents: &str) {
        fs::write(self.dir.path().join(".bullpen.toml"), contents)
            .expect("failed to write .bullpen.toml");
    }

    /// Path to a staged environment file.
    pub fn env_path(&self, env: &str) -> PathBuf {
        self.dir.path().join("envs").join(format!("{}.env", env))
    }

    /// Write a staged environment file, creating `envs/` if needed.
    pub fn write_env(&self, env: &str, contents: &str) {
        let path = self.env_path(env);
        fs::create_dir_all(path.parent().unwrap()).expect("failed to create envs/");
        fs::write(path, contents).expect("failed to write env file");
    }

    /// Read a staged environment file.
    pub fn read_env(&self, env: &str) -> String {
        fs::read_to_string(self.env_path(env)).expect("failed to read env file")
    }

    /// Contents of the version ledger.
    pub fn ledger(&self) -> String {
        fs::read_to_string(self.dir.path().join(".bullpen-vault.toml"))
            .expect("failed to read ledger")
    }
}

/// Pull the root token out of `dev-store` output.
pub fn root_token(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("root token"))
        .map(|rest| rest.trim().to_string())
}
