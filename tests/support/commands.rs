//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::path::Path;
use std::process::Output;

impl Test {
    /// Create a bullpen command with correct environment variables.
    ///
    /// Returns a Command configured with:
    /// - HOME set to the temporary home directory
    /// - Current directory set to the test project directory
    /// - No inherited token or log filter
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("bullpen").expect("failed to find bullpen binary");
        cmd.env("HOME", self.home.path());
        // Windows uses USERPROFILE instead of HOME for home directory
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("BULLPEN_TOKEN");
        cmd.env_remove("BULLPEN_LOG");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// A command authenticated with the store's root token.
    pub fn root_cmd(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.env("BULLPEN_TOKEN", &self.token);
        cmd
    }

    /// Shortcut for `bullpen dev-store <dir>`.
    pub fn dev_store(&self, dir: &Path) -> Output {
        self.cmd()
            .arg("dev-store")
            .arg(dir)
            .output()
            .expect("failed to run bullpen dev-store")
    }

    /// Shortcut for `bullpen credentials run <action> [args]` as root.
    pub fn run_action(&self, action: &str, args: &[&str]) -> Output {
        self.root_cmd()
            .args(["credentials", "run", action])
            .args(args)
            .output()
            .expect("failed to run bullpen credentials run")
    }

    /// Shortcut for `bullpen credentials push --no-confirm` as root.
    pub fn push(&self) -> Output {
        self.root_cmd()
            .args(["credentials", "push", "--no-confirm"])
            .output()
            .expect("failed to run bullpen credentials push")
    }

    /// Shortcut for `bullpen --yes credentials pull` as root.
    pub fn pull(&self) -> Output {
        self.root_cmd()
            .args(["--yes", "credentials", "pull"])
            .output()
            .expect("failed to run bullpen credentials pull")
    }

    /// Shortcut for `bullpen credentials get <env>` as root.
    pub fn get(&self, env: &str) -> Output {
        self.root_cmd()
            .args(["credentials", "get", env])
            .output()
            .expect("failed to run bullpen credentials get")
    }

    /// Shortcut for `bullpen credentials info`.
    pub fn info(&self) -> Output {
        self.cmd()
            .args(["credentials", "info"])
            .output()
            .expect("failed to run bullpen credentials info")
    }
}
