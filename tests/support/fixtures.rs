//! Test fixtures and constants.

/// Staged test environment in canonical form.
pub const TEST_ENV: &str = "# Environment: test\n\n# DB settings:\nDB_HOST=localhost\nDB_PORT=5432\n";

/// Staged test environment as a person might write it.
pub const TEST_ENV_MESSY: &str = "DB_PORT=5432\n\n# a note\nDB_HOST=localhost\n";

/// Staged environment with a malformed second line.
pub const BROKEN_ENV: &str = "API_KEY=abc\nnot a pair\n";

/// `.bullpen.toml` for the `acme/api` project.
pub fn project_toml(url: &str, environments: &[&str]) -> String {
    let envs: Vec<String> = environments.iter().map(|e| format!("\"{}\"", e)).collect();
    format!(
        "[project]\ngroup = \"acme\"\nname = \"api\"\nenvironments = [{}]\n\n[vault]\nurl = \"{}\"\n",
        envs.join(", "),
        url.replace('\\', "\\\\"),
    )
}
