//! Constants used throughout bullpen.
//!
//! Centralizes file names, defaults, and limits.

/// Project configuration file name.
pub const CONFIG_FILE: &str = ".bullpen.toml";

/// Version ledger file name, committed next to the project config.
pub const LEDGER_FILE: &str = ".bullpen-vault.toml";

/// Local staging directory for per-environment secret files.
pub const ENVS_DIR: &str = "envs";

/// Extension of staged secret files.
pub const ENV_EXTENSION: &str = "env";

/// Plain dotenv file offered as the seed for `envs/local.env`.
pub const DOTENV_FILE: &str = ".env";

/// Operator configuration directory relative to HOME (~/.bullpen).
pub const GLOBAL_DIR: &str = ".bullpen";

/// Operator configuration file inside [`GLOBAL_DIR`].
pub const GLOBAL_CONFIG_FILE: &str = "config.toml";

/// The environment that is always present and always first.
pub const LOCAL_ENV: &str = "local";

/// The environment developers may neither write nor read.
pub const PRODUCTION_ENV: &str = "production";

/// Default KV mount point.
pub const DEFAULT_MOUNT_POINT: &str = "bullpen";

/// Comment line written above the staging rules in `.gitignore`.
pub const GITIGNORE_HEADER: &str = "# bullpen environments";

/// Gitignore entries protecting staged secrets.
pub const GITIGNORE_ENTRIES: &[&str] = &["envs/", "envs/*", ".env"];

/// Global admin policy name.
pub const ADMIN_POLICY: &str = "admin";

/// Policy attached to every token by the secret store.
pub const DEFAULT_POLICY: &str = "default";

/// Policy held only by root tokens.
pub const ROOT_POLICY: &str = "root";

/// Password auth backend type.
pub const USERPASS: &str = "userpass";

/// How many times a malformed root token may be re-entered.
pub const MAX_ROOT_TOKEN_ATTEMPTS: u32 = 5;

/// Default number of escalations before a Forbidden becomes fatal.
pub const DEFAULT_MAX_ESCALATIONS: u32 = 1;

/// CI variable that receives deployment tokens.
pub const CI_TOKEN_VARIABLE: &str = "VAULT_TOKEN";

/// Bcrypt-compatible upper bound for generated passwords.
pub const MAX_PASSWORD_LEN: usize = 71;

/// Minimum fuzzy score for user search hits.
pub const SEARCH_THRESHOLD: u32 = 85;
