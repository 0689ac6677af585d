//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A secret key name (e.g., DATABASE_URL).
///
/// Must match `^[A-Za-z_][A-Za-z0-9_]*$`.
pub type SecretKey = String;

/// A logical environment name (`local`, `staging`, `production`, ...).
pub type EnvName = String;

/// SHA-256 hex digest of a canonical secret file. Empty means never pushed.
pub type VersionId = String;

/// A secret-store policy name (`admin`, `group/name:developer`, ...).
pub type PolicyName = String;

/// A secret-store username.
pub type Username = String;
