//! Error types.
//!
//! Each concern owns a small `thiserror` enum; [`Error`] wraps them so callers
//! can use `?` across layers while `main` still matches on the specific case
//! to print a remediation hint.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Remediation hint shown under the error message, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::Config(ConfigError::NotFound) => {
                Some("create .bullpen.toml with [project] and [vault] sections")
            }
            Error::Vault(VaultError::InvalidPath(_)) | Error::Sync(SyncError::LedgerMissing) => {
                Some("run: bullpen credentials run init")
            }
            Error::Sync(SyncError::StagingMissing) => Some("run: bullpen credentials pull"),
            Error::Sync(SyncError::NoVersion { .. }) => Some("run: bullpen credentials push"),
            Error::Vault(VaultError::Connection(_)) => {
                Some("check [vault] url in .bullpen.toml and your network connection")
            }
            Error::Session(SessionError::EscalationExhausted { .. }) => {
                Some("pass a valid root token with --token")
            }
            _ => None,
        }
    }
}

/// Project and operator configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("project config not found: .bullpen.toml")]
    NotFound,

    #[error("failed to read config: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unable to determine home directory")]
    NoHome,
}

/// A malformed line in a local secret file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line_number}: {reason}: {line}")]
pub struct ParseError {
    pub line_number: usize,
    pub line: String,
    pub reason: String,
}

impl ParseError {
    pub(crate) fn new(line_number: usize, line: &str, reason: impl Into<String>) -> Self {
        Self {
            line_number,
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

/// Input validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("key cannot be empty")]
    EmptyKey,

    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("invalid root token: must contain 'hvs'")]
    InvalidRootToken,

    #[error("input required but stdin is not a terminal: {0}")]
    NonInteractive(String),

    #[error("invalid permissions on {path}: expected {expected}, got {actual}")]
    InvalidPermissions {
        path: String,
        expected: String,
        actual: String,
    },
}

/// Errors reported by the secret store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// The caller's token lacks a capability on the path.
    #[error("permission denied: {0}")]
    Forbidden(String),

    /// Mount point, secret, entity, or policy does not exist.
    #[error("path not found: {0}")]
    InvalidPath(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("can't connect to secret store: {0}")]
    Connection(String),

    #[error("secret store internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Lease-related messages that do not indicate a missing privilege.
    pub fn is_benign_lease(&self) -> bool {
        let msg = match self {
            VaultError::Forbidden(m) | VaultError::InvalidRequest(m) | VaultError::Internal(m) => m,
            _ => return false,
        };
        msg.contains("lease is not renewable") || msg.contains("invalid lease ID")
    }
}

/// Session lifecycle errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("still forbidden after {attempts} privilege escalation attempt(s)")]
    EscalationExhausted { attempts: u32 },

    #[error("exceeded the maximum number of root token attempts ({0})")]
    RootTokenAttempts(u32),

    #[error("invalid username or password for '{0}'")]
    LoginFailed(String),
}

/// Push/pull protocol errors.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("version ledger not found (.bullpen-vault.toml)")]
    LedgerMissing,

    #[error("staging directory envs/ not found")]
    StagingMissing,

    #[error("local secret file missing: {0}")]
    MissingEnvFile(String),

    #[error("{path}: {source}")]
    InvalidEnvFile {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("remote path {path} not found, check your mount point or initialize the store")]
    MissingRemote { path: String },

    #[error("no pushed version for environment '{env}' in the ledger")]
    NoVersion { env: String },

    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("{role} role is not allowed to {action}")]
    NotPermitted { role: String, action: String },
}

/// User administration errors.
#[derive(Error, Debug)]
pub enum UserError {
    #[error("user not found: {0}")]
    NotFound(String),

    #[error("refusing to delete '{0}': it is the user currently managing the store")]
    SelfDeletion(String),

    #[error("unknown policy: {0}")]
    UnknownPolicy(String),

    #[error("policy cannot be assigned to users: {0}")]
    NotAssignable(String),

    #[error("token ttl of {requested} days exceeds the maximum of {max} days")]
    TtlTooLong { requested: u64, max: u64 },
}

/// Credential driver errors.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("unknown credentials driver: {0}")]
    Unknown(String),

    #[error("{driver} driver does not support {operation}")]
    Unsupported {
        driver: &'static str,
        operation: &'static str,
    },

    #[error("unknown action: {0}")]
    UnknownAction(String),
}
