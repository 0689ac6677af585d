//! Secret store client surface.
//!
//! Everything the engine needs from the remote store is expressed by the
//! [`VaultClient`] trait. A [`Connector`] produces fresh, unauthenticated
//! clients for one endpoint.
//!
//! ## Adding a New Backend
//!
//! 1. Implement `VaultClient` for the client type
//! 2. Implement `Connector` to hand out clients
//! 3. Route its URL scheme in [`connect`]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::core::codec::SecretBundle;
use crate::core::policy::Policy;
use crate::core::types::{PolicyName, Username};
use crate::error::VaultError;

mod local;

pub use local::{LocalStore, LocalVault};

/// Result of a store call.
pub type VaultResult<T> = std::result::Result<T, VaultError>;

/// What the store knows about the calling token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub display_name: String,
    /// Policies attached to the token itself.
    pub policies: Vec<PolicyName>,
    /// Policies inherited from the token's identity entity.
    pub identity_policies: Vec<PolicyName>,
    pub entity_id: Option<String>,
    /// Username of a password login, if the token came from one.
    pub username: Option<Username>,
    pub renewable: bool,
    /// Remaining lifetime; zero for tokens that never expire.
    pub ttl: Duration,
    pub expire_time: Option<DateTime<Utc>>,
}

impl TokenInfo {
    /// Token and identity policies together.
    pub fn all_policies(&self) -> Vec<PolicyName> {
        let mut all = self.policies.clone();
        for p in &self.identity_policies {
            if !all.contains(p) {
                all.push(p.clone());
            }
        }
        all
    }
}

/// An enabled auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthMethod {
    /// Mount path without trailing slash (`userpass`, `token`)
    pub path: String,
    pub kind: String,
    pub accessor: String,
}

/// An identity entity, one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: Username,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub policies: Vec<PolicyName>,
}

/// Parameters of a token to mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub policies: Vec<PolicyName>,
    pub ttl: Duration,
    pub renewable: bool,
    /// Detach from the creating token so it outlives it.
    pub no_parent: bool,
}

/// Client for one secret store endpoint.
///
/// Calls are blocking. Authorization failures come back as
/// `VaultError::Forbidden`, missing paths as `VaultError::InvalidPath`.
pub trait VaultClient {
    /// Endpoint this client talks to.
    fn url(&self) -> &str;

    /// Token used for requests, if any.
    fn token(&self) -> Option<&str>;

    /// Replace the request token.
    fn set_token(&mut self, token: &str);

    /// Authenticate through the password backend and adopt the issued token.
    fn login_userpass(&mut self, username: &str, password: &str) -> VaultResult<()>;

    /// Describe the current token.
    fn lookup_self(&self) -> VaultResult<TokenInfo>;

    /// Extend the current token's lease.
    fn renew_self(&self) -> VaultResult<()>;

    /// Paths of mounted secret engines, without trailing slash.
    fn list_mounts(&self) -> VaultResult<Vec<String>>;

    /// Mount a versioned key/value engine at `path`.
    fn enable_kv_mount(&self, path: &str, description: &str) -> VaultResult<()>;

    fn list_auth_methods(&self) -> VaultResult<Vec<AuthMethod>>;

    /// Enable an auth backend of `kind` at the path of the same name.
    fn enable_auth_method(&self, kind: &str) -> VaultResult<()>;

    /// Maximum lease of tokens issued by the auth backend at `path`.
    fn auth_max_ttl(&self, path: &str) -> VaultResult<Duration>;

    /// Create or replace an ACL policy.
    fn put_policy(&self, policy: &Policy) -> VaultResult<()>;

    fn list_policies(&self) -> VaultResult<Vec<PolicyName>>;

    fn read_policy(&self, name: &str) -> VaultResult<Policy>;

    /// Read the latest version of a key/value secret.
    fn kv_read(&self, mount: &str, path: &str) -> VaultResult<SecretBundle>;

    /// Create or update a key/value secret.
    fn kv_write(&self, mount: &str, path: &str, bundle: &SecretBundle) -> VaultResult<()>;

    /// Create or update a password login.
    fn upsert_userpass_user(
        &self,
        username: &str,
        password: &str,
        policies: &[PolicyName],
    ) -> VaultResult<()>;

    fn delete_userpass_user(&self, username: &str) -> VaultResult<()>;

    /// All entities. Empty when no user was ever created.
    fn list_entities(&self) -> VaultResult<Vec<Entity>>;

    fn read_entity_by_name(&self, name: &str) -> VaultResult<Entity>;

    /// Create an entity or update the given fields of an existing one.
    fn upsert_entity(
        &self,
        name: &str,
        metadata: Option<&BTreeMap<String, String>>,
        policies: Option<&[PolicyName]>,
    ) -> VaultResult<Entity>;

    /// Link a login on an auth backend to an entity.
    fn create_entity_alias(&self, name: &str, entity_id: &str, mount_accessor: &str)
        -> VaultResult<()>;

    fn delete_entity(&self, name: &str) -> VaultResult<()>;

    /// Mint a token and return its secret.
    fn create_token(&self, request: &TokenRequest) -> VaultResult<String>;
}

/// Hands out fresh clients for an endpoint.
pub trait Connector {
    fn url(&self) -> &str;

    /// A new client carrying no token.
    fn connect(&self) -> VaultResult<Box<dyn VaultClient>>;
}

/// Connector for an endpoint URL.
///
/// `file://<dir>` opens a local store created with [`LocalStore::bootstrap`].
///
/// # Errors
///
/// Returns `VaultError::Connection` for unreachable or unsupported endpoints.
pub fn connect(url: &str) -> VaultResult<Box<dyn Connector>> {
    if url.trim().is_empty() {
        return Err(VaultError::Connection(
            "no endpoint configured in [vault] url".to_string(),
        ));
    }
    match url.strip_prefix("file://") {
        Some(dir) => Ok(Box::new(LocalStore::open(dir)?)),
        None => Err(VaultError::Connection(format!(
            "{}: unsupported endpoint scheme",
            url
        ))),
    }
}
