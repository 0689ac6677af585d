//! In-process secret store.
//!
//! Implements the [`VaultClient`] surface against local state, enforcing ACL
//! policies per request. State lives in memory or in a JSON file under a
//! directory (`file://<dir>` endpoints).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, trace};
use uuid::Uuid;

use super::{AuthMethod, Connector, Entity, TokenInfo, TokenRequest, VaultClient, VaultResult};
use crate::core::codec::SecretBundle;
use crate::core::constants;
use crate::core::env::write_secure;
use crate::core::policy::{self, Capability, Policy};
use crate::core::types::PolicyName;
use crate::error::VaultError;

const STATE_FILE: &str = "store.json";
const TOKEN_BACKEND: &str = "token";
const DEFAULT_MAX_TTL: Duration = Duration::from_secs(768 * 3600);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Mount {
    kind: String,
    description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuthBackend {
    kind: String,
    accessor: String,
    max_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Login {
    password_sha256: String,
    policies: Vec<PolicyName>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Alias {
    name: String,
    canonical_id: String,
    mount_accessor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenRecord {
    display_name: String,
    policies: Vec<PolicyName>,
    entity_id: Option<String>,
    username: Option<String>,
    renewable: bool,
    ttl_secs: u64,
    expires_at: Option<DateTime<Utc>>,
    root: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct State {
    #[serde(default)]
    mounts: BTreeMap<String, Mount>,
    #[serde(default)]
    auth: BTreeMap<String, AuthBackend>,
    #[serde(default)]
    policies: BTreeMap<PolicyName, Policy>,
    /// mount -> secret path -> data
    #[serde(default)]
    secrets: BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>,
    #[serde(default)]
    users: BTreeMap<String, Login>,
    /// id -> entity
    #[serde(default)]
    entities: BTreeMap<String, Entity>,
    #[serde(default)]
    aliases: Vec<Alias>,
    #[serde(default)]
    tokens: BTreeMap<String, TokenRecord>,
    #[serde(default)]
    kv_writes: u64,
}

fn new_token() -> String {
    format!("hvs.{}", Uuid::new_v4().simple())
}

fn new_accessor(kind: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("auth_{}_{}", kind, &id[..8])
}

fn password_hash(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

fn forbidden(path: &str) -> VaultError {
    VaultError::Forbidden(format!("1 error occurred: permission denied on {}", path))
}

fn expiry(ttl: Duration) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(ttl.as_secs()).ok()?;
    Some(Utc::now() + chrono::Duration::seconds(secs))
}

impl State {
    /// Fresh state with the token backend, the default policy, and a root token.
    fn bootstrap() -> (Self, String) {
        let mut state = Self::default();
        state.auth.insert(
            TOKEN_BACKEND.to_string(),
            AuthBackend {
                kind: TOKEN_BACKEND.to_string(),
                accessor: new_accessor(TOKEN_BACKEND),
                max_ttl_secs: DEFAULT_MAX_TTL.as_secs(),
            },
        );
        let default = policy::default_policy();
        state.policies.insert(default.name.clone(), default);

        let root = new_token();
        state.tokens.insert(
            root.clone(),
            TokenRecord {
                display_name: constants::ROOT_POLICY.to_string(),
                policies: vec![constants::ROOT_POLICY.to_string()],
                entity_id: None,
                username: None,
                renewable: false,
                ttl_secs: 0,
                expires_at: None,
                root: true,
            },
        );
        (state, root)
    }

    fn root_token(&self) -> Option<String> {
        self.tokens
            .iter()
            .find(|(_, record)| record.root)
            .map(|(token, _)| token.clone())
    }

    fn caller(&self, token: Option<&str>) -> VaultResult<&TokenRecord> {
        let token =
            token.ok_or_else(|| VaultError::Forbidden("missing client token".to_string()))?;
        let record = self
            .tokens
            .get(token)
            .ok_or_else(|| VaultError::Forbidden("invalid token".to_string()))?;
        if record.expires_at.map_or(false, |at| at <= Utc::now()) {
            return Err(VaultError::Forbidden("token expired".to_string()));
        }
        Ok(record)
    }

    fn entity_policies(&self, record: &TokenRecord) -> Vec<PolicyName> {
        record
            .entity_id
            .as_ref()
            .and_then(|id| self.entities.get(id))
            .map(|e| e.policies.clone())
            .unwrap_or_default()
    }

    fn caller_policies(&self, record: &TokenRecord) -> Vec<PolicyName> {
        let mut names = record.policies.clone();
        for p in self.entity_policies(record) {
            if !names.contains(&p) {
                names.push(p);
            }
        }
        names
    }

    fn permits(&self, record: &TokenRecord, path: &str, capability: Capability) -> bool {
        if record.root {
            return true;
        }
        let names = self.caller_policies(record);
        policy::permits(
            names.iter().filter_map(|n| self.policies.get(n)),
            path,
            capability,
        )
    }

    /// Check the caller may use `capability` on `path`.
    fn authorize(
        &self,
        token: Option<&str>,
        path: &str,
        capability: Capability,
    ) -> VaultResult<TokenRecord> {
        let record = self.caller(token)?;
        if !self.permits(record, path, capability) {
            trace!(path, %capability, "request denied");
            return Err(forbidden(path));
        }
        Ok(record.clone())
    }

    fn backend(&self, path: &str) -> VaultResult<&AuthBackend> {
        self.auth
            .get(path)
            .ok_or_else(|| VaultError::InvalidPath(format!("auth/{}", path)))
    }

    fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.values().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone)]
enum Storage {
    Memory(Arc<Mutex<State>>),
    File(PathBuf),
}

impl Storage {
    fn load_file(path: &Path) -> VaultResult<State> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| VaultError::Connection(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| VaultError::Internal(format!("corrupt store state: {}", e)))
    }

    fn save_file(path: &Path, state: &State) -> VaultResult<()> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| VaultError::Internal(e.to_string()))?;
        write_secure(path, &json).map_err(|e| VaultError::Internal(e.to_string()))
    }

    fn read<R>(&self, f: impl FnOnce(&State) -> VaultResult<R>) -> VaultResult<R> {
        match self {
            Storage::Memory(state) => {
                let state = state
                    .lock()
                    .map_err(|_| VaultError::Internal("store lock poisoned".to_string()))?;
                f(&state)
            }
            Storage::File(path) => f(&Self::load_file(path)?),
        }
    }

    /// Apply a mutation; file state is only persisted when it succeeds.
    fn write<R>(&self, f: impl FnOnce(&mut State) -> VaultResult<R>) -> VaultResult<R> {
        match self {
            Storage::Memory(state) => {
                let mut state = state
                    .lock()
                    .map_err(|_| VaultError::Internal("store lock poisoned".to_string()))?;
                f(&mut state)
            }
            Storage::File(path) => {
                let mut state = Self::load_file(path)?;
                let out = f(&mut state)?;
                Self::save_file(path, &state)?;
                Ok(out)
            }
        }
    }
}

/// Handle on one local store; clones share the same state.
#[derive(Debug, Clone)]
pub struct LocalStore {
    url: String,
    storage: Storage,
}

impl LocalStore {
    /// A fresh in-memory store and its root token.
    pub fn in_memory() -> (Self, String) {
        let (state, root) = State::bootstrap();
        let store = Self {
            url: "memory://".to_string(),
            storage: Storage::Memory(Arc::new(Mutex::new(state))),
        };
        (store, root)
    }

    /// Create a file-backed store under `dir`, or reopen an existing one.
    ///
    /// Returns the store and its root token.
    pub fn bootstrap(dir: impl AsRef<Path>) -> VaultResult<(Self, String)> {
        let dir = dir.as_ref();
        let path = dir.join(STATE_FILE);

        if path.exists() {
            let store = Self::open(dir)?;
            let root = store
                .storage
                .read(|state| Ok(state.root_token()))?
                .ok_or_else(|| VaultError::Internal("store has no root token".to_string()))?;
            return Ok((store, root));
        }

        std::fs::create_dir_all(dir).map_err(|e| VaultError::Internal(e.to_string()))?;
        let (state, root) = State::bootstrap();
        Storage::save_file(&path, &state)?;
        debug!(dir = %dir.display(), "local store created");

        Ok((Self::from_path(dir, path), root))
    }

    /// Open an existing file-backed store.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Connection` if no store exists under `dir`.
    pub fn open(dir: impl AsRef<Path>) -> VaultResult<Self> {
        let dir = dir.as_ref();
        let path = dir.join(STATE_FILE);
        if !path.is_file() {
            return Err(VaultError::Connection(format!(
                "no local store at {}",
                dir.display()
            )));
        }
        Ok(Self::from_path(dir, path))
    }

    fn from_path(dir: &Path, path: PathBuf) -> Self {
        Self {
            url: format!("file://{}", dir.display()),
            storage: Storage::File(path),
        }
    }

    /// A client carrying no token.
    pub fn client(&self) -> LocalVault {
        LocalVault {
            store: self.clone(),
            token: None,
        }
    }

    /// A client using `token`.
    pub fn client_with_token(&self, token: &str) -> LocalVault {
        LocalVault {
            store: self.clone(),
            token: Some(token.to_string()),
        }
    }

    /// Number of secret writes accepted so far.
    pub fn kv_writes(&self) -> VaultResult<u64> {
        self.storage.read(|state| Ok(state.kv_writes))
    }
}

impl Connector for LocalStore {
    fn url(&self) -> &str {
        &self.url
    }

    fn connect(&self) -> VaultResult<Box<dyn VaultClient>> {
        Ok(Box::new(self.client()))
    }
}

/// Client of a [`LocalStore`].
#[derive(Clone)]
pub struct LocalVault {
    store: LocalStore,
    token: Option<String>,
}

impl std::fmt::Debug for LocalVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalVault")
            .field("url", &self.store.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl LocalVault {
    fn read<R>(&self, f: impl FnOnce(&State, Option<&str>) -> VaultResult<R>) -> VaultResult<R> {
        let token = self.token.as_deref();
        self.store.storage.read(|state| f(state, token))
    }

    fn write<R>(
        &self,
        f: impl FnOnce(&mut State, Option<&str>) -> VaultResult<R>,
    ) -> VaultResult<R> {
        let token = self.token.as_deref();
        self.store.storage.write(|state| f(state, token))
    }
}

impl VaultClient for LocalVault {
    fn url(&self) -> &str {
        &self.store.url
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    fn login_userpass(&mut self, username: &str, password: &str) -> VaultResult<()> {
        let token = self.store.storage.write(|state| {
            let backend = state.backend(constants::USERPASS)?;
            let accessor = backend.accessor.clone();
            let ttl = Duration::from_secs(backend.max_ttl_secs);

            let policies = state
                .users
                .get(username)
                .filter(|login| login.password_sha256 == password_hash(password))
                .map(|login| login.policies.clone())
                .ok_or_else(|| VaultError::InvalidRequest("invalid username or password".to_string()))?;
            let entity_id = state
                .aliases
                .iter()
                .find(|a| a.name == username && a.mount_accessor == accessor)
                .map(|a| a.canonical_id.clone());

            let token = new_token();
            state.tokens.insert(
                token.clone(),
                TokenRecord {
                    display_name: format!("{}-{}", constants::USERPASS, username),
                    policies,
                    entity_id,
                    username: Some(username.to_string()),
                    renewable: true,
                    ttl_secs: ttl.as_secs(),
                    expires_at: expiry(ttl),
                    root: false,
                },
            );
            Ok(token)
        })?;

        debug!(username, "password login succeeded");
        self.token = Some(token);
        Ok(())
    }

    fn lookup_self(&self) -> VaultResult<TokenInfo> {
        self.read(|state, token| {
            let record = state.authorize(token, "auth/token/lookup-self", Capability::Read)?;
            let ttl = record
                .expires_at
                .map(|at| (at - Utc::now()).num_seconds().max(0) as u64)
                .unwrap_or(0);
            Ok(TokenInfo {
                display_name: record.display_name.clone(),
                policies: record.policies.clone(),
                identity_policies: state.entity_policies(&record),
                entity_id: record.entity_id.clone(),
                username: record.username.clone(),
                renewable: record.renewable,
                ttl: Duration::from_secs(ttl),
                expire_time: record.expires_at,
            })
        })
    }

    fn renew_self(&self) -> VaultResult<()> {
        self.write(|state, token| {
            let record = state.authorize(token, "auth/token/renew-self", Capability::Update)?;
            if !record.renewable {
                return Err(VaultError::InvalidRequest(
                    "lease is not renewable".to_string(),
                ));
            }
            if let Some(entry) = token.and_then(|t| state.tokens.get_mut(t)) {
                entry.expires_at = expiry(Duration::from_secs(entry.ttl_secs));
            }
            Ok(())
        })
    }

    fn list_mounts(&self) -> VaultResult<Vec<String>> {
        self.read(|state, token| {
            state.authorize(token, "sys/mounts", Capability::Read)?;
            Ok(state.mounts.keys().cloned().collect())
        })
    }

    fn enable_kv_mount(&self, path: &str, description: &str) -> VaultResult<()> {
        let path = path.trim_matches('/');
        self.write(|state, token| {
            state.authorize(token, &format!("sys/mounts/{}", path), Capability::Create)?;
            if state.mounts.contains_key(path) {
                return Err(VaultError::InvalidRequest(format!(
                    "path is already in use at {}/",
                    path
                )));
            }
            state.mounts.insert(
                path.to_string(),
                Mount {
                    kind: "kv-v2".to_string(),
                    description: description.to_string(),
                },
            );
            state.secrets.entry(path.to_string()).or_default();
            debug!(mount = path, "secret engine mounted");
            Ok(())
        })
    }

    fn list_auth_methods(&self) -> VaultResult<Vec<AuthMethod>> {
        self.read(|state, token| {
            state.authorize(token, "sys/auth", Capability::Read)?;
            Ok(state
                .auth
                .iter()
                .map(|(path, backend)| AuthMethod {
                    path: path.clone(),
                    kind: backend.kind.clone(),
                    accessor: backend.accessor.clone(),
                })
                .collect())
        })
    }

    fn enable_auth_method(&self, kind: &str) -> VaultResult<()> {
        self.write(|state, token| {
            state.authorize(token, &format!("sys/auth/{}", kind), Capability::Create)?;
            if state.auth.contains_key(kind) {
                return Err(VaultError::InvalidRequest(format!(
                    "path is already in use at {}/",
                    kind
                )));
            }
            state.auth.insert(
                kind.to_string(),
                AuthBackend {
                    kind: kind.to_string(),
                    accessor: new_accessor(kind),
                    max_ttl_secs: DEFAULT_MAX_TTL.as_secs(),
                },
            );
            debug!(kind, "auth method enabled");
            Ok(())
        })
    }

    fn auth_max_ttl(&self, path: &str) -> VaultResult<Duration> {
        self.read(|state, token| {
            state.authorize(token, &format!("sys/auth/{}/tune", path), Capability::Read)?;
            Ok(Duration::from_secs(state.backend(path)?.max_ttl_secs))
        })
    }

    fn put_policy(&self, policy: &Policy) -> VaultResult<()> {
        if policy.name == constants::ROOT_POLICY {
            return Err(VaultError::InvalidRequest(
                "cannot update root policy".to_string(),
            ));
        }
        self.write(|state, token| {
            state.authorize(
                token,
                &format!("sys/policies/acl/{}", policy.name),
                Capability::Update,
            )?;
            state.policies.insert(policy.name.clone(), policy.clone());
            Ok(())
        })
    }

    fn list_policies(&self) -> VaultResult<Vec<PolicyName>> {
        self.read(|state, token| {
            state.authorize(token, "sys/policies/acl", Capability::List)?;
            let mut names: Vec<PolicyName> = state.policies.keys().cloned().collect();
            names.push(constants::ROOT_POLICY.to_string());
            names.sort();
            Ok(names)
        })
    }

    fn read_policy(&self, name: &str) -> VaultResult<Policy> {
        let path = format!("sys/policies/acl/{}", name);
        self.read(|state, token| {
            state.authorize(token, &path, Capability::Read)?;
            state
                .policies
                .get(name)
                .cloned()
                .ok_or(VaultError::InvalidPath(path))
        })
    }

    fn kv_read(&self, mount: &str, path: &str) -> VaultResult<SecretBundle> {
        let mount = mount.trim_matches('/');
        let full = format!("{}/data/{}", mount, path);
        self.read(|state, token| {
            state.authorize(token, &full, Capability::Read)?;
            state
                .secrets
                .get(mount)
                .ok_or_else(|| VaultError::InvalidPath(mount.to_string()))?
                .get(path)
                .map(|data| SecretBundle::from(data.clone()))
                .ok_or(VaultError::InvalidPath(full))
        })
    }

    fn kv_write(&self, mount: &str, path: &str, bundle: &SecretBundle) -> VaultResult<()> {
        let mount = mount.trim_matches('/');
        let full = format!("{}/data/{}", mount, path);
        self.write(|state, token| {
            let exists = state
                .secrets
                .get(mount)
                .map_or(false, |m| m.contains_key(path));
            let capability = if exists {
                Capability::Update
            } else {
                Capability::Create
            };
            state.authorize(token, &full, capability)?;

            let secrets = state
                .secrets
                .get_mut(mount)
                .ok_or_else(|| VaultError::InvalidPath(mount.to_string()))?;
            secrets.insert(path.to_string(), bundle.as_map().clone());
            state.kv_writes += 1;
            debug!(path = %full, keys = bundle.len(), "secret written");
            Ok(())
        })
    }

    fn upsert_userpass_user(
        &self,
        username: &str,
        password: &str,
        policies: &[PolicyName],
    ) -> VaultResult<()> {
        let path = format!("auth/{}/users/{}", constants::USERPASS, username);
        self.write(|state, token| {
            state.backend(constants::USERPASS)?;
            let capability = if state.users.contains_key(username) {
                Capability::Update
            } else {
                Capability::Create
            };
            state.authorize(token, &path, capability)?;
            state.users.insert(
                username.to_string(),
                Login {
                    password_sha256: password_hash(password),
                    policies: policies.to_vec(),
                },
            );
            Ok(())
        })
    }

    fn delete_userpass_user(&self, username: &str) -> VaultResult<()> {
        let path = format!("auth/{}/users/{}", constants::USERPASS, username);
        self.write(|state, token| {
            state.authorize(token, &path, Capability::Delete)?;
            state.users.remove(username);
            Ok(())
        })
    }

    fn list_entities(&self) -> VaultResult<Vec<Entity>> {
        self.read(|state, token| {
            state.authorize(token, "identity/entity/id", Capability::List)?;
            let mut entities: Vec<Entity> = state.entities.values().cloned().collect();
            entities.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(entities)
        })
    }

    fn read_entity_by_name(&self, name: &str) -> VaultResult<Entity> {
        let path = format!("identity/entity/name/{}", name);
        self.read(|state, token| {
            state.authorize(token, &path, Capability::Read)?;
            state
                .entity_by_name(name)
                .cloned()
                .ok_or(VaultError::InvalidPath(path))
        })
    }

    fn upsert_entity(
        &self,
        name: &str,
        metadata: Option<&BTreeMap<String, String>>,
        policies: Option<&[PolicyName]>,
    ) -> VaultResult<Entity> {
        let path = format!("identity/entity/name/{}", name);
        self.write(|state, token| {
            state.authorize(token, &path, Capability::Update)?;

            let id = match state.entity_by_name(name) {
                Some(existing) => existing.id.clone(),
                None => {
                    let id = Uuid::new_v4().to_string();
                    state.entities.insert(
                        id.clone(),
                        Entity {
                            id: id.clone(),
                            name: name.to_string(),
                            metadata: BTreeMap::new(),
                            policies: Vec::new(),
                        },
                    );
                    id
                }
            };

            let entity = state
                .entities
                .get_mut(&id)
                .ok_or_else(|| VaultError::Internal(format!("entity {} vanished", id)))?;
            if let Some(metadata) = metadata {
                entity.metadata = metadata.clone();
            }
            if let Some(policies) = policies {
                entity.policies = policies.to_vec();
            }
            Ok(entity.clone())
        })
    }

    fn create_entity_alias(
        &self,
        name: &str,
        entity_id: &str,
        mount_accessor: &str,
    ) -> VaultResult<()> {
        self.write(|state, token| {
            state.authorize(token, "identity/entity-alias", Capability::Update)?;
            if !state.entities.contains_key(entity_id) {
                return Err(VaultError::InvalidRequest(format!(
                    "entity {} does not exist",
                    entity_id
                )));
            }
            if !state.auth.values().any(|b| b.accessor == mount_accessor) {
                return Err(VaultError::InvalidRequest(format!(
                    "invalid mount accessor {}",
                    mount_accessor
                )));
            }

            match state
                .aliases
                .iter_mut()
                .find(|a| a.name == name && a.mount_accessor == mount_accessor)
            {
                Some(alias) => alias.canonical_id = entity_id.to_string(),
                None => state.aliases.push(Alias {
                    name: name.to_string(),
                    canonical_id: entity_id.to_string(),
                    mount_accessor: mount_accessor.to_string(),
                }),
            }
            Ok(())
        })
    }

    fn delete_entity(&self, name: &str) -> VaultResult<()> {
        let path = format!("identity/entity/name/{}", name);
        self.write(|state, token| {
            state.authorize(token, &path, Capability::Delete)?;
            let id = state
                .entity_by_name(name)
                .map(|e| e.id.clone())
                .ok_or_else(|| VaultError::InvalidPath(path.clone()))?;
            state.entities.remove(&id);
            state.aliases.retain(|a| a.canonical_id != id);
            Ok(())
        })
    }

    fn create_token(&self, request: &TokenRequest) -> VaultResult<String> {
        let path = if request.no_parent {
            "auth/token/create-orphan"
        } else {
            "auth/token/create"
        };
        self.write(|state, token| {
            let caller = state.authorize(token, path, Capability::Update)?;

            if !state.permits(&caller, "auth/token/create", Capability::Sudo) {
                let own = state.caller_policies(&caller);
                if let Some(extra) = request.policies.iter().find(|p| !own.contains(p)) {
                    return Err(VaultError::Forbidden(format!(
                        "child policies must be a subset of the parent's, {} is not",
                        extra
                    )));
                }
            }

            let max = Duration::from_secs(state.backend(TOKEN_BACKEND)?.max_ttl_secs);
            let ttl = if request.ttl.is_zero() || request.ttl > max {
                max
            } else {
                request.ttl
            };

            let mut policies = request.policies.clone();
            if !policies.iter().any(|p| p == constants::DEFAULT_POLICY) {
                policies.push(constants::DEFAULT_POLICY.to_string());
            }

            let secret = new_token();
            state.tokens.insert(
                secret.clone(),
                TokenRecord {
                    display_name: "token".to_string(),
                    policies,
                    entity_id: None,
                    username: None,
                    renewable: request.renewable,
                    ttl_secs: ttl.as_secs(),
                    expires_at: expiry(ttl),
                    root: false,
                },
            );
            debug!(ttl_secs = ttl.as_secs(), "token created");
            Ok(secret)
        })
    }
}
