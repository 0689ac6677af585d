//! Bullpen - per-environment secret bundles synced with a policy-scoped
//! secret store.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── credentials   # pull / push / get / info
//! │   ├── actions/      # init, users, deployment tokens, migration
//! │   ├── dev_store     # Local file-backed store
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── codec         # Canonical env text, version ids
//!     ├── config        # .bullpen.toml and ~/.bullpen/config.toml
//!     ├── ledger        # .bullpen-vault.toml version ledger
//!     ├── vault/        # Secret store surface
//!     │   ├── mod       # VaultClient and Connector traits
//!     │   └── local     # In-process store enforcing ACL policies
//!     ├── session       # Login, renewal, bounded root escalation
//!     ├── policy        # Policies, roles, RBAC checks
//!     ├── sync          # Push / pull protocol
//!     ├── provision     # Mounts, backends, policies, ledger
//!     ├── users         # User administration, deployment tokens
//!     ├── migrate       # Legacy provider migration
//!     └── driver        # Credential driver registry
//! ```
//!
//! # Features
//!
//! - Content-addressed versions: unchanged environments are never rewritten
//! - Developer and maintainer roles, with production reserved for maintainers
//! - Append-only remote history; the ledger records what is live
//! - Every store call can escalate to a root token, a bounded number of times

pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::codec::{decode, encode, version_id, SecretBundle};
pub use crate::core::ledger::Ledger;
pub use crate::core::project::{Project, ProjectPath};
pub use crate::core::session::Session;
pub use crate::core::sync::{PushOutcome, SyncEngine};
pub use crate::error::{Error, Result};
