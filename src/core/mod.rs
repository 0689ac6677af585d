//! Core library components.
//!
//! This module contains the reusable business logic: the canonical env
//! codec, project configuration, the secret store surface, sessions, RBAC
//! policies, and the push/pull, provisioning, user, and migration workflows.

pub mod codec;
pub mod config;
pub mod constants;
pub mod driver;
pub mod env;
pub mod git;
pub mod ledger;
pub mod migrate;
pub mod outcome;
pub mod policy;
pub mod project;
pub mod prompt;
pub mod provision;
pub mod session;
pub mod sync;
pub mod types;
pub mod users;
pub mod validation;
pub mod vault;
pub mod words;

#[cfg(test)]
pub(crate) mod testing;
