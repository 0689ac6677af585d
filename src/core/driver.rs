//! Credential drivers.
//!
//! A project names its driver in `[credentials] driver`. Drivers are looked
//! up in a fixed registry; each exposes the generic pull/push/get operations
//! plus the administrative actions it supports.

use std::fmt;

use tracing::debug;

use crate::core::codec;
use crate::core::config::ProjectConfig;
use crate::core::migrate::{LegacyDirectory, LegacyProvider};
use crate::core::outcome::Report;
use crate::core::project::Project;
use crate::core::session::Session;
use crate::core::sync::{PushOutcome, SyncEngine};
use crate::error::{ConfigError, DriverError, Result, SyncError};

/// What a driver call operates on.
pub struct DriverContext<'s, 'p> {
    pub session: &'s mut Session<'p>,
    pub project: &'s Project,
}

/// Administrative actions a driver may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Init,
    CreateUser,
    EditUser,
    DeleteUser,
    ChangeUserPassword,
    SaveUserToGlobalConfig,
    AssignPolicies,
    CreateDeploymentToken,
    ListUsers,
    SearchUsers,
    MigrateFromLegacy,
}

impl Action {
    pub const ALL: &'static [Action] = &[
        Action::Init,
        Action::CreateUser,
        Action::EditUser,
        Action::DeleteUser,
        Action::ChangeUserPassword,
        Action::SaveUserToGlobalConfig,
        Action::AssignPolicies,
        Action::CreateDeploymentToken,
        Action::ListUsers,
        Action::SearchUsers,
        Action::MigrateFromLegacy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Init => "init",
            Action::CreateUser => "create_user",
            Action::EditUser => "edit_user",
            Action::DeleteUser => "delete_user",
            Action::ChangeUserPassword => "change_user_password",
            Action::SaveUserToGlobalConfig => "save_user_to_global_config",
            Action::AssignPolicies => "assign_policies",
            Action::CreateDeploymentToken => "create_deployment_token",
            Action::ListUsers => "list_users",
            Action::SearchUsers => "search_users",
            Action::MigrateFromLegacy => "migrate_from_legacy",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Action::Init => "Provision the store for this project",
            Action::CreateUser => "Create a user with a generated password",
            Action::EditUser => "Edit a user's name, e-mail and company",
            Action::DeleteUser => "Delete a user",
            Action::ChangeUserPassword => "Generate a new password for a user",
            Action::SaveUserToGlobalConfig => "Save a login to the operator config",
            Action::AssignPolicies => "Replace the policies assigned to a user",
            Action::CreateDeploymentToken => "Create a read-only token for CI/CD",
            Action::ListUsers => "List users and their project access",
            Action::SearchUsers => "Fuzzy search users",
            Action::MigrateFromLegacy => "Import environments from the legacy provider",
        }
    }

    /// Parse an action name; `-` and `_` are interchangeable.
    pub fn parse(name: &str) -> Result<Self> {
        let normalized = name.trim().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == normalized)
            .ok_or_else(|| DriverError::UnknownAction(name.to_string()).into())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations every credentials driver provides.
pub trait CredentialDriver {
    fn name(&self) -> &'static str;

    /// Labelled facts about the driver's configuration for display.
    fn info(&self, config: &ProjectConfig) -> Vec<(&'static str, String)>;

    /// Check that the project is configured for this driver.
    fn configure(&self, project: &Project) -> Result<()>;

    /// Canonical text of one environment.
    fn get_envs(&self, ctx: &mut DriverContext<'_, '_>, env: &str) -> Result<String>;

    fn pull(&self, ctx: &mut DriverContext<'_, '_>) -> Result<Report>;

    fn push(&self, ctx: &mut DriverContext<'_, '_>, no_confirm: bool) -> Result<PushOutcome>;

    fn actions(&self) -> &'static [Action];
}

type Constructor = fn() -> Box<dyn CredentialDriver>;

const REGISTRY: &[(&str, Constructor)] = &[("vault", vault_driver), ("legacy", legacy_driver)];

fn vault_driver() -> Box<dyn CredentialDriver> {
    Box::new(VaultDriver)
}

fn legacy_driver() -> Box<dyn CredentialDriver> {
    Box::new(LegacyDriver)
}

/// Registered driver names.
pub fn names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(name, _)| *name)
}

/// Construct the driver registered under `name`.
///
/// # Errors
///
/// Returns `DriverError::Unknown` for unregistered names.
pub fn lookup(name: &str) -> Result<Box<dyn CredentialDriver>> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == name)
        .map(|(_, construct)| construct())
        .ok_or_else(|| DriverError::Unknown(name.to_string()).into())
}

/// The driver a project is configured with.
pub fn for_project(project: &Project) -> Result<Box<dyn CredentialDriver>> {
    let driver = lookup(&project.config().credentials.driver)?;
    driver.configure(project)?;
    debug!(driver = driver.name(), "driver selected");
    Ok(driver)
}

/// The secret store driver.
#[derive(Debug, Default)]
pub struct VaultDriver;

impl CredentialDriver for VaultDriver {
    fn name(&self) -> &'static str {
        "vault"
    }

    fn info(&self, config: &ProjectConfig) -> Vec<(&'static str, String)> {
        vec![
            ("driver", self.name().to_string()),
            (
                "project",
                format!("{}/{}", config.project.group, config.project.name),
            ),
            ("url", config.vault.url.clone()),
            ("mount point", config.vault.mount_point.clone()),
            (
                "auto token renewal",
                config.vault.auto_token_renewal.to_string(),
            ),
            ("max escalations", config.vault.max_escalations.to_string()),
        ]
    }

    fn configure(&self, project: &Project) -> Result<()> {
        if project.config().vault.url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "vault.url" }.into());
        }
        Ok(())
    }

    fn get_envs(&self, ctx: &mut DriverContext<'_, '_>, env: &str) -> Result<String> {
        SyncEngine::new(ctx.session, ctx.project).get_envs(env)
    }

    fn pull(&self, ctx: &mut DriverContext<'_, '_>) -> Result<Report> {
        SyncEngine::new(ctx.session, ctx.project).pull()
    }

    fn push(&self, ctx: &mut DriverContext<'_, '_>, no_confirm: bool) -> Result<PushOutcome> {
        SyncEngine::new(ctx.session, ctx.project).push(no_confirm)
    }

    fn actions(&self) -> &'static [Action] {
        Action::ALL
    }
}

/// Read-only access to exported legacy files.
#[derive(Debug, Default)]
pub struct LegacyDriver;

impl CredentialDriver for LegacyDriver {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn info(&self, config: &ProjectConfig) -> Vec<(&'static str, String)> {
        let dir = config
            .legacy
            .as_ref()
            .map(|l| l.dir.display().to_string())
            .unwrap_or_else(|| "(not configured)".to_string());
        vec![
            ("driver", self.name().to_string()),
            (
                "project",
                format!("{}/{}", config.project.group, config.project.name),
            ),
            ("directory", dir),
        ]
    }

    fn configure(&self, project: &Project) -> Result<()> {
        let provider = LegacyDirectory::from_project(project)?;
        if !provider.dir().is_dir() {
            return Err(ConfigError::InvalidValue {
                field: "legacy.dir",
                reason: format!("{} is not a directory", provider.dir().display()),
            }
            .into());
        }
        Ok(())
    }

    fn get_envs(&self, ctx: &mut DriverContext<'_, '_>, env: &str) -> Result<String> {
        if !ctx.project.has_environment(env) {
            return Err(SyncError::UnknownEnvironment(env.to_string()).into());
        }
        let bundle = LegacyDirectory::from_project(ctx.project)?.fetch(env)?;
        Ok(codec::encode(&bundle, env))
    }

    fn pull(&self, ctx: &mut DriverContext<'_, '_>) -> Result<Report> {
        let provider = LegacyDirectory::from_project(ctx.project)?;
        let prompter = ctx.session.prompter();
        let staging = ctx.project.staging();
        staging.create()?;

        let mut report = Report::new();
        for env in ctx.project.environments() {
            let target = staging.env_path(&env);
            if target.exists() {
                let question = format!(
                    "{} exists. Overwrite it (a .bak copy is kept)?",
                    target.display()
                );
                if !prompter.confirm(&question, false)? {
                    report.warn(env.as_str(), "kept existing file");
                    continue;
                }
                staging.backup(&env)?;
            }
            match provider.fetch(&env) {
                Ok(bundle) => {
                    staging.write(&env, &bundle)?;
                    report.ok(env.as_str(), format!("{} keys", bundle.len()));
                }
                Err(e) => report.fail(env.as_str(), e.to_string()),
            }
        }
        Ok(report)
    }

    fn push(&self, _ctx: &mut DriverContext<'_, '_>, _no_confirm: bool) -> Result<PushOutcome> {
        Err(DriverError::Unsupported {
            driver: "legacy",
            operation: "push",
        }
        .into())
    }

    fn actions(&self) -> &'static [Action] {
        &[]
    }
}
