//! Store provisioning for a project.
//!
//! [`Provisioner::provision`] is idempotent: it creates what is missing and
//! leaves existing mounts, backends, and ledger ids alone. Policies are
//! rewritten every time so that new environments are picked up.

use std::path::Path;

use tracing::{debug, info};

use crate::core::config::{self, GlobalConfig};
use crate::core::constants;
use crate::core::git;
use crate::core::ledger::Ledger;
use crate::core::outcome::{Outcome, Report};
use crate::core::policy::{self, Role};
use crate::core::project::Project;
use crate::core::session::Session;
use crate::core::users::{self, CiVariableStore, TokenDelivery, UserAdmin, UserCredentials};
use crate::error::{Result, ValidationError};

const MOUNT_DESCRIPTION: &str = "bullpen environment variables";

/// What `init` produced beyond the provisioning report.
#[derive(Debug, Default)]
pub struct InitSummary {
    pub report: Report,
    pub created_user: Option<UserCredentials>,
    pub deployment_token: Option<TokenDelivery>,
}

pub struct Provisioner<'s, 'p> {
    session: &'s mut Session<'p>,
    project: &'s Project,
}

impl<'s, 'p> Provisioner<'s, 'p> {
    pub fn new(session: &'s mut Session<'p>, project: &'s Project) -> Self {
        Self { session, project }
    }

    /// Create the mount, the password backend, the policies, the gitignore
    /// rules, and the ledger, skipping whatever already exists.
    pub fn provision(&mut self) -> Result<Report> {
        let mut report = Report::new();
        let mount = self.project.mount_point().to_string();
        let path = self.project.path();
        let envs = self.project.environments();

        let mounts = self.session.call(|c| c.list_mounts())?;
        if mounts.iter().any(|m| m == &mount) {
            report.ok("mount", format!("{} already enabled", mount));
        } else {
            self.session
                .call(|c| c.enable_kv_mount(&mount, MOUNT_DESCRIPTION))?;
            info!(mount = %mount, "kv mount enabled");
            report.ok("mount", format!("enabled {}", mount));
        }

        let methods = self.session.call(|c| c.list_auth_methods())?;
        if methods.iter().any(|m| m.kind == constants::USERPASS) {
            report.ok("auth", "userpass already enabled");
        } else {
            self.session
                .call(|c| c.enable_auth_method(constants::USERPASS))?;
            info!("userpass enabled");
            report.ok("auth", "enabled userpass");
        }

        let policies = [
            policy::project_policy(&mount, &path, Role::Developer, &envs),
            policy::project_policy(&mount, &path, Role::Maintainer, &envs),
            policy::deployment_policy(&mount, &path),
            policy::admin_policy(&mount),
        ];
        for p in &policies {
            self.session.call(|c| c.put_policy(p))?;
            debug!(policy = %p.name, "policy written");
        }
        let names: Vec<&str> = policies.iter().map(|p| p.name.as_str()).collect();
        report.ok("policies", names.join(", "));

        if config::ensure_gitignore(self.project.root())? {
            report.ok(".gitignore", "added staging rules");
        } else {
            report.ok(".gitignore", "already protects staged files");
        }

        let ledger_path = self.project.ledger_path();
        if ledger_path.exists() {
            let mut ledger = Ledger::load(&ledger_path)?;
            for env in &envs {
                ledger.ensure(env);
            }
            ledger.save(&ledger_path)?;
            report.ok(constants::LEDGER_FILE, "kept recorded versions");
        } else {
            Ledger::init(&envs).save(&ledger_path)?;
            report.ok(constants::LEDGER_FILE, "created");
        }

        info!(project = %path, "provisioned");
        Ok(report)
    }

    /// Provision, then offer a first user, saving that user as the operator,
    /// and a deployment token.
    pub fn init(
        &mut self,
        operator_config: &Path,
        ci_store: Option<&dyn CiVariableStore>,
    ) -> Result<InitSummary> {
        let mut summary = InitSummary {
            report: self.provision()?,
            ..InitSummary::default()
        };
        let prompter = self.session.prompter();

        let empty = UserAdmin::new(&mut *self.session).list_users()?.is_empty();
        if empty && prompter.confirm("The store has no users yet. Create one now?", false)? {
            let (username, metadata) =
                users::prompt_user(prompter, None, &Default::default())?;
            let created =
                UserAdmin::new(&mut *self.session).create_user(&username, &metadata, None)?;
            match created {
                Outcome::Ok(creds) => {
                    summary.report.ok("user", format!("created {}", creds.username));
                    let question = format!(
                        "Save {} to {}?",
                        creds.username,
                        operator_config.display()
                    );
                    if prompter.confirm(&question, true)? {
                        let mut global = GlobalConfig::load_from(operator_config)?;
                        global.set_credentials(&creds.username, &creds.password);
                        global.save_to(operator_config)?;
                        summary.report.ok("operator", "credentials saved");
                    }
                    summary.created_user = Some(creds);
                }
                other => summary
                    .report
                    .warn("user", other.message().unwrap_or_default().to_string()),
            }
        }

        if prompter.confirm("Create a deployment token for CI/CD?", false)? {
            let path = self.project.path();
            let mut admin = UserAdmin::new(&mut *self.session);
            let max = admin.max_token_ttl_days()?;
            let answer = prompter.input("Token lifetime in days", Some(&max.to_string()))?;
            let days: u64 = answer.trim().parse().map_err(|_| ValidationError::InvalidField {
                field: "ttl",
                reason: format!("'{}' is not a number of days", answer.trim()),
            })?;
            let token = admin.create_deployment_token(&path, days)?;
            summary.report.ok("deployment token", format!("valid for {} days", days));
            summary.deployment_token =
                Some(users::deliver_deployment_token(prompter, token, ci_store)?);
        }

        if git::is_repository(self.project.root()) {
            summary.report.warn(
                "git",
                format!(
                    "commit {}, {} and .gitignore",
                    constants::CONFIG_FILE,
                    constants::LEDGER_FILE
                ),
            );
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::prompt::{Answer, Scripted};
    use crate::core::testing::Fixture;
    use crate::core::vault::VaultClient;
    use tempfile::TempDir;

    #[test]
    fn test_provision_is_idempotent() {
        let fx = Fixture::new(&["test", "production"]);
        let prompter = Scripted::defaults();
        let mut session = fx.root_session(&prompter);

        Provisioner::new(&mut session, &fx.project).provision().unwrap();
        let report = Provisioner::new(&mut session, &fx.project).provision().unwrap();
        assert!(!report.has_failures());

        let admin = fx.store.client_with_token(&fx.root);
        assert_eq!(admin.list_mounts().unwrap(), vec!["bullpen"]);
        let userpass = admin
            .list_auth_methods()
            .unwrap()
            .into_iter()
            .filter(|m| m.kind == "userpass")
            .count();
        assert_eq!(userpass, 1);

        let gitignore = std::fs::read_to_string(fx.project.root().join(".gitignore")).unwrap();
        assert_eq!(gitignore.matches("envs/\n").count(), 1);

        let policies = admin.list_policies().unwrap();
        for name in ["acme/api:developer", "acme/api:maintainer", "acme/api:deployment", "admin"] {
            assert!(policies.iter().any(|p| p == name), "missing {}", name);
        }
    }

    #[test]
    fn test_provision_keeps_recorded_versions() {
        let fx = Fixture::new(&["test"]);
        let mut ledger = Ledger::init(&["local", "test"]);
        ledger.set_id("test", "abc", true);
        ledger.save(&fx.project.ledger_path()).unwrap();

        let prompter = Scripted::defaults();
        let mut session = fx.root_session(&prompter);
        Provisioner::new(&mut session, &fx.project).provision().unwrap();

        let ledger = Ledger::load(&fx.project.ledger_path()).unwrap();
        assert_eq!(ledger.id("test"), "abc");
        assert_eq!(ledger.entries().len(), 2);
    }

    #[test]
    fn test_init_creates_first_user_and_saves_operator() {
        let fx = Fixture::new(&["test"]);
        let home = TempDir::new().unwrap();
        let operator = home.path().join("config.toml");
        let prompter = Scripted::new([
            Answer::Yes,
            Answer::Text("jane".into()),
            Answer::Text("Jane".into()),
            Answer::Text("Doe".into()),
            Answer::Text("Acme".into()),
            Answer::Text("jane@example.com".into()),
            Answer::Yes,
            Answer::No,
        ]);
        let mut session = fx.root_session(&prompter);

        let summary = Provisioner::new(&mut session, &fx.project)
            .init(&operator, None)
            .unwrap();
        let creds = summary.created_user.unwrap();
        assert_eq!(creds.username, "jane");
        assert!(summary.deployment_token.is_none());

        let global = GlobalConfig::load_from(&operator).unwrap();
        assert_eq!(global.username(), Some("jane"));
        fx.store
            .client()
            .login_userpass("jane", &creds.password)
            .unwrap();
    }

    #[test]
    fn test_init_deployment_token_shown_without_store() {
        let fx = Fixture::new(&["test"]);
        let home = TempDir::new().unwrap();
        let prompter = Scripted::new([Answer::No, Answer::Yes, Answer::Text("7".into())]);
        let mut session = fx.root_session(&prompter);

        let summary = Provisioner::new(&mut session, &fx.project)
            .init(&home.path().join("config.toml"), None)
            .unwrap();
        assert!(matches!(
            summary.deployment_token,
            Some(TokenDelivery::Shown(_))
        ));
        assert!(!home.path().join("config.toml").exists());
    }
}
