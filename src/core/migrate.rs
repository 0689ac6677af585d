//! Migration from the legacy credentials provider.
//!
//! The legacy provider here is a directory of exported `<environment>.env`
//! files. Migration stages each environment, optionally pushes, and then
//! checks both directions key by key.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::codec::{self, SecretBundle};
use crate::core::env::write_secure;
use crate::core::outcome::Report;
use crate::core::policy::Role;
use crate::core::project::Project;
use crate::core::session::Session;
use crate::core::sync::{PushOutcome, SyncEngine};
use crate::core::users::CiVariableStore;
use crate::error::{ConfigError, Result, SyncError};

/// File inside the legacy directory that receives CI variables.
const CI_FILE: &str = "ci.env";

/// Source of bundles being migrated.
pub trait LegacyProvider {
    fn name(&self) -> &str;

    /// The bundle the provider holds for `env`.
    fn fetch(&self, env: &str) -> Result<SecretBundle>;
}

/// Exported `<environment>.env` files in one directory.
#[derive(Debug, Clone)]
pub struct LegacyDirectory {
    dir: PathBuf,
}

impl LegacyDirectory {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The directory named by `[legacy] dir`, relative to the project root.
    pub fn from_project(project: &Project) -> Result<Self> {
        let legacy = project
            .config()
            .legacy
            .as_ref()
            .ok_or(ConfigError::MissingField { field: "legacy.dir" })?;
        Ok(Self::new(project.root().join(&legacy.dir)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn env_path(&self, env: &str) -> PathBuf {
        self.dir.join(format!("{}.env", env))
    }
}

impl LegacyProvider for LegacyDirectory {
    fn name(&self) -> &str {
        "legacy"
    }

    fn fetch(&self, env: &str) -> Result<SecretBundle> {
        let path = self.env_path(env);
        if !path.exists() {
            return Err(SyncError::MissingEnvFile(path.display().to_string()).into());
        }
        let text = std::fs::read_to_string(&path)?;
        codec::decode(&text).map_err(|source| {
            SyncError::InvalidEnvFile {
                path: path.display().to_string(),
                source,
            }
            .into()
        })
    }
}

impl CiVariableStore for LegacyDirectory {
    fn name(&self) -> &str {
        CI_FILE
    }

    /// Merge `key` into `ci.env`, which only its owner can read.
    fn set_masked_variable(&self, key: &str, value: &str) -> Result<()> {
        let path = self.dir.join(CI_FILE);
        let mut bundle = if path.exists() {
            codec::decode(&std::fs::read_to_string(&path)?).map_err(|source| {
                SyncError::InvalidEnvFile {
                    path: path.display().to_string(),
                    source,
                }
            })?
        } else {
            std::fs::create_dir_all(&self.dir)?;
            SecretBundle::new()
        };
        bundle.insert(key, value);
        write_secure(&path, &codec::encode(&bundle, "ci"))?;
        debug!(key, path = %path.display(), "ci variable written");
        Ok(())
    }
}

/// First key of `expected` that `actual` lacks or holds a different value for.
pub fn first_mismatch<'a>(expected: &'a SecretBundle, actual: &SecretBundle) -> Option<&'a str> {
    expected
        .iter()
        .find(|(key, value)| actual.get(key) != Some(*value))
        .map(|(key, _)| key)
}

fn decode_labelled(label: &str, text: &str) -> Result<SecretBundle> {
    codec::decode(text).map_err(|source| {
        SyncError::InvalidEnvFile {
            path: label.to_string(),
            source,
        }
        .into()
    })
}

pub struct MigrationBridge<'s, 'p> {
    session: &'s mut Session<'p>,
    project: &'s Project,
}

impl<'s, 'p> MigrationBridge<'s, 'p> {
    pub fn new(session: &'s mut Session<'p>, project: &'s Project) -> Self {
        Self { session, project }
    }

    /// Stage every environment from `provider`, push when asked, and verify
    /// the result against the provider.
    ///
    /// Fetch failures and mismatches are reported per environment and do not
    /// stop the remaining environments.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotPermitted` unless the session is a maintainer.
    pub fn migrate(&mut self, provider: &dyn LegacyProvider, push: bool) -> Result<Report> {
        let role = self.session.role(&self.project.path())?;
        if role != Role::Maintainer {
            return Err(SyncError::NotPermitted {
                role: role.to_string(),
                action: format!("migrate from {}", provider.name()),
            }
            .into());
        }

        let mut report = Report::new();
        let question = format!(
            "Migrate {} from {}? Staged files will be replaced.",
            self.project.path(),
            provider.name()
        );
        if !self.session.prompter().confirm(&question, false)? {
            report.warn("migration", "cancelled");
            return Ok(report);
        }

        let staging = self.project.staging();
        staging.create()?;
        let mut fetched = Vec::new();
        for env in self.project.environments() {
            match provider.fetch(&env) {
                Ok(bundle) => {
                    staging.write(&env, &bundle)?;
                    report.ok(env.as_str(), format!("staged {} keys", bundle.len()));
                    fetched.push((env, bundle));
                }
                Err(e) => report.fail(env.as_str(), e.to_string()),
            }
        }

        let pushed = push && !report.has_failures();
        if pushed {
            let outcome = SyncEngine::new(&mut *self.session, self.project).push(true)?;
            if let PushOutcome::Pushed(push_report) = outcome {
                for mut step in push_report.steps {
                    step.label = format!("push {}", step.label);
                    report.push(step);
                }
            }
        } else if push {
            report.warn("push", "skipped, some environments could not be fetched");
        }

        for (env, legacy) in &fetched {
            let label = format!("verify {}", env);
            let current = if pushed {
                SyncEngine::new(&mut *self.session, self.project)
                    .get_envs(env)
                    .and_then(|text| decode_labelled(env, &text))
            } else {
                std::fs::read_to_string(staging.env_path(env))
                    .map_err(Into::into)
                    .and_then(|text| decode_labelled(env, &text))
            };
            let current = match current {
                Ok(bundle) => bundle,
                Err(e) => {
                    report.fail(label, e.to_string());
                    continue;
                }
            };

            let missing = first_mismatch(legacy, &current);
            let extra = first_mismatch(&current, legacy);
            if let Some(key) = missing {
                report.fail(label.as_str(), format!("{} from {} differs", key, provider.name()));
            }
            if let Some(key) = extra {
                report.fail(
                    label.as_str(),
                    format!("{} is not in {}", key, provider.name()),
                );
            }
            if missing.is_none() && extra.is_none() {
                report.ok(label, "consistent");
            }
        }

        info!(
            project = %self.project.path(),
            failures = report.failures().count(),
            "migration finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::Ledger;
    use crate::core::prompt::{Answer, Scripted};
    use crate::core::testing::Fixture;
    use crate::error::Error;
    use tempfile::TempDir;

    fn legacy(envs: &[(&str, &str)]) -> (TempDir, LegacyDirectory) {
        let tmp = TempDir::new().unwrap();
        for (env, text) in envs {
            std::fs::write(tmp.path().join(format!("{}.env", env)), text).unwrap();
        }
        let dir = LegacyDirectory::new(tmp.path());
        (tmp, dir)
    }

    #[test]
    fn test_first_mismatch_in_both_directions() {
        let a: SecretBundle = [("A", "1"), ("B", "2")].into_iter().collect();
        let b: SecretBundle = [("A", "1"), ("B", "3"), ("C", "4")].into_iter().collect();
        assert_eq!(first_mismatch(&a, &b), Some("B"));
        assert_eq!(first_mismatch(&b, &a), Some("B"));
        let c: SecretBundle = [("A", "1"), ("B", "2"), ("C", "4")].into_iter().collect();
        assert_eq!(first_mismatch(&a, &c), None);
        assert_eq!(first_mismatch(&c, &a), Some("C"));
    }

    #[test]
    fn test_migrate_and_push() {
        let fx = Fixture::provisioned(&["test"]);
        let (_tmp, provider) = legacy(&[("local", "A=1\n"), ("test", "DB_HOST=db\nDB_PORT=5432\n")]);
        let prompter = Scripted::new([Answer::Yes]);
        let mut session = fx.root_session(&prompter);

        let report = MigrationBridge::new(&mut session, &fx.project)
            .migrate(&provider, true)
            .unwrap();
        assert!(!report.has_failures(), "{:?}", report);
        assert!(report.find("verify test").is_some());
        assert_eq!(fx.store.kv_writes().unwrap(), 2);

        let ledger = Ledger::load(&fx.project.ledger_path()).unwrap();
        let remote = fx.remote("test", ledger.id("test"));
        assert_eq!(remote.get("DB_HOST"), Some("db"));
    }

    #[test]
    fn test_missing_legacy_environment_is_reported() {
        let fx = Fixture::provisioned(&["test"]);
        let (_tmp, provider) = legacy(&[("local", "A=1\n")]);
        let prompter = Scripted::new([Answer::Yes]);
        let mut session = fx.root_session(&prompter);

        let report = MigrationBridge::new(&mut session, &fx.project)
            .migrate(&provider, true)
            .unwrap();
        assert!(report.find("test").unwrap().outcome.is_fail());
        assert!(report.find("push").is_some());
        assert!(report.find("verify local").unwrap().outcome.is_ok());
        assert_eq!(fx.store.kv_writes().unwrap(), 0);
    }

    #[test]
    fn test_migration_requires_maintainer() {
        let fx = Fixture::provisioned(&["test"]);
        fx.add_user("dev", &["acme/api:developer"]);
        let (_tmp, provider) = legacy(&[]);
        let prompter = Scripted::defaults();
        let mut session = fx.user_session("dev", &prompter);

        let err = MigrationBridge::new(&mut session, &fx.project)
            .migrate(&provider, false)
            .unwrap_err();
        assert!(matches!(err, Error::Sync(SyncError::NotPermitted { .. })));
    }

    #[test]
    fn test_ci_variables_merge_into_one_file() {
        let tmp = TempDir::new().unwrap();
        let store = LegacyDirectory::new(tmp.path().join("legacy"));
        store.set_masked_variable("VAULT_TOKEN", "hvs.one").unwrap();
        store.set_masked_variable("OTHER", "x").unwrap();
        store.set_masked_variable("VAULT_TOKEN", "hvs.two").unwrap();

        let text = std::fs::read_to_string(tmp.path().join("legacy").join("ci.env")).unwrap();
        let bundle = codec::decode(&text).unwrap();
        assert_eq!(bundle.get("VAULT_TOKEN"), Some("hvs.two"));
        assert_eq!(bundle.get("OTHER"), Some("x"));
    }
}
