//! Push and pull of staged environment files.
//!
//! Each push stores every changed environment under a new content-addressed
//! path and records the ids in the ledger; nothing is ever overwritten
//! remotely. Pull resolves the ledger's ids back into staged files.
//!
//! Push runs in two phases. Every writable environment is parsed and
//! normalized first, so a malformed file aborts before any remote write.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::core::codec::{self, SecretBundle};
use crate::core::constants;
use crate::core::env::write_secure;
use crate::core::git;
use crate::core::ledger::Ledger;
use crate::core::outcome::Report;
use crate::core::policy::Role;
use crate::core::project::Project;
use crate::core::session::Session;
use crate::core::types::{EnvName, VersionId};
use crate::error::{Error, Result, SyncError, VaultError};

/// How a push ended.
#[derive(Debug)]
pub enum PushOutcome {
    /// Nothing was ever pushed and nothing was staged: empty files were
    /// created to start from.
    FirstRun {
        created: Vec<PathBuf>,
        copied_dotenv: bool,
    },
    Cancelled,
    Pushed(Report),
}

pub struct SyncEngine<'s, 'p> {
    session: &'s mut Session<'p>,
    project: &'s Project,
}

impl<'s, 'p> SyncEngine<'s, 'p> {
    pub fn new(session: &'s mut Session<'p>, project: &'s Project) -> Self {
        Self { session, project }
    }

    fn load_ledger(&self) -> Result<Ledger> {
        let mut ledger = Ledger::load(&self.project.ledger_path())?;
        for env in self.project.environments() {
            ledger.ensure(&env);
        }
        Ok(ledger)
    }

    fn remote_path(&self, env: &str, id: &VersionId) -> String {
        format!(
            "{}/{}",
            self.project.mount_point(),
            self.project.secret_path(env, id)
        )
    }

    fn fetch(&mut self, env: &str, id: &VersionId) -> Result<SecretBundle> {
        let mount = self.project.mount_point().to_string();
        let path = self.project.secret_path(env, id);
        match self.session.call(|c| c.kv_read(&mount, &path)) {
            Err(Error::Vault(VaultError::InvalidPath(_))) => Err(SyncError::MissingRemote {
                path: self.remote_path(env, id),
            }
            .into()),
            other => other,
        }
    }

    /// Push staged files and record their versions.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::StagingMissing` when versions exist but nothing is
    /// staged, `SyncError::InvalidEnvFile` before any write if a file is
    /// malformed, and store errors from the writes themselves. Versions
    /// written before a failure are still recorded.
    pub fn push(&mut self, no_confirm: bool) -> Result<PushOutcome> {
        let mut ledger = self.load_ledger()?;
        let staging = self.project.staging();

        if !staging.exists() {
            if ledger.all_empty() {
                return self.first_run(&ledger);
            }
            return Err(SyncError::StagingMissing.into());
        }

        let prompter = self.session.prompter();
        let question = format!(
            "Push {} to {}?",
            self.project.path(),
            self.session.url()
        );
        if !no_confirm && !prompter.confirm(&question, false)? {
            return Ok(PushOutcome::Cancelled);
        }

        let role = self.session.role(&self.project.path())?;
        let envs: Vec<EnvName> = ledger.entries().iter().map(|e| e.name.clone()).collect();

        let mut staged = Vec::with_capacity(envs.len());
        for env in &envs {
            if role.can_write(env) {
                let (bundle, id) = staging.normalize(env)?;
                staged.push((env.as_str(), Some((bundle, id))));
            } else {
                staged.push((env.as_str(), None));
            }
        }

        let ledger_path = self.project.ledger_path();
        let mut report = Report::new();
        for (env, entry) in staged {
            let Some((bundle, id)) = entry else {
                ledger.set_id(env, "", false);
                report.warn(env, format!("skipped, {} cannot push it", role));
                continue;
            };

            if ledger.effective_id(env) == Some(id.as_str()) {
                ledger.set_id(env, &id, true);
                debug!(env, "unchanged");
                report.ok(env, "unchanged");
                continue;
            }

            let mount = self.project.mount_point().to_string();
            let path = self.project.secret_path(env, &id);
            if let Err(e) = self.session.call(|c| c.kv_write(&mount, &path, &bundle)) {
                ledger.save(&ledger_path)?;
                return Err(e);
            }
            ledger.set_id(env, &id, true);
            info!(env, id = %id, "pushed");
            report.ok(env, self.remote_path(env, &id));
        }

        ledger.save(&ledger_path)?;
        self.stage_ledger(&mut report)?;
        staging.remove()?;
        Ok(PushOutcome::Pushed(report))
    }

    fn first_run(&mut self, ledger: &Ledger) -> Result<PushOutcome> {
        let staging = self.project.staging();
        staging.create()?;

        let mut created = Vec::new();
        for entry in ledger.entries() {
            created.push(staging.write(&entry.name, &SecretBundle::new())?);
        }
        info!(files = created.len(), "first run, created empty environment files");

        let dotenv = self.project.root().join(constants::DOTENV_FILE);
        let mut copied_dotenv = false;
        if dotenv.is_file() {
            let question = format!(
                "Copy {} to {}?",
                constants::DOTENV_FILE,
                staging.env_path(constants::LOCAL_ENV).display()
            );
            if self.session.prompter().confirm(&question, false)? {
                let text = std::fs::read_to_string(&dotenv)?;
                write_secure(&staging.env_path(constants::LOCAL_ENV), &text)?;
                copied_dotenv = true;
            }
        }

        Ok(PushOutcome::FirstRun {
            created,
            copied_dotenv,
        })
    }

    fn stage_ledger(&self, report: &mut Report) -> Result<()> {
        let root = self.project.root();
        if !git::is_repository(root) {
            return Ok(());
        }
        let question = format!("Stage {} in git?", constants::LEDGER_FILE);
        if self.session.prompter().confirm(&question, false)? {
            git::stage(root, constants::LEDGER_FILE)?;
            report.ok("git", format!("staged {}", constants::LEDGER_FILE));
        } else {
            report.warn("git", format!("remember to commit {}", constants::LEDGER_FILE));
        }
        Ok(())
    }

    /// Fetch every recorded version into the staging directory.
    ///
    /// Existing files are only replaced after confirmation, and a `.bak`
    /// copy is kept. Developers never receive live production secrets: they
    /// get the version a maintainer parked for them if the store lets them
    /// read it, and an empty file otherwise.
    pub fn pull(&mut self) -> Result<Report> {
        let ledger = self.load_ledger()?;
        let role = self.session.role(&self.project.path())?;
        let staging = self.project.staging();
        staging.create()?;

        let prompter = self.session.prompter();
        let mut report = Report::new();
        for entry in ledger.entries() {
            let env = entry.name.as_str();
            let target = staging.env_path(env);
            if target.exists() {
                let question = format!(
                    "{} exists. Overwrite it (a .bak copy is kept)?",
                    target.display()
                );
                if !prompter.confirm(&question, false)? {
                    report.warn(env, "kept existing file");
                    continue;
                }
                let backup = staging.backup(env)?;
                debug!(backup = %backup.display(), "backed up");
            }

            let bundle = if role.can_write(env) {
                match entry.effective_id() {
                    Some(id) => {
                        let bundle = self.fetch(env, &id.to_string())?;
                        report.ok(env, format!("{} keys", bundle.len()));
                        bundle
                    }
                    None => {
                        report.warn(env, "never pushed, created an empty file");
                        SecretBundle::new()
                    }
                }
            } else {
                self.parked_snapshot(role, env, entry.prev_id.as_deref(), &mut report)?
            };

            staging.write(env, &bundle)?;
        }

        Ok(report)
    }

    fn parked_snapshot(
        &mut self,
        role: Role,
        env: &str,
        prev_id: Option<&str>,
        report: &mut Report,
    ) -> Result<SecretBundle> {
        let Some(id) = prev_id.filter(|id| !id.is_empty()) else {
            report.warn(env, format!("not readable as {}, created an empty file", role));
            return Ok(SecretBundle::new());
        };

        let mount = self.project.mount_point().to_string();
        let path = self.project.secret_path(env, &id.to_string());
        match self.session.client()?.kv_read(&mount, &path) {
            Ok(bundle) => {
                report.warn(env, "showing the last version parked by a maintainer");
                Ok(bundle)
            }
            Err(VaultError::Forbidden(_)) => {
                warn!(env, %role, "no read access, writing an empty file");
                report.warn(env, format!("not readable as {}, created an empty file", role));
                Ok(SecretBundle::new())
            }
            Err(VaultError::InvalidPath(_)) => Err(SyncError::MissingRemote {
                path: format!("{}/{}", mount, path),
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Canonical text of the recorded version of `env`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NoVersion` if the environment was never pushed.
    pub fn get_envs(&mut self, env: &str) -> Result<String> {
        if !self.project.has_environment(env) {
            return Err(SyncError::UnknownEnvironment(env.to_string()).into());
        }
        let ledger = self.load_ledger()?;
        let id = ledger
            .effective_id(env)
            .map(str::to_string)
            .ok_or_else(|| SyncError::NoVersion {
                env: env.to_string(),
            })?;
        let bundle = self.fetch(env, &id)?;
        Ok(codec::encode(&bundle, env))
    }
}
