//! Shared fixtures for unit tests: a project in a temporary directory backed
//! by an in-memory store.

use tempfile::TempDir;

use crate::core::codec::SecretBundle;
use crate::core::config::{OperatorCredentials, ProjectConfig};
use crate::core::outcome::Outcome;
use crate::core::project::Project;
use crate::core::prompt::{Prompter, Scripted};
use crate::core::provision::Provisioner;
use crate::core::session::Session;
use crate::core::users::{UserAdmin, UserMetadata};
use crate::core::vault::LocalStore;

pub(crate) struct Fixture {
    // Held for its Drop.
    _dir: TempDir,
    pub project: Project,
    pub store: LocalStore,
    pub root: String,
}

impl Fixture {
    /// Unprovisioned project `acme/api`.
    pub fn new(envs: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        let config = ProjectConfig::new("acme", "api", envs);
        config.save(dir.path()).unwrap();
        let project = Project::load(dir.path()).unwrap();
        let (store, root) = LocalStore::in_memory();
        Self {
            _dir: dir,
            project,
            store,
            root,
        }
    }

    /// Project with its store provisioned.
    pub fn provisioned(envs: &[&str]) -> Self {
        let fx = Self::new(envs);
        let prompter = Scripted::defaults();
        let mut session = fx.root_session(&prompter);
        Provisioner::new(&mut session, &fx.project)
            .provision()
            .unwrap();
        fx
    }

    pub fn root_session<'p>(&self, prompter: &'p dyn Prompter) -> Session<'p> {
        Session::new(Box::new(self.store.clone()), prompter)
            .with_root_token(Some(self.root.clone()))
    }

    /// Create `username` (password `pw`) holding `policies`.
    pub fn add_user(&self, username: &str, policies: &[&str]) {
        let prompter = Scripted::defaults();
        let mut session = self.root_session(&prompter);
        let mut admin = UserAdmin::new(&mut session);
        let metadata = UserMetadata {
            firstname: username.to_string(),
            lastname: "Test".to_string(),
            email: format!("{}@example.com", username),
            companyname: "Acme".to_string(),
        };
        let created = admin.create_user(username, &metadata, Some("pw")).unwrap();
        assert!(matches!(created, Outcome::Ok(_)));
        let policies: Vec<String> = policies.iter().map(|p| p.to_string()).collect();
        admin.assign_policies(username, &policies).unwrap();
    }

    pub fn user_session<'p>(&self, username: &str, prompter: &'p dyn Prompter) -> Session<'p> {
        Session::new(Box::new(self.store.clone()), prompter).with_credentials(Some(
            OperatorCredentials {
                username: username.to_string(),
                password: "pw".to_string(),
            },
        ))
    }

    /// Session on a fresh orphan token holding only `policies`.
    pub fn token_session<'p>(&self, policies: &[&str], prompter: &'p dyn Prompter) -> Session<'p> {
        use crate::core::vault::{TokenRequest, VaultClient};
        let token = self
            .store
            .client_with_token(&self.root)
            .create_token(&TokenRequest {
                policies: policies.iter().map(|p| p.to_string()).collect(),
                ttl: std::time::Duration::ZERO,
                renewable: true,
                no_parent: true,
            })
            .unwrap();
        Session::new(Box::new(self.store.clone()), prompter).with_root_token(Some(token))
    }

    pub fn write_env(&self, env: &str, text: &str) {
        let staging = self.project.staging();
        staging.create().unwrap();
        std::fs::write(staging.env_path(env), text).unwrap();
    }

    pub fn read_env(&self, env: &str) -> String {
        std::fs::read_to_string(self.project.staging().env_path(env)).unwrap()
    }

    /// Read a stored version with the root token.
    pub fn remote(&self, env: &str, id: &str) -> SecretBundle {
        use crate::core::vault::VaultClient;
        self.store
            .client_with_token(&self.root)
            .kv_read("bullpen", &self.project.secret_path(env, &id.to_string()))
            .unwrap()
    }
}
