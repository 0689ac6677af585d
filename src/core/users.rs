//! User administration.
//!
//! Users are password logins linked to identity entities. Entities carry the
//! user's metadata and the policies granting project access.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::core::constants;
use crate::core::outcome::Outcome;
use crate::core::policy::{self, ProjectPolicy, Tier};
use crate::core::project::ProjectPath;
use crate::core::prompt::Prompter;
use crate::core::session::Session;
use crate::core::types::{PolicyName, Username};
use crate::core::validation;
use crate::core::vault::{Entity, TokenRequest, VaultClient, VaultResult};
use crate::core::words;
use crate::error::{Result, UserError, ValidationError, VaultError};

const SECONDS_PER_DAY: u64 = 24 * 3600;

/// Descriptive fields stored on a user's entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserMetadata {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub companyname: String,
}

impl UserMetadata {
    /// Check every field is present and the e-mail is well formed.
    pub fn validate(&self) -> Result<()> {
        validation::validate_not_empty("firstname", &self.firstname)?;
        validation::validate_not_empty("lastname", &self.lastname)?;
        validation::validate_not_empty("companyname", &self.companyname)?;
        validation::validate_email(&self.email)
    }

    /// Read from entity metadata; absent fields are empty.
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let field = |key: &str| map.get(key).cloned().unwrap_or_default();
        Self {
            firstname: field("firstname"),
            lastname: field("lastname"),
            email: field("email"),
            companyname: field("companyname"),
        }
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("firstname".to_string(), self.firstname.trim().to_string()),
            ("lastname".to_string(), self.lastname.trim().to_string()),
            ("email".to_string(), self.email.trim().to_string()),
            ("companyname".to_string(), self.companyname.trim().to_string()),
        ])
    }

    /// Text searched by [`UserAdmin::search_users`].
    fn search_text(&self, username: &str) -> String {
        format!(
            "{} {} {} {} {}",
            username, self.firstname, self.lastname, self.email, self.companyname
        )
    }
}

/// A user as listed by [`UserAdmin::list_users`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: Username,
    pub metadata: UserMetadata,
    pub policies: Vec<PolicyName>,
}

/// One access grant, split for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub group: String,
    pub project: String,
    pub role: String,
}

impl UserRecord {
    fn from_entity(entity: Entity) -> Self {
        Self {
            metadata: UserMetadata::from_map(&entity.metadata),
            username: entity.name,
            policies: entity.policies,
        }
    }

    /// Grants derived from the user's policies.
    pub fn grants(&self) -> Vec<Grant> {
        self.policies
            .iter()
            .filter_map(|p| {
                if p == constants::ADMIN_POLICY {
                    return Some(Grant {
                        group: "-".to_string(),
                        project: "-".to_string(),
                        role: constants::ADMIN_POLICY.to_string(),
                    });
                }
                ProjectPolicy::parse(p).map(|pp| Grant {
                    group: pp.project.group,
                    project: pp.project.name,
                    role: pp.tier.as_str().to_string(),
                })
            })
            .collect()
    }
}

/// Username and initial password of a created user.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub username: Username,
    pub password: Zeroizing<String>,
}

/// External store for CI variables, such as a hosting provider's project
/// settings.
pub trait CiVariableStore {
    /// Human-readable name of the store.
    fn name(&self) -> &str;

    /// Create or replace a masked variable.
    fn set_masked_variable(&self, key: &str, value: &str) -> Result<()>;
}

/// Where a deployment token ended up.
#[derive(Debug)]
pub enum TokenDelivery {
    Stored { store: String, variable: String },
    Shown(Zeroizing<String>),
}

/// Store a deployment token in a CI variable store if the operator agrees,
/// otherwise hand it back for display.
pub fn deliver_deployment_token(
    prompter: &dyn Prompter,
    token: Zeroizing<String>,
    store: Option<&dyn CiVariableStore>,
) -> Result<TokenDelivery> {
    if let Some(store) = store {
        let question = format!(
            "Store the deployment token in {} under {}?",
            store.name(),
            constants::CI_TOKEN_VARIABLE
        );
        if prompter.confirm(&question, false)? {
            store.set_masked_variable(constants::CI_TOKEN_VARIABLE, &token)?;
            info!(store = store.name(), "deployment token stored");
            return Ok(TokenDelivery::Stored {
                store: store.name().to_string(),
                variable: constants::CI_TOKEN_VARIABLE.to_string(),
            });
        }
    }
    Ok(TokenDelivery::Shown(token))
}

const FIELD_ATTEMPTS: usize = 3;

fn ask_field(
    prompter: &dyn Prompter,
    label: &str,
    default: Option<&str>,
    check: impl Fn(&str) -> Result<()>,
) -> Result<String> {
    let default = default.filter(|d| !d.is_empty());
    let mut last = None;
    for _ in 0..FIELD_ATTEMPTS {
        let value = prompter.input(label, default)?.trim().to_string();
        match check(&value) {
            Ok(()) => return Ok(value),
            Err(e) => {
                warn!("{}", e);
                last = Some(e);
            }
        }
    }
    match last {
        Some(e) => Err(e),
        None => Err(ValidationError::NonInteractive(label.to_string()).into()),
    }
}

/// Ask the operator for a username (unless given) and user metadata,
/// offering `current` values as defaults.
pub fn prompt_user(
    prompter: &dyn Prompter,
    username: Option<&str>,
    current: &UserMetadata,
) -> Result<(Username, UserMetadata)> {
    let username = match username {
        Some(u) => u.to_string(),
        None => ask_field(prompter, "Username", None, |v| {
            validation::validate_not_empty("username", v)
        })?,
    };
    let metadata = UserMetadata {
        firstname: ask_field(prompter, "First name", Some(&current.firstname), |v| {
            validation::validate_not_empty("firstname", v)
        })?,
        lastname: ask_field(prompter, "Last name", Some(&current.lastname), |v| {
            validation::validate_not_empty("lastname", v)
        })?,
        companyname: ask_field(prompter, "Company name", Some(&current.companyname), |v| {
            validation::validate_not_empty("companyname", v)
        })?,
        email: ask_field(
            prompter,
            "E-mail",
            Some(&current.email),
            validation::validate_email,
        )?,
    };
    Ok((username, metadata))
}

fn exists(client: &dyn VaultClient, username: &str) -> VaultResult<bool> {
    match client.read_entity_by_name(username) {
        Ok(_) => Ok(true),
        Err(VaultError::InvalidPath(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

fn userpass_accessor(client: &dyn VaultClient) -> VaultResult<String> {
    client
        .list_auth_methods()?
        .into_iter()
        .find(|m| m.kind == constants::USERPASS)
        .map(|m| m.accessor)
        .ok_or_else(|| VaultError::InvalidPath(format!("auth/{}", constants::USERPASS)))
}

/// User management operations over a session.
pub struct UserAdmin<'s, 'p> {
    session: &'s mut Session<'p>,
}

impl<'s, 'p> UserAdmin<'s, 'p> {
    pub fn new(session: &'s mut Session<'p>) -> Self {
        Self { session }
    }

    fn require_user(&mut self, username: &str) -> Result<()> {
        if !self.session.call(|c| exists(c, username))? {
            return Err(UserError::NotFound(username.to_string()).into());
        }
        Ok(())
    }

    /// Create a user with a password login, an entity, and the alias joining
    /// them. Generates a word password when none is given.
    ///
    /// An existing user is left untouched and reported as a warning.
    pub fn create_user(
        &mut self,
        username: &str,
        metadata: &UserMetadata,
        password: Option<&str>,
    ) -> Result<Outcome<UserCredentials>> {
        validation::validate_not_empty("username", username)?;
        metadata.validate()?;

        if self.session.call(|c| exists(c, username))? {
            return Ok(Outcome::Warn(format!("user {} already exists", username)));
        }

        let password = Zeroizing::new(match password {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => words::word_password(),
        });
        let defaults = vec![constants::DEFAULT_POLICY.to_string()];
        let meta = metadata.to_map();

        self.session.call(|c| {
            c.upsert_userpass_user(username, &password, &defaults)?;
            let entity = c.upsert_entity(username, Some(&meta), None)?;
            c.create_entity_alias(username, &entity.id, &userpass_accessor(c)?)
        })?;
        info!(username, "user created");

        Ok(Outcome::Ok(UserCredentials {
            username: username.to_string(),
            password,
        }))
    }

    /// One user by name.
    pub fn user(&mut self, username: &str) -> Result<UserRecord> {
        match self.session.call(|c| c.read_entity_by_name(username)) {
            Ok(entity) => Ok(UserRecord::from_entity(entity)),
            Err(crate::error::Error::Vault(VaultError::InvalidPath(_))) => {
                Err(UserError::NotFound(username.to_string()).into())
            }
            Err(e) => Err(e),
        }
    }

    /// Replace a user's metadata.
    pub fn edit_user(&mut self, username: &str, metadata: &UserMetadata) -> Result<()> {
        metadata.validate()?;
        self.require_user(username)?;
        let meta = metadata.to_map();
        self.session
            .call(|c| c.upsert_entity(username, Some(&meta), None))?;
        info!(username, "user updated");
        Ok(())
    }

    /// Delete a user's entity and password login.
    ///
    /// # Errors
    ///
    /// Returns `UserError::SelfDeletion` for the user this session is
    /// configured or logged in as.
    pub fn delete_user(&mut self, username: &str) -> Result<()> {
        let current = [self.session.operator_username(), self.session.username()];
        if current.iter().flatten().any(|u| *u == username) {
            return Err(UserError::SelfDeletion(username.to_string()).into());
        }
        self.require_user(username)?;

        self.session.call(|c| {
            c.delete_entity(username)?;
            c.delete_userpass_user(username)
        })?;
        info!(username, "user deleted");
        Ok(())
    }

    /// Set a freshly generated password and return it.
    pub fn change_user_password(&mut self, username: &str) -> Result<Zeroizing<String>> {
        self.require_user(username)?;
        let password = Zeroizing::new(words::word_password());
        let defaults = vec![constants::DEFAULT_POLICY.to_string()];
        self.session
            .call(|c| c.upsert_userpass_user(username, &password, &defaults))?;
        info!(username, "password changed");
        Ok(password)
    }

    /// Policies an administrator may attach to users.
    pub fn assignable_policies(&mut self) -> Result<Vec<PolicyName>> {
        let mut names = self.session.call(|c| c.list_policies())?;
        names.retain(|p| policy::is_assignable(p));
        names.sort();
        Ok(names)
    }

    pub fn user_policies(&mut self, username: &str) -> Result<Vec<PolicyName>> {
        self.require_user(username)?;
        Ok(self
            .session
            .call(|c| c.read_entity_by_name(username))?
            .policies)
    }

    /// Replace the policy set of a user.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotAssignable` for `default`, `root` or deployment
    /// policies and `UserError::UnknownPolicy` for policies the store lacks.
    pub fn assign_policies(&mut self, username: &str, policies: &[PolicyName]) -> Result<()> {
        if let Some(p) = policies.iter().find(|p| !policy::is_assignable(p)) {
            return Err(UserError::NotAssignable(p.clone()).into());
        }
        self.require_user(username)?;

        let available = self.assignable_policies()?;
        if let Some(p) = policies.iter().find(|p| !available.contains(p)) {
            return Err(UserError::UnknownPolicy(p.clone()).into());
        }

        let mut set = policies.to_vec();
        set.sort();
        set.dedup();
        self.session
            .call(|c| c.upsert_entity(username, None, Some(&set)))?;
        info!(username, policies = ?set, "policies assigned");
        Ok(())
    }

    /// All users ordered by username.
    pub fn list_users(&mut self) -> Result<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self
            .session
            .call(|c| c.list_entities())?
            .into_iter()
            .map(UserRecord::from_entity)
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    /// Users whose name, e-mail, or company fuzzily matches `query`.
    pub fn search_users(&mut self, query: &str) -> Result<Vec<UserRecord>> {
        let query = query.trim();
        let users = self.list_users()?;
        let matches: Vec<UserRecord> = users
            .into_iter()
            .filter(|u| {
                words::partial_ratio(query, &u.metadata.search_text(&u.username))
                    >= constants::SEARCH_THRESHOLD
            })
            .collect();
        debug!(query, matches = matches.len(), "user search");
        Ok(matches)
    }

    /// Longest deployment token lifetime the store allows, in days.
    pub fn max_token_ttl_days(&mut self) -> Result<u64> {
        let max = self.session.call(|c| c.auth_max_ttl("token"))?;
        Ok(max.as_secs() / SECONDS_PER_DAY)
    }

    /// Mint a renewable, parentless token holding only the project's
    /// deployment policy.
    ///
    /// # Errors
    ///
    /// Returns `UserError::TtlTooLong` if `ttl_days` exceeds the store maximum.
    pub fn create_deployment_token(
        &mut self,
        project: &ProjectPath,
        ttl_days: u64,
    ) -> Result<Zeroizing<String>> {
        if ttl_days == 0 {
            return Err(ValidationError::InvalidField {
                field: "ttl",
                reason: "must be at least one day".to_string(),
            }
            .into());
        }
        let max = self.max_token_ttl_days()?;
        if ttl_days > max {
            return Err(UserError::TtlTooLong {
                requested: ttl_days,
                max,
            }
            .into());
        }

        let request = TokenRequest {
            policies: vec![project.policy_name(Tier::Deployment.as_str())],
            ttl: Duration::from_secs(ttl_days * SECONDS_PER_DAY),
            renewable: true,
            no_parent: true,
        };
        let token = self.session.call(|c| c.create_token(&request))?;
        info!(%project, ttl_days, "deployment token created");
        Ok(Zeroizing::new(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::OperatorCredentials;
    use crate::core::policy::{admin_policy, deployment_policy, project_policy, Role};
    use crate::core::prompt::{Answer, Scripted};
    use crate::core::vault::LocalStore;
    use crate::error::Error;
    use std::cell::RefCell;

    fn metadata(first: &str) -> UserMetadata {
        UserMetadata {
            firstname: first.to_string(),
            lastname: "Doe".to_string(),
            email: format!("{}@example.com", first.to_lowercase()),
            companyname: "Acme".to_string(),
        }
    }

    fn store() -> (LocalStore, String) {
        let (store, root) = LocalStore::in_memory();
        let admin = store.client_with_token(&root);
        admin.enable_auth_method("userpass").unwrap();
        let project = ProjectPath::new("acme", "api");
        let envs = ["local", "production"];
        admin.put_policy(&admin_policy("bullpen")).unwrap();
        admin
            .put_policy(&project_policy("bullpen", &project, Role::Developer, &envs))
            .unwrap();
        admin
            .put_policy(&project_policy("bullpen", &project, Role::Maintainer, &envs))
            .unwrap();
        admin
            .put_policy(&deployment_policy("bullpen", &project))
            .unwrap();
        (store, root)
    }

    fn session<'p>(store: &LocalStore, root: &str, prompter: &'p Scripted) -> Session<'p> {
        Session::new(Box::new(store.clone()), prompter).with_root_token(Some(root.to_string()))
    }

    #[test]
    fn test_create_user_and_login() {
        let (store, root) = store();
        let prompter = Scripted::defaults();
        let mut session = session(&store, &root, &prompter);
        let mut admin = UserAdmin::new(&mut session);

        let created = admin.create_user("jane", &metadata("Jane"), None).unwrap();
        let Outcome::Ok(creds) = created else {
            panic!("expected a new user");
        };
        assert!(creds.password.len() <= constants::MAX_PASSWORD_LEN);

        let mut client = store.client();
        client.login_userpass("jane", &creds.password).unwrap();

        let again = admin.create_user("jane", &metadata("Jane"), None).unwrap();
        assert!(matches!(again, Outcome::Warn(_)));
    }

    #[test]
    fn test_create_user_validates_metadata() {
        let (store, root) = store();
        let prompter = Scripted::defaults();
        let mut session = session(&store, &root, &prompter);
        let mut admin = UserAdmin::new(&mut session);

        let mut bad = metadata("Jane");
        bad.email = "nope".to_string();
        assert!(admin.create_user("jane", &bad, None).is_err());
        assert!(admin.create_user("", &metadata("Jane"), None).is_err());
        assert!(admin.list_users().unwrap().is_empty());
    }

    #[test]
    fn test_assign_policies_replaces_set() {
        let (store, root) = store();
        let prompter = Scripted::defaults();
        let mut session = session(&store, &root, &prompter);
        let mut admin = UserAdmin::new(&mut session);
        admin.create_user("jane", &metadata("Jane"), Some("pw")).unwrap();

        admin
            .assign_policies("jane", &["acme/api:developer".to_string()])
            .unwrap();
        admin
            .assign_policies(
                "jane",
                &["acme/api:maintainer".to_string(), "acme/api:maintainer".to_string()],
            )
            .unwrap();
        assert_eq!(admin.user_policies("jane").unwrap(), vec!["acme/api:maintainer"]);

        assert!(matches!(
            admin.assign_policies("jane", &["acme/api:deployment".to_string()]),
            Err(Error::User(UserError::NotAssignable(_)))
        ));
        assert!(matches!(
            admin.assign_policies("jane", &["acme/web:developer".to_string()]),
            Err(Error::User(UserError::UnknownPolicy(_)))
        ));
        assert!(matches!(
            admin.assign_policies("ghost", &["admin".to_string()]),
            Err(Error::User(UserError::NotFound(_)))
        ));
        assert_eq!(
            admin.assignable_policies().unwrap(),
            vec!["acme/api:developer", "acme/api:maintainer", "admin"]
        );
    }

    #[test]
    fn test_delete_user_refuses_self() {
        let (store, root) = store();
        let prompter = Scripted::defaults();
        let mut session = session(&store, &root, &prompter).with_credentials(Some(
            OperatorCredentials {
                username: "jane".into(),
                password: "pw".into(),
            },
        ));
        let mut admin = UserAdmin::new(&mut session);
        admin.create_user("jane", &metadata("Jane"), Some("pw")).unwrap();
        admin.create_user("john", &metadata("John"), Some("pw")).unwrap();

        assert!(matches!(
            admin.delete_user("jane"),
            Err(Error::User(UserError::SelfDeletion(_)))
        ));
        admin.delete_user("john").unwrap();
        assert!(matches!(
            admin.delete_user("john"),
            Err(Error::User(UserError::NotFound(_)))
        ));
        assert!(store.client().login_userpass("john", "pw").is_err());
    }

    #[test]
    fn test_change_password_and_edit() {
        let (store, root) = store();
        let prompter = Scripted::defaults();
        let mut session = session(&store, &root, &prompter);
        let mut admin = UserAdmin::new(&mut session);
        admin.create_user("jane", &metadata("Jane"), Some("old")).unwrap();

        let password = admin.change_user_password("jane").unwrap();
        assert!(store.client().login_userpass("jane", "old").is_err());
        store.client().login_userpass("jane", &password).unwrap();

        admin.edit_user("jane", &metadata("Janet")).unwrap();
        assert_eq!(admin.user("jane").unwrap().metadata.firstname, "Janet");
        assert!(matches!(
            admin.user("ghost"),
            Err(Error::User(UserError::NotFound(_)))
        ));
    }

    #[test]
    fn test_list_and_search_users() {
        let (store, root) = store();
        let prompter = Scripted::defaults();
        let mut session = session(&store, &root, &prompter);
        let mut admin = UserAdmin::new(&mut session);
        admin.create_user("zoe", &metadata("Zoe"), Some("pw")).unwrap();
        admin.create_user("adam", &metadata("Adam"), Some("pw")).unwrap();
        admin.assign_policies("zoe", &["admin".to_string()]).unwrap();
        admin
            .assign_policies("adam", &["acme/api:developer".to_string()])
            .unwrap();

        let users = admin.list_users().unwrap();
        assert_eq!(users[0].username, "adam");
        assert_eq!(
            users[0].grants(),
            vec![Grant {
                group: "acme".into(),
                project: "api".into(),
                role: "developer".into()
            }]
        );
        assert_eq!(users[1].grants()[0].role, "admin");

        let found = admin.search_users("zoe@example").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "zoe");
        assert!(admin.search_users("qqqqqq").unwrap().is_empty());
    }

    #[test]
    fn test_deployment_token_ttl_and_scope() {
        let (store, root) = store();
        let prompter = Scripted::defaults();
        let mut session = session(&store, &root, &prompter);
        let mut admin = UserAdmin::new(&mut session);
        let project = ProjectPath::new("acme", "api");

        assert_eq!(admin.max_token_ttl_days().unwrap(), 32);
        assert!(matches!(
            admin.create_deployment_token(&project, 33),
            Err(Error::User(UserError::TtlTooLong { requested: 33, max: 32 }))
        ));
        assert!(admin.create_deployment_token(&project, 0).is_err());

        let token = admin.create_deployment_token(&project, 7).unwrap();
        let info = store.client_with_token(&token).lookup_self().unwrap();
        assert_eq!(info.policies, vec!["acme/api:deployment", "default"]);
        assert!(info.renewable);
    }

    #[test]
    fn test_prompt_user_retries_invalid_fields() {
        let prompter = Scripted::new([
            Answer::Text("jane".into()),
            Answer::Text("Jane".into()),
            Answer::Text("Doe".into()),
            Answer::Text("Acme".into()),
            Answer::Text("not-an-email".into()),
            Answer::Text("jane@example.com".into()),
        ]);
        let (username, meta) = prompt_user(&prompter, None, &UserMetadata::default()).unwrap();
        assert_eq!(username, "jane");
        assert_eq!(meta, metadata("Jane"));
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn test_prompt_user_keeps_current_values() {
        let prompter = Scripted::defaults();
        let current = metadata("Jane");
        let (username, meta) = prompt_user(&prompter, Some("jane"), &current).unwrap();
        assert_eq!(username, "jane");
        assert_eq!(meta, current);
    }

    struct Recorder(RefCell<Vec<(String, String)>>);

    impl CiVariableStore for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn set_masked_variable(&self, key: &str, value: &str) -> Result<()> {
            self.0.borrow_mut().push((key.to_string(), value.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_deliver_deployment_token() {
        let recorder = Recorder(RefCell::new(Vec::new()));

        let yes = Scripted::new([Answer::Yes]);
        let delivery =
            deliver_deployment_token(&yes, Zeroizing::new("hvs.t".into()), Some(&recorder))
                .unwrap();
        assert!(matches!(delivery, TokenDelivery::Stored { .. }));
        assert_eq!(
            recorder.0.borrow()[0],
            ("VAULT_TOKEN".to_string(), "hvs.t".to_string())
        );

        let no = Scripted::new([Answer::No]);
        let delivery =
            deliver_deployment_token(&no, Zeroizing::new("hvs.t".into()), Some(&recorder))
                .unwrap();
        assert!(matches!(delivery, TokenDelivery::Shown(_)));

        let delivery =
            deliver_deployment_token(&no, Zeroizing::new("hvs.t".into()), None).unwrap();
        assert!(matches!(delivery, TokenDelivery::Shown(_)));
    }
}
