//! Authenticated session with the secret store.
//!
//! A [`Session`] lazily builds a client: a root token if one was supplied,
//! otherwise a password login from the operator config, otherwise no token
//! at all. Calls made through [`Session::call`] or [`Session::run`] that come
//! back forbidden drop the client, ask the operator for a root token, and
//! retry, up to a fixed number of escalations.

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::core::config::{GlobalConfig, OperatorCredentials};
use crate::core::constants;
use crate::core::policy::Role;
use crate::core::project::{Project, ProjectPath};
use crate::core::prompt::Prompter;
use crate::core::validation;
use crate::core::vault::{self, Connector, VaultClient, VaultResult};
use crate::error::{Error, Result, SessionError, VaultError};

/// Process-scoped connection state.
pub struct Session<'p> {
    connector: Box<dyn Connector>,
    prompter: &'p dyn Prompter,
    credentials: Option<OperatorCredentials>,
    root_token: Option<Zeroizing<String>>,
    auto_token_renewal: bool,
    max_escalations: u32,
    client: Option<Box<dyn VaultClient>>,
    username: Option<String>,
    role: Option<(ProjectPath, Role)>,
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("url", &self.connector.url())
            .field("username", &self.username)
            .field("connected", &self.client.is_some())
            .field("root_token", &self.root_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl<'p> Session<'p> {
    /// Session without credentials; the first call decides how to authenticate.
    pub fn new(connector: Box<dyn Connector>, prompter: &'p dyn Prompter) -> Self {
        Self {
            connector,
            prompter,
            credentials: None,
            root_token: None,
            auto_token_renewal: false,
            max_escalations: constants::DEFAULT_MAX_ESCALATIONS,
            client: None,
            username: None,
            role: None,
        }
    }

    /// Session for a project, connecting to its configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Connection` if the endpoint cannot be reached.
    pub fn open(
        project: &Project,
        global: &GlobalConfig,
        root_token: Option<String>,
        prompter: &'p dyn Prompter,
    ) -> Result<Self> {
        let settings = &project.config().vault;
        let connector = vault::connect(&settings.url)?;
        Ok(Self::new(connector, prompter)
            .with_credentials(global.vault.clone())
            .with_root_token(root_token)
            .with_auto_renewal(settings.auto_token_renewal)
            .with_max_escalations(settings.max_escalations))
    }

    pub fn with_credentials(mut self, credentials: Option<OperatorCredentials>) -> Self {
        self.credentials = credentials.filter(|c| !c.username.is_empty());
        self
    }

    pub fn with_root_token(mut self, token: Option<String>) -> Self {
        self.root_token = token.filter(|t| !t.is_empty()).map(Zeroizing::new);
        self
    }

    pub fn with_auto_renewal(mut self, enabled: bool) -> Self {
        self.auto_token_renewal = enabled;
        self
    }

    pub fn with_max_escalations(mut self, max: u32) -> Self {
        self.max_escalations = max;
        self
    }

    pub fn prompter(&self) -> &'p dyn Prompter {
        self.prompter
    }

    pub fn url(&self) -> &str {
        self.connector.url()
    }

    /// Username from the operator config, whether or not it is in use.
    pub fn operator_username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    /// Username the current client logged in as, if it used a password login.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Drop the cached client and everything derived from it.
    pub fn invalidate(&mut self) {
        debug!("session invalidated");
        self.client = None;
        self.username = None;
        self.role = None;
    }

    /// The authenticated client, creating it on first use.
    ///
    /// Renews the token first when auto renewal is enabled.
    pub fn client(&mut self) -> Result<&dyn VaultClient> {
        let client = match self.client.take() {
            Some(client) => client,
            None => self.establish()?,
        };
        if self.auto_token_renewal {
            renew(client.as_ref())?;
        }
        Ok(&**self.client.insert(client))
    }

    fn establish(&mut self) -> Result<Box<dyn VaultClient>> {
        let mut client = self.connector.connect()?;

        if let Some(token) = &self.root_token {
            debug!(url = self.connector.url(), "using root token");
            client.set_token(token);
            self.username = None;
        } else if let Some(creds) = &self.credentials {
            debug!(url = self.connector.url(), username = %creds.username, "logging in");
            client
                .login_userpass(&creds.username, &creds.password)
                .map_err(|e| match e {
                    VaultError::InvalidRequest(_) | VaultError::Forbidden(_) => {
                        Error::from(SessionError::LoginFailed(creds.username.clone()))
                    }
                    other => other.into(),
                })?;
            self.username = Some(creds.username.clone());
        } else {
            debug!(url = self.connector.url(), "no credentials configured");
        }

        Ok(client)
    }

    /// Run `op`, escalating to a root token when it is forbidden.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EscalationExhausted` once the configured number
    /// of escalations has been spent, or `SessionError::RootTokenAttempts` if
    /// the operator never enters a well-formed root token.
    pub fn run<T>(&mut self, mut op: impl FnMut(&mut Self) -> Result<T>) -> Result<T> {
        let mut escalations = 0;
        loop {
            match op(self) {
                Err(e) if needs_escalation(&e) => {
                    if escalations >= self.max_escalations {
                        debug!(error = %e, escalations, "giving up");
                        return Err(SessionError::EscalationExhausted {
                            attempts: escalations,
                        }
                        .into());
                    }
                    warn!("{}", e);
                    self.escalate()?;
                    escalations += 1;
                }
                other => return other,
            }
        }
    }

    /// Run one client call under [`Session::run`].
    pub fn call<T>(&mut self, mut f: impl FnMut(&dyn VaultClient) -> VaultResult<T>) -> Result<T> {
        self.run(|session| Ok(f(session.client()?)?))
    }

    fn escalate(&mut self) -> Result<()> {
        self.invalidate();
        let token = self.prompt_root_token()?;
        self.root_token = Some(token);
        Ok(())
    }

    fn prompt_root_token(&self) -> Result<Zeroizing<String>> {
        let question = format!(
            "Current user lacks the necessary privileges. Root token for {}",
            self.connector.url()
        );
        for attempt in 1..=constants::MAX_ROOT_TOKEN_ATTEMPTS {
            let token = Zeroizing::new(self.prompter.secret(&question)?.trim().to_string());
            match validation::validate_root_token(&token) {
                Ok(()) => return Ok(token),
                Err(e) => warn!(attempt, "{}", e),
            }
        }
        Err(SessionError::RootTokenAttempts(constants::MAX_ROOT_TOKEN_ATTEMPTS).into())
    }

    /// Role of this session within `project`, resolved once.
    pub fn role(&mut self, project: &ProjectPath) -> Result<Role> {
        if let Some((cached_for, role)) = &self.role {
            if cached_for == project {
                return Ok(*role);
            }
        }

        let info = self.call(|c| c.lookup_self())?;
        let role = Role::resolve(&info.all_policies(), project);
        debug!(%project, %role, username = ?info.username, "role resolved");

        self.role = Some((project.clone(), role));
        Ok(role)
    }
}

fn needs_escalation(err: &Error) -> bool {
    match err {
        Error::Vault(e @ VaultError::Forbidden(_)) => !e.is_benign_lease(),
        Error::Session(SessionError::LoginFailed(_)) => true,
        _ => false,
    }
}

fn renew(client: &dyn VaultClient) -> Result<()> {
    match client.renew_self() {
        Ok(()) => {
            debug!("token renewed");
            Ok(())
        }
        Err(e) if e.is_benign_lease() => {
            debug!("{}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
