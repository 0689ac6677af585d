//! Command-line interface.

pub mod actions;
pub mod completions;
pub mod credentials;
pub mod dev_store;
pub mod output;
pub mod prompt;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::core::config::GlobalConfig;
use crate::core::project::Project;
use crate::core::session::Session;
use crate::error::Result;

use self::prompt::Terminal;

/// Bullpen - per-environment secrets synced with a policy-scoped store.
#[derive(Parser)]
#[command(
    name = "bullpen",
    about = "Per-environment secrets synced with a policy-scoped secret store",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub globals: Globals,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(clap::Args, Debug, Clone)]
pub struct Globals {
    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Root token for the secret store
    #[arg(long, global = true, env = "BULLPEN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Project directory
    #[arg(short = 'C', long = "root", global = true, default_value = ".")]
    pub root: PathBuf,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Pull, push and inspect project credentials
    Credentials {
        #[command(subcommand)]
        action: CredentialsAction,
    },

    /// Create (or reopen) a local file-backed secret store
    DevStore {
        /// Directory holding the store state
        dir: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Credentials subcommands.
#[derive(Subcommand)]
pub enum CredentialsAction {
    /// Fetch every recorded environment into envs/
    Pull,

    /// Store changed environments from envs/ and record their versions
    Push {
        /// Skip the confirmation prompt
        #[arg(long)]
        no_confirm: bool,
    },

    /// Print the recorded version of one environment
    Get {
        /// Environment name
        env: String,
    },

    /// Run an administrative action
    Run {
        /// Action name (see `bullpen credentials actions`)
        action: String,
        /// Action arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// List the actions of the configured driver
    Actions,

    /// Show the driver configuration
    Info,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Everything a project command needs.
pub struct Context {
    pub project: Project,
    pub global: GlobalConfig,
    pub global_path: PathBuf,
    pub prompter: Terminal,
    token: Option<String>,
}

impl Context {
    /// Load the project under `globals.root` and the operator config.
    pub fn load(globals: &Globals) -> Result<Self> {
        let project = Project::load(&globals.root)?;
        let global_path = GlobalConfig::default_path()?;
        let global = GlobalConfig::load_from(&global_path)?;
        Ok(Self {
            project,
            global,
            global_path,
            prompter: Terminal::new(globals.yes),
            token: globals.token.clone(),
        })
    }

    pub fn session(&self) -> Result<Session<'_>> {
        Session::open(
            &self.project,
            &self.global,
            self.token.clone(),
            &self.prompter,
        )
    }

    pub fn root(&self) -> &Path {
        self.project.root()
    }
}

/// Execute a command.
pub fn execute(command: Command, globals: Globals) -> Result<()> {
    match command {
        Command::Credentials { action } => {
            let ctx = Context::load(&globals)?;
            match action {
                CredentialsAction::Pull => credentials::pull(&ctx),
                CredentialsAction::Push { no_confirm } => credentials::push(&ctx, no_confirm),
                CredentialsAction::Get { env } => credentials::get(&ctx, &env),
                CredentialsAction::Run { action, args } => actions::run(&ctx, &action, &args),
                CredentialsAction::Actions => actions::list(&ctx),
                CredentialsAction::Info => credentials::info(&ctx),
            }
        }
        Command::DevStore { dir } => dev_store::execute(&dir),
        Command::Completions { shell } => completions::execute(shell),
    }
}
