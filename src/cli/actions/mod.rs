//! Administrative actions run through `bullpen credentials run <action>`.
//!
//! Arguments are positional and optional; anything missing is asked for.

mod init;
mod migrate;
mod token;
mod users;

use tracing::debug;

use crate::cli::{output, Context};
use crate::core::driver::{self, Action};
use crate::error::{DriverError, Result};

/// List the actions of the configured driver.
pub fn list(ctx: &Context) -> Result<()> {
    let driver = driver::lookup(&ctx.project.config().credentials.driver)?;
    let actions = driver.actions();
    if actions.is_empty() {
        output::dimmed(&format!("the {} driver has no actions", driver.name()));
        return Ok(());
    }

    output::section(&format!("{} actions", driver.name()));
    let width = actions.iter().map(|a| a.as_str().len()).max().unwrap_or(0);
    for action in actions {
        output::row(&[action.as_str(), action.description()], &[width, 0]);
    }
    Ok(())
}

/// Run one action by name.
pub fn run(ctx: &Context, name: &str, args: &[String]) -> Result<()> {
    let action = Action::parse(name)?;
    let driver = driver::lookup(&ctx.project.config().credentials.driver)?;
    if !driver.actions().contains(&action) {
        return Err(DriverError::Unsupported {
            driver: driver.name(),
            operation: action.as_str(),
        }
        .into());
    }
    debug!(%action, ?args, "running action");

    let arg = |i: usize| args.get(i).map(String::as_str);
    match action {
        Action::Init => init::execute(ctx),
        Action::CreateUser => users::create(ctx, arg(0)),
        Action::EditUser => users::edit(ctx, arg(0)),
        Action::DeleteUser => users::delete(ctx, arg(0)),
        Action::ChangeUserPassword => users::change_password(ctx, arg(0)),
        Action::SaveUserToGlobalConfig => users::save_to_global(ctx, arg(0)),
        Action::AssignPolicies => users::assign_policies(ctx, arg(0), args.get(1..).unwrap_or(&[])),
        Action::CreateDeploymentToken => token::execute(ctx, arg(0)),
        Action::ListUsers => users::list(ctx),
        Action::SearchUsers => users::search(ctx, arg(0)),
        Action::MigrateFromLegacy => migrate::execute(ctx, args.iter().any(|a| a == "--push")),
    }
}
