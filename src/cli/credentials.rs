//! Credentials commands: pull, push, get, info.

use tracing::debug;

use crate::cli::{output, Context};
use crate::core::driver::{self, DriverContext};
use crate::core::sync::PushOutcome;
use crate::error::Result;

/// Fetch every recorded environment into the staging directory.
pub fn pull(ctx: &Context) -> Result<()> {
    let driver = driver::for_project(&ctx.project)?;
    let mut session = ctx.session()?;
    let report = driver.pull(&mut DriverContext {
        session: &mut session,
        project: &ctx.project,
    })?;

    output::report(&report);
    if !report.has_failures() {
        output::blank();
        output::hint(&format!(
            "edit the files in {}, then run {}",
            output::path(ctx.project.staging().dir().display()),
            output::cmd("bullpen credentials push")
        ));
    }
    Ok(())
}

/// Push staged environments.
pub fn push(ctx: &Context, no_confirm: bool) -> Result<()> {
    let driver = driver::for_project(&ctx.project)?;
    let mut session = ctx.session()?;
    let outcome = driver.push(
        &mut DriverContext {
            session: &mut session,
            project: &ctx.project,
        },
        no_confirm,
    )?;

    match outcome {
        PushOutcome::FirstRun {
            created,
            copied_dotenv,
        } => {
            output::success("created empty environment files");
            for path in &created {
                output::list_item(&output::path(path.display()));
            }
            if copied_dotenv {
                output::success("copied .env into envs/local.env");
            }
            output::blank();
            output::hint("fill them in and push again");
        }
        PushOutcome::Cancelled => output::warn("push cancelled"),
        PushOutcome::Pushed(report) => {
            output::report(&report);
            output::success("pushed");
        }
    }
    Ok(())
}

/// Print the recorded version of one environment.
pub fn get(ctx: &Context, env: &str) -> Result<()> {
    let driver = driver::for_project(&ctx.project)?;
    let mut session = ctx.session()?;
    let text = driver.get_envs(
        &mut DriverContext {
            session: &mut session,
            project: &ctx.project,
        },
        env,
    )?;
    debug!(env, bytes = text.len(), "environment fetched");
    output::data(&text);
    Ok(())
}

/// Show the driver configuration.
pub fn info(ctx: &Context) -> Result<()> {
    let driver = driver::lookup(&ctx.project.config().credentials.driver)?;
    output::section("Credentials");
    for (label, value) in driver.info(ctx.project.config()) {
        output::kv(label, value);
    }
    output::kv("environments", ctx.project.environments().join(", "));
    if let Some(username) = ctx.global.username() {
        output::kv("operator", username);
    }
    Ok(())
}
