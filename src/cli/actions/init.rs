//! Init action: provision the store and offer a first user and token.

use crate::cli::{output, Context};
use crate::core::migrate::LegacyDirectory;
use crate::core::provision::Provisioner;
use crate::core::users::{CiVariableStore, TokenDelivery};
use crate::error::Result;

pub fn execute(ctx: &Context) -> Result<()> {
    let mut session = ctx.session()?;
    let store = LegacyDirectory::from_project(&ctx.project).ok();
    let summary = Provisioner::new(&mut session, &ctx.project).init(
        &ctx.global_path,
        store.as_ref().map(|s| s as &dyn CiVariableStore),
    )?;

    output::report(&summary.report);

    if let Some(creds) = &summary.created_user {
        output::blank();
        output::kv("username", &creds.username);
        output::kv("password", creds.password.as_str());
    }
    match &summary.deployment_token {
        Some(TokenDelivery::Shown(token)) => {
            output::blank();
            output::kv("deployment token", token.as_str());
            output::hint("store it as a masked CI variable; it is not shown again");
        }
        Some(TokenDelivery::Stored { store, variable }) => {
            output::success(&format!("deployment token stored in {} as {}", store, variable));
        }
        None => {}
    }

    output::blank();
    output::success(&format!("{} is ready", ctx.project.path()));
    output::hint(&format!("next: {}", output::cmd("bullpen credentials push")));
    Ok(())
}
