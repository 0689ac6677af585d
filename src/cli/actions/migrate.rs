//! Migration action.

use crate::cli::{output, Context};
use crate::core::migrate::{LegacyDirectory, MigrationBridge};
use crate::core::prompt::Prompter;
use crate::error::Result;

pub fn execute(ctx: &Context, push: bool) -> Result<()> {
    let provider = LegacyDirectory::from_project(&ctx.project)?;
    let push = push
        || ctx
            .prompter
            .confirm("Push the migrated environments after staging?", false)?;

    let mut session = ctx.session()?;
    let report = MigrationBridge::new(&mut session, &ctx.project).migrate(&provider, push)?;
    output::report(&report);

    let failures = report.failures().count();
    if failures > 0 {
        output::warn(&format!("{} check(s) failed", failures));
    } else {
        output::success("migration consistent");
    }
    Ok(())
}
