//! Deployment token action.

use crate::cli::{output, Context};
use crate::core::migrate::LegacyDirectory;
use crate::core::prompt::Prompter;
use crate::core::users::{self, CiVariableStore, TokenDelivery, UserAdmin};
use crate::error::{Result, ValidationError};

pub fn execute(ctx: &Context, given: Option<&str>) -> Result<()> {
    let mut session = ctx.session()?;
    let mut admin = UserAdmin::new(&mut session);
    let max = admin.max_token_ttl_days()?;

    let answer = match given {
        Some(days) => days.to_string(),
        None => ctx
            .prompter
            .input("Token lifetime in days", Some(&max.to_string()))?,
    };
    let days: u64 = answer
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidField {
            field: "ttl",
            reason: format!("'{}' is not a number of days", answer.trim()),
        })?;

    let token = admin.create_deployment_token(&ctx.project.path(), days)?;
    let store = LegacyDirectory::from_project(&ctx.project).ok();
    let delivery = users::deliver_deployment_token(
        &ctx.prompter,
        token,
        store.as_ref().map(|s| s as &dyn CiVariableStore),
    )?;
    print_delivery(&delivery, days);
    Ok(())
}

fn print_delivery(delivery: &TokenDelivery, days: u64) {
    match delivery {
        TokenDelivery::Stored { store, variable } => {
            output::success(&format!("deployment token stored in {} as {}", store, variable));
        }
        TokenDelivery::Shown(token) => {
            output::success(&format!("deployment token valid for {} days", days));
            output::kv("token", token.as_str());
            output::hint("store it as a masked CI variable; it is not shown again");
        }
    }
}
