//! User actions.

use crate::cli::{output, Context};
use crate::core::config::GlobalConfig;
use crate::core::outcome::Outcome;
use crate::core::prompt::Prompter;
use crate::core::users::{self, UserAdmin, UserMetadata, UserRecord};
use crate::core::vault;
use crate::error::{Result, SessionError, VaultError};

fn username(ctx: &Context, given: Option<&str>) -> Result<String> {
    match given {
        Some(u) => Ok(u.to_string()),
        None => Ok(ctx.prompter.input("Username", None)?.trim().to_string()),
    }
}

pub fn create(ctx: &Context, given: Option<&str>) -> Result<()> {
    let (username, metadata) =
        users::prompt_user(&ctx.prompter, given, &UserMetadata::default())?;
    let mut session = ctx.session()?;
    match UserAdmin::new(&mut session).create_user(&username, &metadata, None)? {
        Outcome::Ok(creds) => {
            output::success(&format!("created {}", creds.username));
            output::blank();
            output::kv("username", &creds.username);
            output::kv("password", creds.password.as_str());
            output::blank();
            output::hint("hand the password over securely, it is not shown again");
        }
        other => output::warn(other.message().unwrap_or_default()),
    }
    Ok(())
}

pub fn edit(ctx: &Context, given: Option<&str>) -> Result<()> {
    let username = username(ctx, given)?;
    let mut session = ctx.session()?;
    let mut admin = UserAdmin::new(&mut session);
    let current = admin.user(&username)?;
    let (_, metadata) = users::prompt_user(&ctx.prompter, Some(&username), &current.metadata)?;
    admin.edit_user(&username, &metadata)?;
    output::success(&format!("updated {}", username));
    Ok(())
}

pub fn delete(ctx: &Context, given: Option<&str>) -> Result<()> {
    let username = username(ctx, given)?;
    if !ctx
        .prompter
        .confirm(&format!("Delete user {}?", username), false)?
    {
        output::warn("nothing deleted");
        return Ok(());
    }
    let mut session = ctx.session()?;
    UserAdmin::new(&mut session).delete_user(&username)?;
    output::success(&format!("deleted {}", username));
    Ok(())
}

pub fn change_password(ctx: &Context, given: Option<&str>) -> Result<()> {
    let username = username(ctx, given)?;
    let mut session = ctx.session()?;
    let password = UserAdmin::new(&mut session).change_user_password(&username)?;
    output::success(&format!("new password for {}", username));
    output::kv("password", password.as_str());

    if ctx.global.username() == Some(username.as_str()) {
        let mut global = ctx.global.clone();
        global.set_credentials(&username, &password);
        global.save_to(&ctx.global_path)?;
        output::success(&format!(
            "saved to {}",
            output::path(ctx.global_path.display())
        ));
    }
    Ok(())
}

/// Check a login against the store, then save it as the operator.
pub fn save_to_global(ctx: &Context, given: Option<&str>) -> Result<()> {
    let username = username(ctx, given)?;
    let password = ctx.prompter.secret(&format!("Password for {}", username))?;

    let url = &ctx.project.config().vault.url;
    let mut client = vault::connect(url)?.connect()?;
    client
        .login_userpass(&username, &password)
        .map_err(|e| match e {
            VaultError::InvalidRequest(_) | VaultError::Forbidden(_) => {
                SessionError::LoginFailed(username.clone()).into()
            }
            other => crate::error::Error::from(other),
        })?;

    let mut global: GlobalConfig = ctx.global.clone();
    global.set_credentials(&username, &password);
    global.save_to(&ctx.global_path)?;
    output::success(&format!(
        "{} saved to {}",
        username,
        output::path(ctx.global_path.display())
    ));
    Ok(())
}

pub fn assign_policies(ctx: &Context, given: Option<&str>, policies: &[String]) -> Result<()> {
    let username = username(ctx, given)?;
    let mut session = ctx.session()?;
    let mut admin = UserAdmin::new(&mut session);

    let policies: Vec<String> = if policies.is_empty() {
        let assignable = admin.assignable_policies()?;
        let current = admin.user_policies(&username)?;
        output::section("Assignable policies");
        for p in &assignable {
            output::list_item(p);
        }
        output::blank();
        let answer = ctx.prompter.input(
            "Policies (comma separated)",
            Some(&current.join(",")),
        )?;
        answer
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        policies.to_vec()
    };

    admin.assign_policies(&username, &policies)?;
    output::success(&format!("{}: {}", username, policies.join(", ")));
    Ok(())
}

fn print_users(users: &[UserRecord]) {
    const HEADERS: [&str; 6] = ["USERNAME", "NAME", "EMAIL", "COMPANY", "PROJECT", "ROLE"];
    let rows: Vec<[String; 6]> = users
        .iter()
        .flat_map(|u| {
            let name = format!("{} {}", u.metadata.firstname, u.metadata.lastname);
            let base = [
                u.username.clone(),
                name,
                u.metadata.email.clone(),
                u.metadata.companyname.clone(),
            ];
            let grants = u.grants();
            if grants.is_empty() {
                return vec![[
                    base[0].clone(),
                    base[1].clone(),
                    base[2].clone(),
                    base[3].clone(),
                    "-".to_string(),
                    "-".to_string(),
                ]];
            }
            grants
                .into_iter()
                .map(|g| {
                    [
                        base[0].clone(),
                        base[1].clone(),
                        base[2].clone(),
                        base[3].clone(),
                        format!("{}/{}", g.group, g.project),
                        g.role,
                    ]
                })
                .collect()
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    output::row(&HEADERS, &widths);
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        output::row(&cells, &widths);
    }
}

pub fn list(ctx: &Context) -> Result<()> {
    let mut session = ctx.session()?;
    let users = UserAdmin::new(&mut session).list_users()?;
    if users.is_empty() {
        output::dimmed("no users");
        return Ok(());
    }
    print_users(&users);
    Ok(())
}

pub fn search(ctx: &Context, given: Option<&str>) -> Result<()> {
    let query = match given {
        Some(q) => q.to_string(),
        None => ctx.prompter.input("Search", None)?,
    };
    let mut session = ctx.session()?;
    let users = UserAdmin::new(&mut session).search_users(&query)?;
    if users.is_empty() {
        output::dimmed(&format!("no users match '{}'", query.trim()));
        return Ok(());
    }
    print_users(&users);
    Ok(())
}
