//! Session commands: login, logout, register, status.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::cli::{GlobalOpts, LoginArgs, RegisterArgs};
use crate::config::{Connection, TokenStoreKind};
use crate::error::CliError;
use crate::output;

use super::util;

fn prompt_username() -> Result<String, CliError> {
    dialoguer::Input::<String>::new()
        .with_prompt("Username")
        .interact_text()
        .map_err(util::prompt_err)
}

fn prompt_password(label: &str) -> Result<SecretString, CliError> {
    rpassword::prompt_password(label)
        .map(SecretString::from)
        .map_err(util::prompt_err)
}

pub async fn login(conn: &Connection, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let username = match args.username {
        Some(name) => name,
        None => match folio_config::resolve_username(&conn.profile, &conn.profile_name) {
            Ok(name) => name,
            Err(_) => prompt_username()?,
        },
    };

    let password = match folio_config::resolve_password(&conn.profile, &conn.profile_name) {
        Ok(pw) => pw,
        Err(_) => prompt_password("Password: ")?,
    };

    conn.session.login(&conn.api, &username, &password).await?;

    output::print_success(
        &format!("Logged in as {username} (profile '{}')", conn.profile_name),
        global.quiet,
    );
    Ok(())
}

pub fn logout(conn: &Connection, global: &GlobalOpts) -> Result<(), CliError> {
    conn.session.logout()?;
    output::print_success(
        &format!("Logged out of profile '{}'", conn.profile_name),
        global.quiet,
    );
    Ok(())
}

pub async fn register(
    conn: &Connection,
    args: RegisterArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let password = prompt_password("Password: ")?;
    let again = prompt_password("Confirm password: ")?;
    if password.expose_secret() != again.expose_secret() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "passwords do not match".into(),
        });
    }

    conn.session.register(&conn.api, &args.username, &password).await?;
    output::print_success(
        &format!("Registered {}. Log in with: folio login --username {}", args.username, args.username),
        global.quiet,
    );
    Ok(())
}

#[derive(Serialize)]
struct Status {
    profile: String,
    api_url: String,
    token_store: &'static str,
    authenticated: bool,
}

pub fn status(conn: &Connection, global: &GlobalOpts) -> Result<(), CliError> {
    let status = Status {
        profile: conn.profile_name.clone(),
        api_url: conn.api.base_url().to_string(),
        token_store: match conn.profile.token_store {
            TokenStoreKind::File => "file",
            TokenStoreKind::Keyring => "keyring",
        },
        authenticated: conn.session.is_authenticated(),
    };

    let out = output::render_single(
        global.output,
        &status,
        |s| {
            [
                format!("Profile:       {}", s.profile),
                format!("API URL:       {}", s.api_url),
                format!("Token store:   {}", s.token_store),
                format!(
                    "Logged in:     {}",
                    if s.authenticated { "yes" } else { "no" }
                ),
            ]
            .join("\n")
        },
        |s| s.authenticated.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
