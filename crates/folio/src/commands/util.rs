//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use folio_core::{AdminDashboard, ApiClient, ErrorBanner, MutationOutcome, PendingMutation};

use crate::config::Connection;
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Post body from `--content` or `--content-file`.
pub fn read_content(
    content: Option<String>,
    content_file: Option<PathBuf>,
) -> Result<Option<String>, CliError> {
    match (content, content_file) {
        (Some(text), _) => Ok(Some(text)),
        (None, Some(path)) => Ok(Some(std::fs::read_to_string(path)?)),
        (None, None) => Ok(None),
    }
}

/// Mount the dashboard for the connection's session and load both
/// collections. Load notices go to stderr.
pub async fn mount(conn: &Connection) -> Result<AdminDashboard<ApiClient>, CliError> {
    let mut dashboard = AdminDashboard::mount(Arc::clone(&conn.api), conn.session.clone())?;
    dashboard.load().await;
    for notice in dashboard.notices() {
        output::print_notice(&notice);
    }
    Ok(dashboard)
}

fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet || !output::stderr_is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Wait for an optimistic mutation to settle, with a spinner while it is
/// in flight. A rollback surfaces the banner text as the error.
pub async fn settle<R>(
    pending: PendingMutation<R>,
    banner: &ErrorBanner,
    label: &str,
    quiet: bool,
) -> Result<Option<R>, CliError>
where
    R: Send + 'static,
{
    let pb = spinner(label, quiet);
    let outcome = pending.outcome().await;
    pb.finish_and_clear();

    match outcome {
        MutationOutcome::Confirmed(record) => Ok(Some(record)),
        MutationOutcome::Discarded => Ok(None),
        MutationOutcome::RolledBack(err) if err.is_unauthorized() => Err(err.into()),
        MutationOutcome::RolledBack(err) => Err(CliError::RolledBack {
            banner: banner.current().unwrap_or_else(|| err.to_string()),
            cause: err.to_string(),
        }),
    }
}

/// `-` for absent optional values in detail views.
pub fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}
