//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod dashboard;
pub mod posts;
pub mod projects;
pub mod users;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::Connection;
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, conn: &Connection, global: &GlobalOpts) -> Result<(), CliError> {
    let result = match cmd {
        Command::Login(args) => auth::login(conn, args, global).await,
        Command::Logout => auth::logout(conn, global),
        Command::Register(args) => auth::register(conn, args, global).await,
        Command::Status => auth::status(conn, global),
        Command::Projects(args) => projects::handle(conn, args, global).await,
        Command::Posts(args) => posts::handle(conn, args, global).await,
        Command::Users(args) => users::handle(conn, args, global).await,
        Command::Dashboard => dashboard::handle(conn, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    };
    result.map_err(|e| e.for_profile(&conn.profile_name))
}
