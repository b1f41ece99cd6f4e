//! User command handlers (read-only).

use tabled::Tabled;

use folio_core::User;

use crate::cli::{GlobalOpts, UsersArgs, UsersCommand};
use crate::config::Connection;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Email")]
    email: String,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
        }
    }
}

pub async fn handle(conn: &Connection, args: UsersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        UsersCommand::List => {
            let users = conn.api.list_users().await.map_err(folio_core::CoreError::from)?;
            let out = output::render_list(global.output, &users, |u| UserRow::from(u), |u| u.username.clone());
            output::print_output(&out, global.quiet);
        }
        UsersCommand::Get { id } => {
            let user = conn.api.get_user(id).await.map_err(|e| {
                if e.is_not_found() {
                    CliError::NotFound {
                        resource_type: "user".into(),
                        identifier: id.to_string(),
                        list_command: "users list".into(),
                    }
                } else {
                    folio_core::CoreError::from(e).into()
                }
            })?;
            let out = output::render_single(
                global.output,
                &user,
                |u| format!("ID:       {}\nUsername: {}\nEmail:    {}", u.id, u.username, u.email),
                |u| u.username.clone(),
            );
            output::print_output(&out, global.quiet);
        }
    }
    Ok(())
}
