//! Project command handlers.

use tabled::Tabled;

use folio_core::{Project, ProjectDraft, ProjectPatch, ResourceKind, dashboard::format_date};

use crate::cli::{GlobalOpts, ProjectsArgs, ProjectsCommand};
use crate::config::Connection;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Technologies")]
    technologies: String,
    #[tabled(rename = "Live")]
    live: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&Project> for ProjectRow {
    fn from(p: &Project) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            technologies: p.technologies.join(", "),
            live: p.live_url.clone().unwrap_or_default(),
            updated: format_date(p.updated_at),
        }
    }
}

fn detail(p: &Project) -> String {
    let technologies = p.technologies.join(", ");
    [
        format!("ID:           {}", p.id),
        format!("Name:         {}", p.name),
        format!("Description:  {}", folio_core::sanitize::plain_text(&p.description)),
        format!("Technologies: {}", util::or_dash(Some(technologies.as_str()))),
        format!("Live URL:     {}", util::or_dash(p.live_url.as_deref())),
        format!("Repo URL:     {}", util::or_dash(p.repo_url.as_deref())),
        format!("Created:      {}", format_date(p.created_at)),
        format!("Updated:      {}", format_date(p.updated_at)),
    ]
    .join("\n")
}

fn print_project(p: &Project, global: &GlobalOpts) {
    let out = output::render_single(global.output, p, detail, |p| p.id.to_string());
    output::print_output(&out, global.quiet);
}

/// `--x` sets, `--clear-x` removes, neither leaves the field alone.
fn url_change(value: Option<String>, clear: bool) -> Option<Option<String>> {
    if clear { Some(None) } else { value.map(Some) }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(conn: &Connection, args: ProjectsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ProjectsCommand::List => {
            let projects = conn.api.list_projects().await.map_err(folio_core::CoreError::from)?;
            let out = output::render_list(global.output, &projects, |p| ProjectRow::from(p), |p| {
                p.id.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProjectsCommand::Get { id } => {
            let project = conn.api.get_project(id).await.map_err(|e| {
                if e.is_not_found() {
                    folio_core::CoreError::NotFound {
                        kind: ResourceKind::Project,
                        id,
                    }
                } else {
                    e.into()
                }
            })?;
            print_project(&project, global);
            Ok(())
        }

        ProjectsCommand::Add {
            name,
            description,
            technologies,
            live_url,
            repo_url,
        } => {
            let dashboard = util::mount(conn).await?;
            let projects = dashboard.projects();
            projects.set_draft(ProjectDraft {
                name,
                description,
                technologies,
                live_url,
                repo_url,
            });
            let pending = projects.submit_draft()?;
            let saved = util::settle(pending, dashboard.banner(), "Saving project…", global.quiet).await?;
            if let Some(project) = saved {
                output::print_success(&format!("Added project {}", project.id), global.quiet);
                print_project(&project, global);
            }
            Ok(())
        }

        ProjectsCommand::Edit {
            id,
            name,
            description,
            technologies,
            live_url,
            clear_live_url,
            repo_url,
            clear_repo_url,
        } => {
            let patch = ProjectPatch {
                name,
                description,
                technologies,
                live_url: url_change(live_url, clear_live_url),
                repo_url: url_change(repo_url, clear_repo_url),
            };
            let dashboard = util::mount(conn).await?;
            let pending = dashboard.projects().update(id, patch)?;
            let saved = util::settle(pending, dashboard.banner(), "Updating project…", global.quiet).await?;
            if let Some(project) = saved {
                output::print_success(&format!("Updated project {id}"), global.quiet);
                print_project(&project, global);
            }
            Ok(())
        }

        ProjectsCommand::Delete { id } => {
            let dashboard = util::mount(conn).await?;
            let projects = dashboard.projects();
            let name = projects
                .snapshot()
                .get(id)
                .map(|entry| entry.record.name.clone())
                .ok_or(folio_core::CoreError::NotFound {
                    kind: ResourceKind::Project,
                    id,
                })?;

            if !util::confirm(&format!("Delete project '{name}' ({id})?"), "projects delete", global.yes)? {
                return Ok(());
            }

            let pending = projects.delete(id)?;
            util::settle(pending, dashboard.banner(), "Deleting project…", global.quiet).await?;
            output::print_success(&format!("Deleted project {id}"), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_flags_map_to_patch_semantics() {
        assert_eq!(url_change(None, false), None);
        assert_eq!(url_change(Some("https://x.dev".into()), false), Some(Some("https://x.dev".into())));
        assert_eq!(url_change(None, true), Some(None));
    }
}
