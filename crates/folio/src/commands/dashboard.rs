//! `folio dashboard`: both collections, the banner, and load notices.

use tabled::Tabled;

use folio_core::{DashboardView, PostCard, ProjectCard};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::config::Connection;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ProjectCardRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Summary")]
    excerpt: String,
    #[tabled(rename = "Updated")]
    updated: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&ProjectCard> for ProjectCardRow {
    fn from(c: &ProjectCard) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            excerpt: c.excerpt.clone(),
            updated: c.updated.clone(),
            status: c.status.to_string(),
        }
    }
}

#[derive(Tabled)]
struct PostCardRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Published")]
    published: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&PostCard> for PostCardRow {
    fn from(c: &PostCard) -> Self {
        Self {
            id: c.id,
            title: c.title.clone(),
            author: c.author.clone(),
            published: c.published.clone(),
            status: c.status.to_string(),
        }
    }
}

fn render_tables(view: &DashboardView) -> String {
    let projects: Vec<ProjectCardRow> = view.projects.iter().map(ProjectCardRow::from).collect();
    let posts: Vec<PostCardRow> = view.posts.iter().map(PostCardRow::from).collect();
    format!(
        "Projects ({})\n{}\n\nBlog posts ({})\n{}",
        projects.len(),
        output::render_table(&projects),
        posts.len(),
        output::render_table(&posts),
    )
}

pub async fn handle(conn: &Connection, global: &GlobalOpts) -> Result<(), CliError> {
    let dashboard = util::mount(conn).await?;
    let view = dashboard.view();

    if let Some(ref banner) = view.banner {
        output::print_banner(banner);
    }

    let out = match global.output {
        OutputFormat::Table => render_tables(&view),
        format => output::render_single(format, &view, render_tables, |v| {
            v.projects
                .iter()
                .map(|c| c.key.clone())
                .chain(v.posts.iter().map(|c| c.key.clone()))
                .collect::<Vec<_>>()
                .join("\n")
        }),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
