//! Blog post command handlers.

use tabled::Tabled;

use folio_core::{BlogPost, BlogPostDraft, ResourceKind, dashboard::format_date, sanitize};

use crate::cli::{GlobalOpts, PostsArgs, PostsCommand};
use crate::config::Connection;
use crate::error::CliError;
use crate::output;

use super::util;

const LIST_EXCERPT_CHARS: usize = 60;

#[derive(Tabled)]
struct PostRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Published")]
    published: String,
    #[tabled(rename = "Excerpt")]
    excerpt: String,
}

impl From<&BlogPost> for PostRow {
    fn from(p: &BlogPost) -> Self {
        Self {
            id: p.id,
            title: p.title.clone(),
            author: p.author_id.clone(),
            published: format_date(p.created_at),
            excerpt: sanitize::excerpt(&p.content, LIST_EXCERPT_CHARS),
        }
    }
}

fn detail(p: &BlogPost) -> String {
    [
        format!("ID:        {}", p.id),
        format!("Title:     {}", p.title),
        format!("Author:    {}", p.author_id),
        format!("Published: {}", format_date(p.created_at)),
        format!("Updated:   {}", format_date(p.updated_at)),
        String::new(),
        sanitize::plain_text(&p.content),
    ]
    .join("\n")
}

fn print_post(p: &BlogPost, global: &GlobalOpts) {
    let out = output::render_single(global.output, p, detail, |p| p.id.to_string());
    output::print_output(&out, global.quiet);
}

pub async fn handle(conn: &Connection, args: PostsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        PostsCommand::List => {
            let posts = conn
                .api
                .list_blog_posts()
                .await
                .map_err(folio_core::CoreError::from)?;
            let out = output::render_list(global.output, &posts, |p| PostRow::from(p), |p| p.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PostsCommand::Get { id } => {
            let post = conn.api.get_blog_post(id).await.map_err(|e| {
                if e.is_not_found() {
                    folio_core::CoreError::NotFound {
                        kind: ResourceKind::BlogPost,
                        id,
                    }
                } else {
                    e.into()
                }
            })?;
            print_post(&post, global);
            Ok(())
        }

        PostsCommand::Add {
            title,
            content,
            content_file,
            author,
        } => {
            let content = util::read_content(content, content_file)?.unwrap_or_default();
            let mut draft = BlogPostDraft {
                title,
                content,
                ..BlogPostDraft::default()
            };
            if let Some(author) = author {
                draft.author_id = author;
            }

            let dashboard = util::mount(conn).await?;
            let pending = dashboard.posts().create(draft)?;
            let saved = util::settle(pending, dashboard.banner(), "Publishing post…", global.quiet).await?;
            if let Some(post) = saved {
                output::print_success(&format!("Published post {}", post.id), global.quiet);
                print_post(&post, global);
            }
            Ok(())
        }

        PostsCommand::Edit {
            id,
            title,
            content,
            content_file,
            author,
        } => {
            let content = util::read_content(content, content_file)?;
            let dashboard = util::mount(conn).await?;
            let posts = dashboard.posts();

            let mut edited = posts.begin_edit(id)?;
            if let Some(title) = title {
                edited.title = title;
            }
            if let Some(content) = content {
                edited.content = content;
            }
            if let Some(author) = author {
                edited.author_id = author;
            }
            posts.set_editing(edited)?;

            let pending = posts.submit_edit()?;
            let saved = util::settle(pending, dashboard.banner(), "Updating post…", global.quiet).await?;
            if let Some(post) = saved {
                output::print_success(&format!("Updated post {id}"), global.quiet);
                print_post(&post, global);
            }
            Ok(())
        }

        PostsCommand::Delete { id } => {
            let dashboard = util::mount(conn).await?;
            let posts = dashboard.posts();
            let title = posts
                .snapshot()
                .get(id)
                .map(|entry| entry.record.title.clone())
                .ok_or(folio_core::CoreError::NotFound {
                    kind: ResourceKind::BlogPost,
                    id,
                })?;

            if !util::confirm(&format!("Delete post '{title}' ({id})?"), "posts delete", global.yes)? {
                return Ok(());
            }

            let pending = posts.delete(id)?;
            util::settle(pending, dashboard.banner(), "Deleting post…", global.quiet).await?;
            output::print_success(&format!("Deleted post {id}"), global.quiet);
            Ok(())
        }
    }
}
