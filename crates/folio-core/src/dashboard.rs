// ── Admin dashboard ──
//
// Owns both confirmed collections, one controller per kind, and the shared
// error banner. `view()` produces a renderer-ready model with sanitized
// markup; nothing here knows how it is drawn.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use folio_api::{BlogPost, Project, ResourceId};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::controller::{CollectionController, EntryState, MirrorSnapshot};
use crate::error::CoreError;
use crate::model::{Resource, ResourceBackend, ResourceKind};
use crate::notice::ErrorBanner;
use crate::sanitize::{excerpt, sanitize_html};
use crate::session::Session;
use crate::store::ConfirmedCollection;

const EXCERPT_CHARS: usize = 160;

/// Where the front end should send the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Route {
    #[strum(serialize = "/")]
    Home,
    #[strum(serialize = "/admin")]
    Admin,
}

// ── View model ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CardStatus {
    Saved,
    Saving,
    Updating,
}

impl From<EntryState> for CardStatus {
    fn from(state: EntryState) -> Self {
        match state {
            EntryState::Synced => Self::Saved,
            EntryState::Creating => Self::Saving,
            EntryState::Updating => Self::Updating,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectCard {
    pub key: String,
    pub id: ResourceId,
    pub name: String,
    pub description_html: String,
    pub excerpt: String,
    pub technologies: Vec<String>,
    pub live_url: Option<String>,
    pub repo_url: Option<String>,
    pub updated: String,
    pub status: CardStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostCard {
    pub key: String,
    pub id: ResourceId,
    pub title: String,
    pub content_html: String,
    pub excerpt: String,
    pub author: String,
    pub published: String,
    pub updated: String,
    pub status: CardStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub projects: Vec<ProjectCard>,
    pub posts: Vec<PostCard>,
    /// Last mutation failure, if any.
    pub banner: Option<String>,
    /// Load failures, one per collection that could not be fetched.
    pub notices: Vec<String>,
}

pub fn format_date(ts: DateTime<Utc>) -> String {
    ts.format("%b %-d, %Y").to_string()
}

fn project_cards(snap: &MirrorSnapshot<Project>) -> Vec<ProjectCard> {
    snap.entries
        .iter()
        .map(|entry| {
            let p = &entry.record;
            ProjectCard {
                key: snap.render_key(entry).to_string(),
                id: p.id,
                name: p.name.clone(),
                description_html: sanitize_html(&p.description),
                excerpt: excerpt(&p.description, EXCERPT_CHARS),
                technologies: p.technologies.clone(),
                live_url: p.live_url.clone(),
                repo_url: p.repo_url.clone(),
                updated: format_date(p.updated_at),
                status: entry.state.into(),
            }
        })
        .collect()
}

fn post_cards(snap: &MirrorSnapshot<BlogPost>) -> Vec<PostCard> {
    snap.entries
        .iter()
        .map(|entry| {
            let post = &entry.record;
            PostCard {
                key: snap.render_key(entry).to_string(),
                id: post.id,
                title: post.title.clone(),
                content_html: sanitize_html(&post.content),
                excerpt: excerpt(&post.content, EXCERPT_CHARS),
                author: post.author_id.clone(),
                published: format_date(post.created_at),
                updated: format_date(post.updated_at),
                status: entry.state.into(),
            }
        })
        .collect()
}

// ── Dashboard ────────────────────────────────────────────────────────

pub struct AdminDashboard<B> {
    backend: Arc<B>,
    session: Session,
    banner: ErrorBanner,
    projects: CollectionController<Project, B>,
    posts: CollectionController<BlogPost, B>,
    project_notice: Option<String>,
    post_notice: Option<String>,
    followers: Vec<JoinHandle<()>>,
}

impl<B> AdminDashboard<B>
where
    B: ResourceBackend<Project> + ResourceBackend<BlogPost>,
{
    /// Mount for an authenticated session; otherwise the caller should
    /// route to [`Route::Home`].
    pub fn mount(backend: Arc<B>, session: Session) -> Result<Self, CoreError> {
        if !session.is_authenticated() {
            return Err(CoreError::NotAuthenticated);
        }

        let banner = ErrorBanner::new();
        let projects = CollectionController::new(
            Arc::clone(&backend),
            ConfirmedCollection::default(),
            banner.clone(),
        );
        let posts = CollectionController::new(
            Arc::clone(&backend),
            ConfirmedCollection::default(),
            banner.clone(),
        );
        let followers = vec![projects.follow_confirmed(), posts.follow_confirmed()];

        Ok(Self {
            backend,
            session,
            banner,
            projects,
            posts,
            project_notice: None,
            post_notice: None,
            followers,
        })
    }

    /// Fetch both collections. A failed fetch leaves that collection empty
    /// and records a load notice; it never fails the dashboard.
    pub async fn load(&mut self) {
        let (projects, posts) = tokio::join!(
            <B as ResourceBackend<Project>>::list(&self.backend),
            <B as ResourceBackend<BlogPost>>::list(&self.backend),
        );

        self.project_notice = apply_load(&self.projects, projects);
        self.post_notice = apply_load(&self.posts, posts);
    }

    pub fn projects(&self) -> &CollectionController<Project, B> {
        &self.projects
    }

    pub fn posts(&self) -> &CollectionController<BlogPost, B> {
        &self.posts
    }

    pub fn banner(&self) -> &ErrorBanner {
        &self.banner
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn notices(&self) -> Vec<String> {
        [&self.project_notice, &self.post_notice]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            projects: project_cards(&self.projects.snapshot()),
            posts: post_cards(&self.posts.snapshot()),
            banner: self.banner.current(),
            notices: self.notices(),
        }
    }

    /// Unmount both controllers and end the session.
    pub fn logout(&self) -> Result<Route, CoreError> {
        self.unmount();
        self.session.logout()?;
        Ok(Route::Home)
    }

    fn unmount(&self) {
        self.projects.unmount();
        self.posts.unmount();
        for follower in &self.followers {
            follower.abort();
        }
    }
}

impl<B> Drop for AdminDashboard<B> {
    fn drop(&mut self) {
        for follower in &self.followers {
            follower.abort();
        }
    }
}

fn apply_load<R, B>(
    controller: &CollectionController<R, B>,
    result: Result<Vec<R>, folio_api::Error>,
) -> Option<String>
where
    R: Resource,
    B: ResourceBackend<R>,
{
    let kind: ResourceKind = R::KIND;
    let notice = match result {
        Ok(records) => {
            info!(kind = %kind, count = records.len(), "loaded");
            controller.confirmed().replace(records);
            None
        }
        Err(e) => {
            let err = CoreError::from(e);
            warn!(kind = %kind, status = ?err.status(), error = %err, "load failed");
            controller.confirmed().replace(Vec::new());
            Some(format!("Failed to load {}.", kind.plural()))
        }
    };
    controller.resync();
    notice
}
