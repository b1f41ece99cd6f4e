// ── Resource model ──
//
// `Resource` abstracts over projects and blog posts so one controller
// implementation serves both. `ResourceBackend` is the seam to the
// network; `ApiClient` implements it for both kinds and tests swap in
// scripted fakes.

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use folio_api::{
    ApiClient, BlogPost, BlogPostDraft, BlogPostPatch, Project, ProjectDraft, ProjectPatch,
    ResourceId,
};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
pub enum ResourceKind {
    #[strum(serialize = "project")]
    Project,
    #[strum(serialize = "blog post")]
    BlogPost,
}

impl ResourceKind {
    pub fn plural(self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::BlogPost => "blog posts",
        }
    }
}

/// A server-owned record that can be mirrored and optimistically edited.
pub trait Resource: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Input for a create.
    type Draft: Clone + Default + PartialEq + fmt::Debug + Send + Sync + 'static;
    /// Partial update; absent fields are untouched.
    type Patch: Clone + Default + PartialEq + fmt::Debug + Send + Sync + 'static;

    const KIND: ResourceKind;

    fn id(&self) -> ResourceId;
    fn updated_at(&self) -> DateTime<Utc>;

    /// Build the record shown while a create is in flight.
    fn optimistic(id: ResourceId, draft: &Self::Draft, now: DateTime<Utc>) -> Self;

    /// Merge `patch` into `self` and refresh `updated_at`.
    fn apply_patch(&mut self, patch: &Self::Patch, now: DateTime<Utc>);

    /// The patch that turns `original` into `edited`.
    fn patch_between(original: &Self, edited: &Self) -> Self::Patch;

    fn patch_is_empty(patch: &Self::Patch) -> bool;

    /// Required fields must be non-blank.
    fn validate(&self) -> Result<(), CoreError>;
}

fn require(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(field, "must not be blank"));
    }
    Ok(())
}

fn changed<T: PartialEq + Clone>(before: &T, after: &T) -> Option<T> {
    (before != after).then(|| after.clone())
}

// ── Projects ─────────────────────────────────────────────────────────

impl Resource for Project {
    type Draft = ProjectDraft;
    type Patch = ProjectPatch;

    const KIND: ResourceKind = ResourceKind::Project;

    fn id(&self) -> ResourceId {
        self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn optimistic(id: ResourceId, draft: &ProjectDraft, now: DateTime<Utc>) -> Self {
        Project {
            id,
            name: draft.name.clone(),
            title: Some(draft.name.clone()),
            description: draft.description.clone(),
            technologies: draft.technologies.clone(),
            created_at: now,
            updated_at: now,
            live_url: draft.live_url.clone(),
            repo_url: draft.repo_url.clone(),
        }
    }

    fn apply_patch(&mut self, patch: &ProjectPatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
            self.title = Some(name.clone());
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(technologies) = &patch.technologies {
            self.technologies.clone_from(technologies);
        }
        if let Some(live_url) = &patch.live_url {
            self.live_url.clone_from(live_url);
        }
        if let Some(repo_url) = &patch.repo_url {
            self.repo_url.clone_from(repo_url);
        }
        self.updated_at = now;
    }

    fn patch_between(original: &Self, edited: &Self) -> ProjectPatch {
        ProjectPatch {
            name: changed(&original.name, &edited.name),
            description: changed(&original.description, &edited.description),
            technologies: changed(&original.technologies, &edited.technologies),
            live_url: changed(&original.live_url, &edited.live_url),
            repo_url: changed(&original.repo_url, &edited.repo_url),
        }
    }

    fn patch_is_empty(patch: &ProjectPatch) -> bool {
        patch.is_empty()
    }

    fn validate(&self) -> Result<(), CoreError> {
        require("name", &self.name)?;
        require("description", &self.description)
    }
}

// ── Blog posts ───────────────────────────────────────────────────────

impl Resource for BlogPost {
    type Draft = BlogPostDraft;
    type Patch = BlogPostPatch;

    const KIND: ResourceKind = ResourceKind::BlogPost;

    fn id(&self) -> ResourceId {
        self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn optimistic(id: ResourceId, draft: &BlogPostDraft, now: DateTime<Utc>) -> Self {
        BlogPost {
            id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            author_id: draft.author_id.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &BlogPostPatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        if let Some(author_id) = &patch.author_id {
            self.author_id.clone_from(author_id);
        }
        self.updated_at = now;
    }

    fn patch_between(original: &Self, edited: &Self) -> BlogPostPatch {
        BlogPostPatch {
            title: changed(&original.title, &edited.title),
            content: changed(&original.content, &edited.content),
            author_id: changed(&original.author_id, &edited.author_id),
        }
    }

    fn patch_is_empty(patch: &BlogPostPatch) -> bool {
        patch.is_empty()
    }

    fn validate(&self) -> Result<(), CoreError> {
        require("title", &self.title)?;
        require("content", &self.content)
    }
}

// ── Backend seam ─────────────────────────────────────────────────────

/// Remote listing and mutations for one resource kind. Single-record
/// reads go straight to the API client.
pub trait ResourceBackend<R: Resource>: Send + Sync + 'static {
    fn list(&self) -> impl Future<Output = Result<Vec<R>, folio_api::Error>> + Send;

    fn create(&self, draft: &R::Draft)
    -> impl Future<Output = Result<R, folio_api::Error>> + Send;

    fn update(
        &self,
        id: ResourceId,
        patch: &R::Patch,
    ) -> impl Future<Output = Result<R, folio_api::Error>> + Send;

    fn delete(&self, id: ResourceId) -> impl Future<Output = Result<(), folio_api::Error>> + Send;
}

impl ResourceBackend<Project> for ApiClient {
    async fn list(&self) -> Result<Vec<Project>, folio_api::Error> {
        self.list_projects().await
    }

    async fn create(&self, draft: &ProjectDraft) -> Result<Project, folio_api::Error> {
        self.create_project(draft).await
    }

    async fn update(&self, id: ResourceId, patch: &ProjectPatch) -> Result<Project, folio_api::Error> {
        self.update_project(id, patch).await
    }

    async fn delete(&self, id: ResourceId) -> Result<(), folio_api::Error> {
        self.delete_project(id).await
    }
}

impl ResourceBackend<BlogPost> for ApiClient {
    async fn list(&self) -> Result<Vec<BlogPost>, folio_api::Error> {
        self.list_blog_posts().await
    }

    async fn create(&self, draft: &BlogPostDraft) -> Result<BlogPost, folio_api::Error> {
        self.create_blog_post(draft).await
    }

    async fn update(
        &self,
        id: ResourceId,
        patch: &BlogPostPatch,
    ) -> Result<BlogPost, folio_api::Error> {
        self.update_blog_post(id, patch).await
    }

    async fn delete(&self, id: ResourceId) -> Result<(), folio_api::Error> {
        self.delete_blog_post(id).await
    }
}
