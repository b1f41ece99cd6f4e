//! Client-side state for the folio admin panel, layered on `folio-api`.
//!
//! - **[`Session`]**: explicit auth session. Persists the bearer token
//!   through a [`TokenStore`] and supplies it to the API client.
//!
//! - **[`CollectionController`]**: optimistic local mirror of one resource
//!   kind. Creates, edits, and deletes are visible immediately, then
//!   confirmed into the shared [`ConfirmedCollection`] or rolled back.
//!   Per-id sequence numbers settle races in favour of the last operation
//!   issued.
//!
//! - **[`AdminDashboard`]**: mounts one controller per kind behind an
//!   authenticated session and produces a sanitized [`DashboardView`].

pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod notice;
pub mod sanitize;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ApiConfig, TlsVerification};
pub use controller::{
    CollectionController, EntryState, MirrorEntry, MirrorSnapshot, MutationOutcome,
    PendingMutation, RenderKey,
};
pub use dashboard::{AdminDashboard, CardStatus, DashboardView, PostCard, ProjectCard, Route};
pub use error::CoreError;
pub use model::{Resource, ResourceBackend, ResourceKind};
pub use notice::ErrorBanner;
pub use session::{FileTokenStore, MemoryTokenStore, Session, TOKEN_KEY, TokenStore};
pub use store::ConfirmedCollection;
pub use stream::MirrorStream;

// Wire types, re-exported so front ends need only this crate.
pub use folio_api::{
    ApiClient, BlogPost, BlogPostDraft, BlogPostPatch, DEFAULT_BASE_URL, Project, ProjectDraft,
    ProjectPatch, ResourceId, User,
};
