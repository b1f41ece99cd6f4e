// folio-api: Async Rust client for the portfolio REST API

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;
pub mod types;

mod blog_posts;
mod projects;
mod users;

pub use auth::{Anonymous, StaticToken, TokenProvider};
pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use types::{
    BlogPost, BlogPostDraft, BlogPostPatch, DEFAULT_AUTHOR_ID, Project, ProjectDraft,
    ProjectPatch, ResourceId, User,
};
