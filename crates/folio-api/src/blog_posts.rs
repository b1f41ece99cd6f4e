// Blog post endpoints: `/blog-posts` and `/blog-posts/{id}`.

use crate::client::ApiClient;
use crate::error::Error;
use crate::types::{BlogPost, BlogPostDraft, BlogPostPatch, ResourceId};

impl ApiClient {
    pub async fn list_blog_posts(&self) -> Result<Vec<BlogPost>, Error> {
        let posts: Option<Vec<BlogPost>> = self.get("blog-posts").await?;
        Ok(posts.unwrap_or_default())
    }

    pub async fn get_blog_post(&self, id: ResourceId) -> Result<BlogPost, Error> {
        self.get(&format!("blog-posts/{id}")).await
    }

    pub async fn create_blog_post(&self, draft: &BlogPostDraft) -> Result<BlogPost, Error> {
        self.post_authorized("blog-posts", draft).await
    }

    pub async fn update_blog_post(
        &self,
        id: ResourceId,
        patch: &BlogPostPatch,
    ) -> Result<BlogPost, Error> {
        self.put_authorized(&format!("blog-posts/{id}"), patch).await
    }

    pub async fn delete_blog_post(&self, id: ResourceId) -> Result<(), Error> {
        self.delete_authorized(&format!("blog-posts/{id}")).await
    }
}
