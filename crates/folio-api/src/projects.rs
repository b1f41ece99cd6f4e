// Project endpoints: `/projects` and `/projects/{id}`.

use serde::Serialize;

use crate::client::ApiClient;
use crate::error::Error;
use crate::types::{Project, ProjectDraft, ProjectPatch, ResourceId};

/// Request body with `title` mirrored from `name`, which older backends
/// still read.
#[derive(Serialize)]
struct WithTitle<'a, T: Serialize> {
    #[serde(flatten)]
    fields: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

impl ApiClient {
    pub async fn list_projects(&self) -> Result<Vec<Project>, Error> {
        let projects: Option<Vec<Project>> = self.get("projects").await?;
        Ok(projects.unwrap_or_default())
    }

    pub async fn get_project(&self, id: ResourceId) -> Result<Project, Error> {
        self.get(&format!("projects/{id}")).await
    }

    pub async fn create_project(&self, draft: &ProjectDraft) -> Result<Project, Error> {
        let body = WithTitle {
            fields: draft,
            title: Some(&draft.name),
        };
        self.post_authorized("projects", &body).await
    }

    /// Send only the fields present in `patch`; returns the full record.
    pub async fn update_project(&self, id: ResourceId, patch: &ProjectPatch) -> Result<Project, Error> {
        let body = WithTitle {
            fields: patch,
            title: patch.name.as_deref(),
        };
        self.put_authorized(&format!("projects/{id}"), &body).await
    }

    pub async fn delete_project(&self, id: ResourceId) -> Result<(), Error> {
        self.delete_authorized(&format!("projects/{id}")).await
    }
}
