// Read-only user directory.

use crate::client::ApiClient;
use crate::error::Error;
use crate::types::{ResourceId, User};

impl ApiClient {
    pub async fn list_users(&self) -> Result<Vec<User>, Error> {
        let users: Option<Vec<User>> = self.get("users").await?;
        Ok(users.unwrap_or_default())
    }

    pub async fn get_user(&self, id: ResourceId) -> Result<User, Error> {
        self.get(&format!("users/{id}")).await
    }
}
