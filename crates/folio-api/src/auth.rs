// Token login and registration against `/login` and `/register`.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::error::Error;
use crate::types::{Credentials, LoginResponse};

/// Source of the bearer token attached to mutating requests.
///
/// The session store implements this; the client asks for the token on
/// every mutating call so a login or logout takes effect immediately.
pub trait TokenProvider: Send + Sync {
    fn bearer_token(&self) -> Option<SecretString>;
}

/// Provider for read-only use: never supplies a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl TokenProvider for Anonymous {
    fn bearer_token(&self) -> Option<SecretString> {
        None
    }
}

/// A fixed token, e.g. one taken from `FOLIO_TOKEN`.
#[derive(Debug, Clone)]
pub struct StaticToken(pub SecretString);

impl TokenProvider for StaticToken {
    fn bearer_token(&self) -> Option<SecretString> {
        Some(self.0.clone())
    }
}

impl ApiClient {
    /// Exchange credentials for a bearer token.
    ///
    /// A 2xx response without a non-empty `token` field is an
    /// [`Error::Authentication`]; a non-2xx response is an [`Error::Api`].
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<SecretString, Error> {
        debug!(username, "logging in");
        let body = Credentials {
            username,
            password: password.expose_secret(),
        };
        let resp: Option<LoginResponse> = self.post("login", &body).await?;

        match resp.and_then(|r| r.token).filter(|t| !t.trim().is_empty()) {
            Some(token) => {
                info!(username, "login succeeded");
                Ok(SecretString::from(token))
            }
            None => Err(Error::Authentication {
                message: "login response carried no token".into(),
            }),
        }
    }

    /// Create a new account. The response body, if any, is ignored.
    pub async fn register(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        debug!(username, "registering");
        let body = Credentials {
            username,
            password: password.expose_secret(),
        };
        self.post_no_response("register", &body).await
    }
}
