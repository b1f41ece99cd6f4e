// ── Core error types ──
//
// Errors surfaced by folio-core. Transport detail from folio-api is folded
// into `Network` / `Api` so callers can branch on the three failure
// classes: network, server rejection, client-side validation.

use thiserror::Error;

use crate::model::ResourceKind;
use folio_api::ResourceId;

#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Remote failures ──────────────────────────────────────────────
    /// The request never produced a response.
    #[error("Cannot reach the portfolio API: {message}")]
    Network { message: String },

    /// The server answered with a non-2xx status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not logged in")]
    NotAuthenticated,

    // ── Local preconditions ──────────────────────────────────────────
    /// Client-side validation; never reached the network.
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: ResourceId },

    /// The record has no server id yet, or is being deleted.
    #[error("{kind} {id} is still being saved")]
    Pending { kind: ResourceKind, id: ResourceId },

    #[error("Dashboard is closed")]
    Unmounted,

    // ── Environment ──────────────────────────────────────────────────
    #[error("Token storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// HTTP status for server rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403)) || matches!(self, Self::NotAuthenticated)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<folio_api::Error> for CoreError {
    fn from(err: folio_api::Error) -> Self {
        match err {
            folio_api::Error::Network(e) => match e.status() {
                Some(status) => CoreError::Api {
                    status: status.as_u16(),
                    message: e.to_string(),
                },
                None => CoreError::Network {
                    message: e.to_string(),
                },
            },
            folio_api::Error::Api { status, message } => CoreError::Api { status, message },
            folio_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            folio_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            folio_api::Error::Tls(message) => CoreError::Config {
                message: format!("TLS error: {message}"),
            },
            folio_api::Error::Deserialization { message, .. } => {
                CoreError::Internal(format!("unexpected response from server: {message}"))
            }
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Storage {
            message: err.to_string(),
        }
    }
}
