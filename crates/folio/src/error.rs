//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use folio_config::ConfigError;
use folio_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the portfolio API")]
    #[diagnostic(
        code(folio::connection_failed),
        help(
            "Check that the backend is running and the API URL is right.\n\
             {reason}\n\
             Try: folio status"
        )
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(folio::auth_failed),
        help(
            "The backend rejected the credentials or token.\n\
             Run: folio login --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("Not logged in (profile '{profile}')")]
    #[diagnostic(
        code(folio::not_logged_in),
        help("Changing projects or posts needs a session. Run: folio login")
    )]
    NotLoggedIn { profile: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(folio::no_credentials),
        help(
            "Pass --username, set FOLIO_USERNAME / FOLIO_PASSWORD,\n\
             or store a password with: folio config set-password"
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(folio::not_found),
        help("Run: folio {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} '{identifier}' is still being saved")]
    #[diagnostic(code(folio::busy), help("Wait for the pending change to finish."))]
    Busy {
        resource_type: String,
        identifier: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({status}): {message}")]
    #[diagnostic(code(folio::api_error))]
    ApiError { status: u16, message: String },

    /// A mutation was rolled back; carries the banner shown to the user.
    #[error("{banner}")]
    #[diagnostic(code(folio::rolled_back), help("Cause: {cause}"))]
    RolledBack { banner: String, cause: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(folio::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(folio::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: folio config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(folio::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {0}")]
    #[diagnostic(
        code(folio::keyring),
        help("Set token_store = \"file\" in the profile to avoid the system keyring.")
    )]
    Keyring(String),

    #[error("Token storage failed: {message}")]
    #[diagnostic(code(folio::storage))]
    Storage { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(folio::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Internal error: {0}")]
    #[diagnostic(code(folio::internal))]
    Internal(String),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NotLoggedIn { .. } | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Busy { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the active profile name to auth errors.
    pub fn for_profile(self, profile: &str) -> Self {
        match self {
            Self::AuthFailed { .. } => Self::AuthFailed {
                profile: profile.into(),
            },
            Self::NotLoggedIn { .. } => Self::NotLoggedIn {
                profile: profile.into(),
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Network { message } => Self::ConnectionFailed { reason: message },

            CoreError::Api { status: 401 | 403, .. } | CoreError::AuthenticationFailed { .. } => {
                Self::AuthFailed {
                    profile: "current".into(),
                }
            }

            CoreError::Api { status, message } => Self::ApiError { status, message },

            CoreError::NotAuthenticated | CoreError::Unmounted => Self::NotLoggedIn {
                profile: "current".into(),
            },

            CoreError::Validation { field, message } => Self::Validation {
                field,
                reason: message,
            },

            CoreError::NotFound { kind, id } => Self::NotFound {
                resource_type: kind.to_string(),
                identifier: id.to_string(),
                list_command: format!("{} list", list_command(kind)),
            },

            CoreError::Pending { kind, id } => Self::Busy {
                resource_type: kind.to_string(),
                identifier: id.to_string(),
            },

            CoreError::Storage { message } => Self::Storage { message },

            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

fn list_command(kind: folio_core::ResourceKind) -> &'static str {
    match kind {
        folio_core::ResourceKind::Project => "projects",
        folio_core::ResourceKind::BlogPost => "posts",
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::ProfileNotFound { name } => Self::ProfileNotFound {
                name,
                available: "(see: folio config profiles)".into(),
            },
            ConfigError::Serialization(e) => Self::Validation {
                field: "config".into(),
                reason: format!("failed to serialize config: {e}"),
            },
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Keyring(message) => Self::Keyring(message),
            ConfigError::Io(e) => Self::Io(e),
            ConfigError::Core(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let auth: CliError = CoreError::Api {
            status: 401,
            message: String::new(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let missing: CliError = CoreError::NotFound {
            kind: folio_core::ResourceKind::BlogPost,
            id: 3,
        }
        .into();
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);
        assert!(missing.to_string().contains("blog post '3'"));

        let offline: CliError = CoreError::Network {
            message: "refused".into(),
        }
        .into();
        assert_eq!(offline.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn profile_is_attached_to_auth_errors() {
        let err = CliError::from(CoreError::NotAuthenticated).for_profile("prod");
        assert!(matches!(err, CliError::NotLoggedIn { ref profile } if profile == "prod"));
    }
}
