//! CLI configuration: thin wrapper around `folio_config` that applies
//! `GlobalOpts` overrides (--api-url, --insecure, --timeout).

use std::sync::Arc;

use folio_core::{ApiClient, ApiConfig, Session, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use folio_config::{
    Config, Profile, TokenStoreKind, config_path, load_config, load_config_or_default,
    open_session, profile_to_api_config, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// The named profile, or an implicit default one when the config has no
/// entry for it (first run, or everything supplied by flags/env).
pub fn profile_or_default(config: &Config, name: &str) -> Profile {
    config.profiles.get(name).cloned().unwrap_or_default()
}

/// Profile + global flags into an `ApiConfig`. Flags win.
pub fn resolve_api_config(
    profile: &Profile,
    config: &Config,
    global: &GlobalOpts,
) -> Result<ApiConfig, CliError> {
    let mut api = profile_to_api_config(profile, &config.defaults)?;

    if let Some(ref url_str) = global.api_url {
        api.base_url = url_str.parse().map_err(|_| CliError::Validation {
            field: "api-url".into(),
            reason: format!("invalid URL: {url_str}"),
        })?;
    }
    if global.insecure {
        api.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        api.timeout = std::time::Duration::from_secs(secs);
    }
    Ok(api)
}

/// Everything a remote command needs: the restored session and a client
/// that signs mutations with it.
pub struct Connection {
    pub profile_name: String,
    pub profile: Profile,
    pub session: Session,
    pub api: Arc<ApiClient>,
}

pub fn connect(global: &GlobalOpts) -> Result<Connection, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);
    if global.profile.is_some() && !cfg.profiles.contains_key(&profile_name) && !cfg.profiles.is_empty() {
        let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available.join(", "),
        });
    }

    let profile = profile_or_default(&cfg, &profile_name);
    let api_config = resolve_api_config(&profile, &cfg, global)?;
    let session = open_session(&profile, &profile_name)?;
    let api = api_config.client(Arc::new(session.clone()))?;

    tracing::debug!(
        profile = %profile_name,
        api_url = %api.base_url(),
        authenticated = session.is_authenticated(),
        "connection ready"
    );

    Ok(Connection {
        profile_name,
        profile,
        session,
        api: Arc::new(api),
    })
}
