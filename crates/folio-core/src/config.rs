// ── Runtime API configuration ──
//
// Describes how to reach the portfolio API. Built by the CLI from a
// profile; core never reads config files.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use folio_api::{ApiClient, TlsMode, TokenProvider, TransportConfig};
use url::Url;

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    #[default]
    SystemDefaults,
    CustomCa(PathBuf),
    /// Skip verification (self-signed development backends).
    DangerAcceptInvalid,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(folio_api::DEFAULT_BASE_URL)
                .unwrap_or_else(|_| unreachable!("default base URL is valid")),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ApiConfig {
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig::default().with_timeout(self.timeout).with_tls(tls)
    }

    /// Build a client whose mutating calls carry tokens from `tokens`.
    pub fn client(&self, tokens: Arc<dyn TokenProvider>) -> Result<ApiClient, CoreError> {
        Ok(ApiClient::new(self.base_url.as_str(), &self.transport(), tokens)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let cfg = ApiConfig::default();
        assert_eq!(cfg.base_url.as_str(), "http://localhost:8080/api");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn transport_carries_tls_and_timeout() {
        let cfg = ApiConfig {
            tls: TlsVerification::DangerAcceptInvalid,
            timeout: Duration::from_secs(5),
            ..ApiConfig::default()
        };
        let transport = cfg.transport();
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(transport.timeout, Duration::from_secs(5));
    }
}
