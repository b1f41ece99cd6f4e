// ── Auth session ──
//
// Explicit, cloneable session object. Holds the bearer token in memory,
// persists it through a `TokenStore`, and hands it to the API client via
// `TokenProvider`.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use folio_api::{ApiClient, TokenProvider};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::CoreError;

/// Key the token is persisted under.
pub const TOKEN_KEY: &str = "authToken";

/// Durable home for the auth token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<SecretString>, CoreError>;
    fn save(&self, token: &SecretString) -> Result<(), CoreError>;
    fn clear(&self) -> Result<(), CoreError>;
}

impl<T: TokenStore + ?Sized> TokenStore for Box<T> {
    fn load(&self) -> Result<Option<SecretString>, CoreError> {
        (**self).load()
    }

    fn save(&self, token: &SecretString) -> Result<(), CoreError> {
        (**self).save(token)
    }

    fn clear(&self) -> Result<(), CoreError> {
        (**self).clear()
    }
}

// ── Memory store ─────────────────────────────────────────────────────

/// Process-local store. Clones share the same slot.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<SecretString>>>,
}

impl fmt::Debug for MemoryTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTokenStore").finish_non_exhaustive()
    }
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SecretString>, CoreError> {
        Ok(self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, token: &SecretString) -> Result<(), CoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// ── File store ───────────────────────────────────────────────────────

/// JSON object on disk with the token under [`TOKEN_KEY`]. Other keys in
/// the file are left untouched.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, CoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Map<String, Value>>(&raw) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable token file");
                Ok(Map::new())
            }
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(map).map_err(|e| CoreError::Storage {
            message: format!("failed to encode token file: {e}"),
        })?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<SecretString>, CoreError> {
        let map = self.read_map()?;
        Ok(map
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from))
    }

    fn save(&self, token: &SecretString) -> Result<(), CoreError> {
        let mut map = self.read_map()?;
        map.insert(
            TOKEN_KEY.into(),
            Value::String(token.expose_secret().to_owned()),
        );
        self.write_map(&map)
    }

    fn clear(&self) -> Result<(), CoreError> {
        let mut map = self.read_map()?;
        if map.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        if map.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            };
        }
        self.write_map(&map)
    }
}

// ── Session ──────────────────────────────────────────────────────────

struct SessionInner {
    token: RwLock<Option<SecretString>>,
    store: Box<dyn TokenStore>,
}

/// The process-wide auth session. Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Unauthenticated session backed by `store`.
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self::with_token(store, None)
    }

    /// Session seeded from whatever `store` already holds.
    pub fn restore(store: impl TokenStore + 'static) -> Result<Self, CoreError> {
        let token = store.load()?;
        debug!(restored = token.is_some(), "session restored");
        Ok(Self::with_token(store, token))
    }

    fn with_token(store: impl TokenStore + 'static, token: Option<SecretString>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                token: RwLock::new(token),
                store: Box::new(store),
            }),
        }
    }

    pub fn token(&self) -> Option<SecretString> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| !t.expose_secret().trim().is_empty())
    }

    /// Log in and persist the token. On any failure the session is left
    /// as it was and nothing is written.
    pub async fn login(
        &self,
        api: &ApiClient,
        username: &str,
        password: &SecretString,
    ) -> Result<(), CoreError> {
        validate_credentials(username, password)?;

        let token = api.login(username, password).await.map_err(|e| {
            warn!(username, status = ?e.status(), "login rejected");
            CoreError::from(e)
        })?;
        self.adopt(token)?;
        info!(username, "logged in");
        Ok(())
    }

    /// Persist and activate an externally obtained token.
    pub fn adopt(&self, token: SecretString) -> Result<(), CoreError> {
        self.inner.store.save(&token)?;
        *self.inner.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        Ok(())
    }

    /// Forget the token in memory and in the store.
    pub fn logout(&self) -> Result<(), CoreError> {
        *self.inner.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.inner.store.clear()?;
        info!("logged out");
        Ok(())
    }

    pub async fn register(
        &self,
        api: &ApiClient,
        username: &str,
        password: &SecretString,
    ) -> Result<(), CoreError> {
        validate_credentials(username, password)?;
        api.register(username, password).await?;
        info!(username, "registered");
        Ok(())
    }
}

impl TokenProvider for Session {
    fn bearer_token(&self) -> Option<SecretString> {
        self.token()
    }
}

fn validate_credentials(username: &str, password: &SecretString) -> Result<(), CoreError> {
    if username.trim().is_empty() {
        return Err(CoreError::validation("username", "must not be blank"));
    }
    if password.expose_secret().is_empty() {
        return Err(CoreError::validation("password", "must not be empty"));
    }
    Ok(())
}
