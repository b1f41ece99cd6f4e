// Shared single-line error banner fed by both collection controllers.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Clone)]
pub struct ErrorBanner {
    message: Arc<watch::Sender<Option<String>>>,
}

impl Default for ErrorBanner {
    fn default() -> Self {
        let (message, _) = watch::channel(None);
        Self {
            message: Arc::new(message),
        }
    }
}

impl std::fmt::Debug for ErrorBanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ErrorBanner").field(&self.current()).finish()
    }
}

impl ErrorBanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.message.borrow().clone()
    }

    pub fn set(&self, message: impl Into<String>) {
        self.message.send_replace(Some(message.into()));
    }

    pub fn clear(&self) {
        self.message.send_if_modified(|msg| msg.take().is_some());
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.message.subscribe()
    }
}
