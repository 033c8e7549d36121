use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::models::User;

#[derive(Debug, Clone)]
struct SessionData {
    token: String,
    user: Option<User>,
}

/// Shared authentication state: at most one token and one identity at a
/// time. Absence means "signed out". Handles are cheap to clone; all of
/// them observe the same state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<Option<SessionData>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an authenticated session from a freshly issued token. The
    /// identity is filled in separately once the user record arrives.
    pub async fn begin(&self, token: String) {
        let mut inner = self.inner.write().await;
        *inner = Some(SessionData { token, user: None });
    }

    /// Replace the current identity. No-op when signed out.
    pub async fn set_identity(&self, user: User) {
        let mut inner = self.inner.write().await;
        match inner.as_mut() {
            Some(data) => data.user = Some(user),
            None => debug!("ignoring identity update while signed out"),
        }
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        *inner = None;
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.read().await.as_ref().map(|data| data.token.clone())
    }

    pub async fn current_user(&self) -> Option<User> {
        self.inner.read().await.as_ref().and_then(|data| data.user.clone())
    }

    pub async fn is_signed_in(&self) -> bool {
        self.inner.read().await.is_some()
    }
}
