use std::path::Path;

use tokio::sync::watch;
use tracing::warn;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{NewUser, User};
use crate::session::Session;

/// Result of a user-account operation. Recognized status codes map to
/// their own variants so collaborators can react precisely (force a
/// sign-out on `Unauthorized`, show "name taken" on `NameTaken`);
/// everything else, including transport failures, collapses to
/// `Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NameTaken,
    Forbidden,
    Unauthorized,
    Failure,
}

impl Outcome {
    fn from_error(err: &ApiError) -> Self {
        match err.status() {
            Some(409) => Outcome::NameTaken,
            Some(403) => Outcome::Forbidden,
            Some(401) => Outcome::Unauthorized,
            _ => Outcome::Failure,
        }
    }
}

/// Session-aware repository for user accounts. User records are not
/// cached locally; the published value is the most recently fetched
/// record for the signed-in identity.
///
/// The repository never clears the session itself, not even on an
/// unauthorized outcome. It surfaces the distinct variant and leaves
/// the sign-out decision to the collaborator.
pub struct UserRepository {
    client: ApiClient,
    session: Session,
    current: watch::Sender<Option<User>>,
}

impl UserRepository {
    pub fn new(client: ApiClient, session: Session) -> Self {
        Self {
            client,
            session,
            current: watch::channel(None).0,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.current.subscribe()
    }

    /// Exchange credentials for a token, then fetch the full user record
    /// with it. On success the session holds the token and identity and
    /// the record is published; on a failed login the session stays
    /// unset and `None` is published.
    pub async fn login(&self, username: &str, password: &str) -> Option<User> {
        let token = match self.client.login(username, password).await {
            Ok(response) => response.token,
            Err(err) => {
                warn!(%err, username, "login failed");
                self.current.send_replace(None);
                return None;
            }
        };
        self.session.begin(token).await;

        match self.client.user_by_name(username).await {
            Ok(user) => {
                self.session.set_identity(user.clone()).await;
                self.current.send_replace(Some(user.clone()));
                Some(user)
            }
            Err(err) => {
                // Token is kept: the session is live even though the
                // profile lookup did not land.
                warn!(%err, username, "profile fetch after login failed");
                self.current.send_replace(None);
                None
            }
        }
    }

    /// Remote lookup of any user record; published on success.
    pub async fn fetch_user(&self, username: &str) -> Option<User> {
        match self.client.user_by_name(username).await {
            Ok(user) => {
                self.current.send_replace(Some(user.clone()));
                Some(user)
            }
            Err(err) => {
                warn!(%err, username, "user fetch failed");
                None
            }
        }
    }

    /// Register an account, optionally with a profile photo. Neither
    /// the cache nor the session is touched; a 409 from the server
    /// becomes `NameTaken`.
    pub async fn create_user(&self, user: &NewUser, photo: Option<&Path>) -> Outcome {
        match self.client.create_user(user, photo).await {
            Ok(()) => Outcome::Success,
            Err(err) => {
                warn!(%err, username = %user.username, "user create failed");
                Outcome::from_error(&err)
            }
        }
    }

    /// Update the signed-in user's record. On success the session
    /// identity is replaced with the new record.
    pub async fn update_user(&self, user: User) -> Outcome {
        match self.client.update_user(&user).await {
            Ok(()) => {
                self.session.set_identity(user).await;
                Outcome::Success
            }
            Err(err) => {
                warn!(%err, username = %user.username, "user update failed");
                Outcome::from_error(&err)
            }
        }
    }

    /// Delete an account. The caller clears the session on success.
    pub async fn delete_user(&self, username: &str) -> Outcome {
        match self.client.delete_user(username).await {
            Ok(()) => Outcome::Success,
            Err(err) => {
                warn!(%err, username, "user delete failed");
                Outcome::from_error(&err)
            }
        }
    }
}
