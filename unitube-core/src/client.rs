use std::path::Path;
use std::time::Duration;

use reqwest::multipart;
use reqwest::RequestBuilder;
use serde_json::json;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::models::{Comment, NewUser, TokenResponse, User, Video};
use crate::session::Session;

/// Typed asynchronous facade over the UniTube HTTP API. One method per
/// remote operation; every method returns either the decoded body or an
/// [`ApiError`] separating transport failures from status failures.
///
/// The current session token, when present, is attached as a bearer
/// header on every request.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
    http: reqwest::Client,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, http: reqwest::Client, session: Session) -> Self {
        let mut base = base_url.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base, http, session }
    }

    /// Build a client from the server section of the app config.
    pub fn from_config(config: &ServerConfig, session: Session) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self::new(config.base_url.clone(), http, session))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn ensure_success(response: &reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Status(status.as_u16()))
        }
    }

    // --- videos ---

    pub async fn list_videos(&self) -> Result<Vec<Video>, ApiError> {
        let request = self.http.get(self.url("/api/videos"));
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(&response)?;
        Ok(response.json().await?)
    }

    pub async fn video_by_id(&self, id: i64) -> Result<Video, ApiError> {
        let request = self.http.get(self.url(&format!("/api/videos/{id}")));
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(&response)?;
        Ok(response.json().await?)
    }

    pub async fn videos_by_owner(&self, owner: &str) -> Result<Vec<Video>, ApiError> {
        let request = self.http.get(self.url(&format!("/api/users/{owner}/videos")));
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(&response)?;
        Ok(response.json().await?)
    }

    pub async fn create_video(&self, video: &Video) -> Result<(), ApiError> {
        let request = self.http.post(self.url("/api/videos")).json(video);
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(&response)
    }

    pub async fn update_video(&self, owner: &str, id: i64, video: &Video) -> Result<(), ApiError> {
        let request = self
            .http
            .put(self.url(&format!("/api/users/{owner}/videos/{id}")))
            .json(video);
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(&response)
    }

    pub async fn delete_video(&self, owner: &str, id: i64) -> Result<(), ApiError> {
        let request = self
            .http
            .delete(self.url(&format!("/api/users/{owner}/videos/{id}")));
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(&response)
    }

    // --- comments ---

    pub async fn comments_for_video(&self, video_id: i64) -> Result<Vec<Comment>, ApiError> {
        let request = self
            .http
            .get(self.url(&format!("/api/videos/{video_id}/comments")));
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(&response)?;
        Ok(response.json().await?)
    }

    pub async fn comment_by_id(&self, video_id: i64, id: i64) -> Result<Comment, ApiError> {
        let request = self
            .http
            .get(self.url(&format!("/api/videos/{video_id}/comments/{id}")));
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(&response)?;
        Ok(response.json().await?)
    }

    pub async fn create_comment(&self, comment: &Comment) -> Result<(), ApiError> {
        let request = self
            .http
            .post(self.url(&format!("/api/videos/{}/comments", comment.video_id)))
            .json(comment);
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(&response)
    }

    pub async fn update_comment(
        &self,
        video_id: i64,
        id: i64,
        comment: &Comment,
    ) -> Result<(), ApiError> {
        let request = self
            .http
            .put(self.url(&format!("/api/videos/{video_id}/comments/{id}")))
            .json(comment);
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(&response)
    }

    pub async fn delete_comment(&self, video_id: i64, id: i64) -> Result<(), ApiError> {
        let request = self
            .http
            .delete(self.url(&format!("/api/videos/{video_id}/comments/{id}")));
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(&response)
    }

    // --- users ---

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let body = json!({ "username": username, "password": password });
        let response = self
            .http
            .post(self.url("/api/tokens"))
            .json(&body)
            .send()
            .await?;
        Self::ensure_success(&response)?;
        Ok(response.json().await?)
    }

    pub async fn user_by_name(&self, username: &str) -> Result<User, ApiError> {
        let request = self.http.get(self.url(&format!("/api/users/{username}")));
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(&response)?;
        Ok(response.json().await?)
    }

    /// Register a new account. Text fields go out as multipart form
    /// parts; the profile photo, when given, is attached as a file part
    /// named `profilePicture`.
    pub async fn create_user(&self, user: &NewUser, photo: Option<&Path>) -> Result<(), ApiError> {
        let mut form = multipart::Form::new()
            .text("username", user.username.clone())
            .text("firstName", user.first_name.clone())
            .text("lastName", user.last_name.clone())
            .text("password", user.password.clone());

        if let Some(path) = photo {
            let bytes = tokio::fs::read(path).await?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "profile".to_string());
            let part = multipart::Part::bytes(bytes)
                .file_name(file_name)
                .mime_str("image/*")?;
            form = form.part("profilePicture", part);
        }

        let response = self
            .http
            .post(self.url("/api/users"))
            .multipart(form)
            .send()
            .await?;
        Self::ensure_success(&response)
    }

    pub async fn update_user(&self, user: &User) -> Result<(), ApiError> {
        let request = self
            .http
            .put(self.url(&format!("/api/users/{}", user.username)))
            .json(user);
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(&response)
    }

    pub async fn delete_user(&self, username: &str) -> Result<(), ApiError> {
        let request = self.http.delete(self.url(&format!("/api/users/{username}")));
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(&response)
    }
}
