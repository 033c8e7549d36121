pub mod cache;
pub mod client;
pub mod comments;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod users;
pub mod videos;

pub use cache::CacheStore;
pub use client::ApiClient;
pub use comments::CommentRepository;
pub use config::{AppConfig, CacheConfig, ServerConfig};
pub use error::ApiError;
pub use models::{Comment, NewUser, TokenResponse, User, Video};
pub use session::Session;
pub use users::{Outcome, UserRepository};
pub use videos::VideoRepository;
