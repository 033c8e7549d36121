use chrono::{TimeZone, Utc};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use unitube_core::{ApiClient, CacheStore, Comment, CommentRepository, Session};

fn sample_comment(id: i64, video_id: i64, text: &str) -> Comment {
    Comment {
        id,
        video_id,
        author: "alice".to_string(),
        text: text.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    }
}

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(server.uri(), reqwest::Client::new(), Session::new())
}

#[tokio::test]
async fn fetch_for_video_replaces_cache_with_scoped_comments() {
    let server = MockServer::start().await;
    let remote = vec![sample_comment(1, 5, "first"), sample_comment(2, 5, "second")];

    Mock::given(method("GET"))
        .and(path("/api/videos/5/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&remote))
        .mount(&server)
        .await;

    let cache = CacheStore::in_memory();
    cache
        .replace_comments(vec![sample_comment(9, 3, "other video")])
        .await;

    let repo = CommentRepository::new(client_for(&server), cache.clone());
    let rx = repo.subscribe();

    repo.fetch_for_video(5).await;

    assert_eq!(cache.comments().await, remote);
    assert_eq!(*rx.borrow(), remote);
}

#[tokio::test]
async fn create_inserts_comment_and_republishes() {
    let server = MockServer::start().await;
    let comment = sample_comment(3, 5, "nice video");

    Mock::given(method("POST"))
        .and(path("/api/videos/5/comments"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let cache = CacheStore::in_memory();
    let repo = CommentRepository::new(client_for(&server), cache.clone());
    let rx = repo.subscribe();

    repo.create(comment.clone()).await;

    assert_eq!(cache.comments().await, vec![comment.clone()]);
    assert_eq!(*rx.borrow(), vec![comment]);
}

#[tokio::test]
async fn failed_delete_leaves_cache_untouched() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/videos/5/comments/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cache = CacheStore::in_memory();
    let seeded = vec![sample_comment(1, 5, "kept")];
    cache.replace_comments(seeded.clone()).await;

    let repo = CommentRepository::new(client_for(&server), cache.clone());
    let rx = repo.subscribe();

    repo.delete(5, 1).await;

    assert_eq!(cache.comments().await, seeded);
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn delete_removes_comment_after_remote_success() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/videos/5/comments/1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let cache = CacheStore::in_memory();
    cache
        .replace_comments(vec![sample_comment(1, 5, "gone"), sample_comment(2, 5, "kept")])
        .await;

    let repo = CommentRepository::new(client_for(&server), cache.clone());
    repo.delete(5, 1).await;

    assert_eq!(cache.comments().await, vec![sample_comment(2, 5, "kept")]);
}
