use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::client::ApiClient;
use crate::models::Comment;

/// Synchronization repository for comments. Same remote-first pipeline
/// as [`VideoRepository`](crate::videos::VideoRepository); full
/// refreshes are scoped to a single video, which is the unit the UI
/// displays comments for.
pub struct CommentRepository {
    client: ApiClient,
    cache: CacheStore,
    snapshot: watch::Sender<Vec<Comment>>,
    refresh_gen: AtomicU64,
    apply: Mutex<()>,
}

impl CommentRepository {
    pub fn new(client: ApiClient, cache: CacheStore) -> Self {
        Self {
            client,
            cache,
            snapshot: watch::channel(Vec::new()).0,
            refresh_gen: AtomicU64::new(0),
            apply: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Comment>> {
        self.snapshot.subscribe()
    }

    /// Replace the comment cache with one video's comments.
    pub async fn fetch_for_video(&self, video_id: i64) {
        let ticket = self.refresh_gen.fetch_add(1, Ordering::SeqCst) + 1;
        match self.client.comments_for_video(video_id).await {
            Ok(records) => {
                let _guard = self.apply.lock().await;
                if self.refresh_gen.load(Ordering::SeqCst) != ticket {
                    debug!(ticket, "dropping superseded comment refresh");
                    return;
                }
                self.cache.replace_comments(records).await;
                self.publish().await;
            }
            Err(err) => warn!(%err, video_id, "comment fetch failed"),
        }
    }

    /// Remote-only lookup; the cache is not consulted or written.
    pub async fn fetch_by_id(&self, video_id: i64, id: i64) -> Option<Comment> {
        match self.client.comment_by_id(video_id, id).await {
            Ok(comment) => Some(comment),
            Err(err) => {
                warn!(%err, id, "comment lookup failed");
                None
            }
        }
    }

    pub async fn create(&self, comment: Comment) {
        match self.client.create_comment(&comment).await {
            Ok(()) => {
                self.cache.upsert_comment(comment).await;
                self.publish().await;
            }
            Err(err) => warn!(%err, "comment create failed"),
        }
    }

    pub async fn update(&self, video_id: i64, id: i64, comment: Comment) {
        match self.client.update_comment(video_id, id, &comment).await {
            Ok(()) => {
                self.cache.upsert_comment(comment).await;
                self.publish().await;
            }
            Err(err) => warn!(%err, id, "comment update failed"),
        }
    }

    pub async fn delete(&self, video_id: i64, id: i64) {
        match self.client.delete_comment(video_id, id).await {
            Ok(()) => {
                self.cache.remove_comment(id).await;
                self.publish().await;
            }
            Err(err) => warn!(%err, id, "comment delete failed"),
        }
    }

    async fn publish(&self) {
        let snapshot = self.cache.comments().await;
        self.snapshot.send_replace(snapshot);
    }
}
