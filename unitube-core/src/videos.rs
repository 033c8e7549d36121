use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::client::ApiClient;
use crate::models::Video;

/// Synchronization repository for videos.
///
/// Every operation is a remote-first pipeline: call the API, and only on
/// success mutate the local cache and publish the cache read-back to the
/// snapshot channel. Failures are logged and leave both the cache and
/// the last published snapshot untouched.
///
/// Full refreshes are generation-stamped: when refreshes overlap, only
/// the most recently started one may apply its response, so a slow old
/// response can never overwrite a newer one's cache state.
pub struct VideoRepository {
    client: ApiClient,
    cache: CacheStore,
    snapshot: watch::Sender<Vec<Video>>,
    refresh_gen: AtomicU64,
    apply: Mutex<()>,
}

impl VideoRepository {
    pub fn new(client: ApiClient, cache: CacheStore) -> Self {
        Self {
            client,
            cache,
            snapshot: watch::channel(Vec::new()).0,
            refresh_gen: AtomicU64::new(0),
            apply: Mutex::new(()),
        }
    }

    /// Receiver over the long-lived snapshot slot. Late subscribers see
    /// the latest published snapshot immediately; a new publish
    /// supersedes any value a subscriber has not yet observed.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Video>> {
        self.snapshot.subscribe()
    }

    /// Refresh the whole cache from the server's video list.
    pub async fn fetch_all(&self) {
        let ticket = self.next_ticket();
        match self.client.list_videos().await {
            Ok(records) => self.apply_replace(ticket, records).await,
            Err(err) => warn!(%err, "video list fetch failed"),
        }
    }

    /// Refresh scoped to one uploader's videos. Same clear-and-replace
    /// semantics as [`fetch_all`](Self::fetch_all); the server decides
    /// which records are visible.
    pub async fn fetch_for_owner(&self, owner: &str) {
        let ticket = self.next_ticket();
        match self.client.videos_by_owner(owner).await {
            Ok(records) => self.apply_replace(ticket, records).await,
            Err(err) => warn!(%err, owner, "owner video fetch failed"),
        }
    }

    /// Remote-only lookup; the cache is not consulted or written.
    pub async fn fetch_by_id(&self, id: i64) -> Option<Video> {
        match self.client.video_by_id(id).await {
            Ok(video) => Some(video),
            Err(err) => {
                warn!(%err, id, "video lookup failed");
                None
            }
        }
    }

    pub async fn create(&self, video: Video) {
        match self.client.create_video(&video).await {
            Ok(()) => {
                self.cache.upsert_video(video).await;
                self.publish().await;
            }
            Err(err) => warn!(%err, "video create failed"),
        }
    }

    pub async fn update(&self, owner: &str, id: i64, video: Video) {
        match self.client.update_video(owner, id, &video).await {
            Ok(()) => {
                self.cache.upsert_video(video).await;
                self.publish().await;
            }
            Err(err) => warn!(%err, id, "video update failed"),
        }
    }

    /// Remote delete, then drop the record from the cache. A record
    /// absent from the cache is a cache no-op, but the read-back is
    /// still published because the server state changed.
    pub async fn delete(&self, owner: &str, id: i64) {
        match self.client.delete_video(owner, id).await {
            Ok(()) => {
                self.cache.remove_video(id).await;
                self.publish().await;
            }
            Err(err) => warn!(%err, id, "video delete failed"),
        }
    }

    fn next_ticket(&self) -> u64 {
        self.refresh_gen.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn apply_replace(&self, ticket: u64, records: Vec<Video>) {
        let _guard = self.apply.lock().await;
        if self.refresh_gen.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "dropping superseded video refresh");
            return;
        }
        self.cache.replace_videos(records).await;
        self.publish().await;
    }

    async fn publish(&self) {
        let snapshot = self.cache.videos().await;
        self.snapshot.send_replace(snapshot);
    }
}
