use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::{Comment, Video};

/// Persistent entity cache for videos and comments, one JSON file per
/// kind. In-memory state is the source for reads; every mutation is
/// persisted with a write-to-tmp-then-rename step so a crash never
/// leaves a half-written file.
///
/// Clear-and-replace runs under a single write lock, so readers never
/// observe the intermediate empty state.
#[derive(Debug, Clone)]
pub struct CacheStore {
    videos: Arc<RwLock<Vec<Video>>>,
    comments: Arc<RwLock<Vec<Comment>>>,
    videos_path: Option<PathBuf>,
    comments_path: Option<PathBuf>,
}

impl CacheStore {
    /// Volatile store, nothing touches disk. Used by tests and one-shot
    /// commands that do not want a cache directory.
    pub fn in_memory() -> Self {
        Self {
            videos: Arc::new(RwLock::new(Vec::new())),
            comments: Arc::new(RwLock::new(Vec::new())),
            videos_path: None,
            comments_path: None,
        }
    }

    /// Load the cache files from a directory, creating it if needed.
    pub async fn load_from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let videos_path = dir.join("videos.json");
        let comments_path = dir.join("comments.json");

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!(error = %e, "failed to create cache dir");
        }

        let videos: Vec<Video> = read_json_with_tmp_fallback(&videos_path).await;
        let comments: Vec<Comment> = read_json_with_tmp_fallback(&comments_path).await;

        Self {
            videos: Arc::new(RwLock::new(videos)),
            comments: Arc::new(RwLock::new(comments)),
            videos_path: Some(videos_path),
            comments_path: Some(comments_path),
        }
    }

    // --- videos ---

    /// Clear and bulk-insert as one unit: the write lock is held across
    /// the swap, so no reader sees an empty cache in between.
    pub async fn replace_videos(&self, records: Vec<Video>) {
        let mut store = self.videos.write().await;
        *store = records;
        drop(store);
        self.persist_videos().await;
    }

    pub async fn upsert_video(&self, video: Video) {
        let mut store = self.videos.write().await;
        match store.iter_mut().find(|existing| existing.id == video.id) {
            Some(slot) => *slot = video,
            None => store.push(video),
        }
        drop(store);
        self.persist_videos().await;
    }

    pub async fn remove_video(&self, id: i64) {
        let mut store = self.videos.write().await;
        let before = store.len();
        store.retain(|existing| existing.id != id);
        let removed = store.len() != before;
        drop(store);
        if removed {
            self.persist_videos().await;
        } else {
            debug!(id, "video not in cache, nothing to remove");
        }
    }

    pub async fn videos(&self) -> Vec<Video> {
        self.videos.read().await.clone()
    }

    pub async fn video_by_id(&self, id: i64) -> Option<Video> {
        self.videos
            .read()
            .await
            .iter()
            .find(|video| video.id == id)
            .cloned()
    }

    // --- comments ---

    pub async fn replace_comments(&self, records: Vec<Comment>) {
        let mut store = self.comments.write().await;
        *store = records;
        drop(store);
        self.persist_comments().await;
    }

    pub async fn upsert_comment(&self, comment: Comment) {
        let mut store = self.comments.write().await;
        match store.iter_mut().find(|existing| existing.id == comment.id) {
            Some(slot) => *slot = comment,
            None => store.push(comment),
        }
        drop(store);
        self.persist_comments().await;
    }

    pub async fn remove_comment(&self, id: i64) {
        let mut store = self.comments.write().await;
        let before = store.len();
        store.retain(|existing| existing.id != id);
        let removed = store.len() != before;
        drop(store);
        if removed {
            self.persist_comments().await;
        } else {
            debug!(id, "comment not in cache, nothing to remove");
        }
    }

    pub async fn comments(&self) -> Vec<Comment> {
        self.comments.read().await.clone()
    }

    pub async fn comment_by_id(&self, id: i64) -> Option<Comment> {
        self.comments
            .read()
            .await
            .iter()
            .find(|comment| comment.id == id)
            .cloned()
    }

    async fn persist_videos(&self) {
        let records = self.videos.read().await.clone();
        persist_list(self.videos_path.as_deref(), &records, "videos.json").await;
    }

    async fn persist_comments(&self) {
        let records = self.comments.read().await.clone();
        persist_list(self.comments_path.as_deref(), &records, "comments.json").await;
    }
}

/// Read a JSON list, falling back to the `.json.tmp` sibling when the
/// main file is corrupted (an interrupted rename leaves the tmp file as
/// the most recent complete write).
async fn read_json_with_tmp_fallback<T: DeserializeOwned + Default>(path: &Path) -> T {
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<T>(&bytes) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to parse JSON, trying tmp fallback");
                let tmp = path.with_extension("json.tmp");
                match tokio::fs::read(&tmp).await {
                    Ok(tmp_bytes) => serde_json::from_slice::<T>(&tmp_bytes).unwrap_or_default(),
                    Err(_) => Default::default(),
                }
            }
        },
        Err(_) => Default::default(),
    }
}

async fn persist_list<T: Serialize>(path: Option<&Path>, records: &[T], label: &str) {
    let Some(path) = path else {
        debug!(label, "cache is in-memory only; skipping persist");
        return;
    };
    match serde_json::to_vec_pretty(records) {
        Ok(bytes) => {
            if let Some(parent) = path.parent() {
                let _ = tokio::fs::create_dir_all(parent).await;
            }
            let tmp = path.with_extension("json.tmp");
            if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
                warn!(error = %e, path = %tmp.display(), "failed to write temp cache file");
            }
            if let Err(e) = tokio::fs::rename(&tmp, path).await {
                warn!(error = %e, path = %path.display(), "failed to persist cache file");
            }
        }
        Err(e) => warn!(error = %e, label, "failed to serialize cache records"),
    }
}
