use chrono::{TimeZone, Utc};

use unitube_core::{CacheStore, Comment, Video};

fn sample_video(id: i64, title: &str) -> Video {
    Video {
        id,
        title: title.to_string(),
        description: String::new(),
        owner: "alice".to_string(),
        video_url: format!("http://cdn.example.com/{id}.mp4"),
        thumbnail_url: String::new(),
        uploaded_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        views: 3,
    }
}

fn sample_comment(id: i64) -> Comment {
    Comment {
        id,
        video_id: 5,
        author: "bob".to_string(),
        text: "hi".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    }
}

fn temp_dir(prefix: &str) -> std::path::PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "unitube_{}_{}",
        prefix,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis()
    ));
    dir
}

#[tokio::test]
async fn records_survive_a_store_reload() {
    let dir = temp_dir("reload");
    tokio::fs::create_dir_all(&dir).await.unwrap();

    let store = CacheStore::load_from_dir(&dir).await;
    store
        .replace_videos(vec![sample_video(1, "A"), sample_video(2, "B")])
        .await;
    store.replace_comments(vec![sample_comment(1)]).await;

    let reopened = CacheStore::load_from_dir(&dir).await;
    assert_eq!(reopened.videos().await.len(), 2);
    assert_eq!(reopened.video_by_id(2).await, Some(sample_video(2, "B")));
    assert_eq!(reopened.comments().await, vec![sample_comment(1)]);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn load_uses_tmp_fallback_on_corrupted_json() {
    let dir = temp_dir("corrupt");
    tokio::fs::create_dir_all(&dir).await.unwrap();

    // Corrupted main file, valid tmp sibling from an interrupted rename.
    tokio::fs::write(dir.join("videos.json"), b"{ this is not json ")
        .await
        .unwrap();
    let good = vec![sample_video(1, "recovered")];
    tokio::fs::write(
        dir.join("videos.json.tmp"),
        serde_json::to_vec(&good).unwrap(),
    )
    .await
    .unwrap();

    let store = CacheStore::load_from_dir(&dir).await;
    assert_eq!(store.videos().await, good);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn upsert_replaces_matching_id_instead_of_duplicating() {
    let store = CacheStore::in_memory();
    store.replace_videos(vec![sample_video(1, "before")]).await;

    store.upsert_video(sample_video(1, "after")).await;

    let videos = store.videos().await;
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].title, "after");
}

#[tokio::test]
async fn remove_of_missing_id_is_a_noop() {
    let store = CacheStore::in_memory();
    store.replace_videos(vec![sample_video(1, "kept")]).await;

    store.remove_video(99).await;

    assert_eq!(store.videos().await, vec![sample_video(1, "kept")]);
}
