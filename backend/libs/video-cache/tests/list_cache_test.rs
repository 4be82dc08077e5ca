//! List cache behaviour over the in-memory backend

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use video_cache::{
    ttl, CacheInvalidator, CacheLookup, ChangeKind, DataChange, MemoryCache, MutationHook,
    SegmentListCache, SharedCache, VideoListCache,
};
use video_core::{NewVideo, NewVideoSegment, Video, VideoSegment, VideoType};

fn newest_first(count: i64) -> Vec<Video> {
    let now = Utc::now();
    (1..=count)
        .rev()
        .map(|id| {
            Video::create(
                id,
                now - ChronoDuration::seconds(count - id),
                &NewVideo::new(format!("video-{id}"), VideoType::Vod),
            )
            .unwrap()
        })
        .collect()
}

#[tokio::test]
async fn test_populate_then_invalidate_cycle() {
    let cache: SharedCache = Arc::new(MemoryCache::new());
    let videos = VideoListCache::new(cache.clone());
    let hook = CacheInvalidator::from_cache(cache);

    let list = newest_first(3);
    videos.set(&list).await.unwrap();

    let cached = videos.get().await.unwrap().hit().unwrap();
    assert!(cached
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
    assert_eq!(videos.has_id(2).await.unwrap(), CacheLookup::Hit(true));
    assert_eq!(videos.has_id(99).await.unwrap(), CacheLookup::Hit(false));

    hook.on_data_changed(DataChange::video(4, ChangeKind::Inserted))
        .await;
    assert!(videos.get().await.unwrap().is_miss());
    assert_eq!(videos.has_id(2).await.unwrap(), CacheLookup::Miss);
}

#[tokio::test]
async fn test_last_writer_wins() {
    let videos = VideoListCache::new(Arc::new(MemoryCache::new()));
    let list = newest_first(3);

    videos.set(&list[..1]).await.unwrap();
    videos.set(&list).await.unwrap();
    assert_eq!(videos.get().await.unwrap().hit().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_ttl_expiry_without_mutation() {
    let cache: SharedCache = Arc::new(MemoryCache::new());
    let videos = VideoListCache::new(cache.clone());
    let segments = SegmentListCache::new(cache);

    videos.set(&newest_first(1)).await.unwrap();
    let segment = VideoSegment::create(&NewVideoSegment::new(1, 0, "mp4")).unwrap();
    segments.set(1, &[segment]).await.unwrap();

    tokio::time::advance(Duration::from_secs(ttl::VIDEO_LIST - 1)).await;
    assert!(videos.get().await.unwrap().is_hit());
    assert!(segments.get(1).await.unwrap().is_hit());

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(videos.get().await.unwrap().is_miss());
    assert_eq!(videos.has_id(1).await.unwrap(), CacheLookup::Miss);
    assert!(segments.get(1).await.unwrap().is_miss());
}

#[tokio::test]
async fn test_concurrent_writers_do_not_corrupt() {
    let cache: SharedCache = Arc::new(MemoryCache::new());
    let videos = VideoListCache::new(cache.clone());
    let hook = CacheInvalidator::from_cache(cache);

    let mut handles = Vec::new();
    for i in 0..16 {
        let videos = videos.clone();
        let hook = hook.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                videos.set(&newest_first(2)).await.unwrap();
            } else {
                hook.on_data_changed(DataChange::video(i, ChangeKind::Updated))
                    .await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    match videos.get().await.unwrap() {
        CacheLookup::Hit(list) => assert_eq!(list.len(), 2),
        CacheLookup::Miss => {}
    }
    assert_eq!(hook.failures(), 0);
}
