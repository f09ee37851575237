// Integration tests for the shared transcript store
//
// The store is the single source of truth for the current session's
// transcript; these tests cover ordering, the recent window, and clearing.

use std::sync::Arc;

use chrono::{Duration, Utc};
use wingman::{TranscriptSegment, TranscriptStore};

#[tokio::test]
async fn test_append_preserves_arrival_order() {
    let store = TranscriptStore::new();

    store.append("first").await;
    store.append("second").await;
    store.append("third").await;

    let all = store.all().await;
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].text, "first");
    assert_eq!(all[1].text, "second");
    assert_eq!(all[2].text, "third");
    assert!(all[0].timestamp <= all[1].timestamp);
}

#[tokio::test]
async fn test_latest_returns_most_recent_segment() {
    let store = TranscriptStore::new();
    assert!(store.latest().await.is_none());

    store.append("one").await;
    store.append("two").await;

    let latest = store.latest().await.unwrap();
    assert_eq!(latest.text, "two");
}

#[tokio::test]
async fn test_recent_filters_out_old_segments() {
    let store = TranscriptStore::new();

    store
        .append_segment(TranscriptSegment {
            text: "old".to_string(),
            timestamp: Utc::now() - Duration::seconds(300),
        })
        .await;
    store
        .append_segment(TranscriptSegment {
            text: "fresh".to_string(),
            timestamp: Utc::now() - Duration::seconds(10),
        })
        .await;

    let recent = store.recent(Duration::seconds(120)).await;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].text, "fresh");
}

#[tokio::test]
async fn test_recent_keeps_segments_stamped_slightly_ahead() {
    // Clock adjustments can stamp a segment a moment ahead of now; the
    // window must not drop it
    let store = TranscriptStore::new();

    store
        .append_segment(TranscriptSegment {
            text: "ahead".to_string(),
            timestamp: Utc::now() + Duration::seconds(5),
        })
        .await;

    let recent = store.recent(Duration::seconds(120)).await;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].text, "ahead");
}

#[tokio::test]
async fn test_recent_text_joins_segments_with_newlines() {
    let store = TranscriptStore::new();

    store.append("line one").await;
    store.append("line two").await;

    let text = store.recent_text(Duration::seconds(120)).await;
    assert_eq!(text, "line one\nline two");
}

#[tokio::test]
async fn test_recent_text_is_empty_when_window_misses() {
    let store = TranscriptStore::new();

    store
        .append_segment(TranscriptSegment {
            text: "stale".to_string(),
            timestamp: Utc::now() - Duration::seconds(600),
        })
        .await;

    assert_eq!(store.recent_text(Duration::seconds(120)).await, "");
}

#[tokio::test]
async fn test_clear_empties_the_store() {
    let store = TranscriptStore::new();

    store.append("something").await;
    assert_eq!(store.len().await, 1);

    store.clear().await;
    assert!(store.is_empty().await);
    assert_eq!(store.len().await, 0);
    assert!(store.latest().await.is_none());
}

#[tokio::test]
async fn test_concurrent_appends_and_reads_stay_consistent() {
    let store = Arc::new(TranscriptStore::new());

    let writer = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            for i in 0..100 {
                store.append(format!("segment {}", i)).await;
            }
        })
    };

    let reader = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            for _ in 0..50 {
                let _ = store.all().await;
                let _ = store.latest().await;
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();

    let all = store.all().await;
    assert_eq!(all.len(), 100);
    assert_eq!(all[0].text, "segment 0");
    assert_eq!(all[99].text, "segment 99");
}
