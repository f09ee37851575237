// Integration tests for the keyed result store and the fire-and-forget runner
//
// Solution requests return before any work happens; these tests pin down the
// pending-then-ready lifecycle that pollers depend on.

use std::sync::Arc;
use std::time::Duration;

use wingman::{followup_key, ResultStore, SolutionPayload, SolutionState, TaskRunner, WingmanError};

#[tokio::test]
async fn test_unknown_key_reads_as_absent() {
    let store = ResultStore::new();
    assert!(store.get("never-submitted").await.is_none());
    assert_eq!(store.len().await, 0);
}

#[tokio::test]
async fn test_submit_is_visible_as_pending_before_work_finishes() {
    let store = Arc::new(ResultStore::new());
    let runner = TaskRunner::new(Arc::clone(&store));

    // Work that cannot finish within the test
    let handle = runner
        .submit("slow", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(SolutionPayload::Raw("never".to_string()))
        })
        .await;

    // The pending record exists the moment submit returns
    let record = store.get("slow").await.expect("pending record");
    assert_eq!(record.state, SolutionState::Pending);
    assert!(record.payload.is_none());
    assert!(record.error.is_none());
    assert!(record.completed_at.is_none());

    handle.abort();
}

#[tokio::test]
async fn test_successful_work_lands_as_ready() {
    let store = Arc::new(ResultStore::new());
    let runner = TaskRunner::new(Arc::clone(&store));

    let handle = runner
        .submit("ok", async { Ok(SolutionPayload::Raw("answer".to_string())) })
        .await;
    handle.await.unwrap();

    let record = store.get("ok").await.unwrap();
    assert_eq!(record.state, SolutionState::Ready);
    assert_eq!(
        record.payload,
        Some(SolutionPayload::Raw("answer".to_string()))
    );
    assert!(record.error.is_none());
    assert!(record.completed_at.is_some());
    assert!(record.submitted_at <= record.completed_at.unwrap());
}

#[tokio::test]
async fn test_failed_work_lands_as_failed_with_the_message() {
    let store = Arc::new(ResultStore::new());
    let runner = TaskRunner::new(Arc::clone(&store));

    let handle = runner
        .submit("boom", async {
            Err(WingmanError::Solution {
                message: "provider exploded".to_string(),
            })
        })
        .await;
    handle.await.unwrap();

    let record = store.get("boom").await.unwrap();
    assert_eq!(record.state, SolutionState::Failed);
    assert!(record.payload.is_none());
    assert!(record.error.as_deref().unwrap().contains("provider exploded"));
}

#[tokio::test]
async fn test_resubmitting_a_key_replaces_its_record() {
    let store = Arc::new(ResultStore::new());
    let runner = TaskRunner::new(Arc::clone(&store));

    let first = runner
        .submit("k", async { Ok(SolutionPayload::Raw("first".to_string())) })
        .await;
    first.await.unwrap();

    let second = runner
        .submit("k", async { Ok(SolutionPayload::Raw("second".to_string())) })
        .await;
    second.await.unwrap();

    let record = store.get("k").await.unwrap();
    assert_eq!(
        record.payload,
        Some(SolutionPayload::Raw("second".to_string()))
    );
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_clear_drops_every_record() {
    let store = Arc::new(ResultStore::new());
    let runner = TaskRunner::new(Arc::clone(&store));

    runner
        .submit("a", async { Ok(SolutionPayload::Raw("1".to_string())) })
        .await
        .await
        .unwrap();
    runner
        .submit("b", async { Ok(SolutionPayload::Raw("2".to_string())) })
        .await
        .await
        .unwrap();
    assert_eq!(store.len().await, 2);

    store.clear().await;
    assert_eq!(store.len().await, 0);
    assert!(store.get("a").await.is_none());
}

#[test]
fn test_followup_keys_share_the_base_prefix_and_stay_unique() {
    let a = followup_key("shot-1.png");
    let b = followup_key("shot-1.png");

    assert!(a.starts_with("shot-1.png:followup:"));
    assert!(b.starts_with("shot-1.png:followup:"));
    assert_ne!(a, b, "two follow-ups on one key need distinct sub-keys");
}
