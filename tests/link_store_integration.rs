//! Integration tests for the link store against a real SQLite file.

use media_saver_core::{
    Database, HistoryStatus, LinkError, LinkKind, LinkStatus, LinkStore, NewHistoryLog, NewLink,
};
use media_saver_core::link::{STARTUP_RESET_MARKER, StoreDbErrorKind};
use tempfile::TempDir;

async fn setup() -> (TempDir, LinkStore) {
    let temp_dir = TempDir::new().expect("create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let db = Database::new(&db_path).await.expect("create database");
    (temp_dir, LinkStore::new(db))
}

fn new_link(url: &str) -> NewLink {
    NewLink {
        url: url.to_string(),
        ..NewLink::default()
    }
}

#[tokio::test]
async fn test_add_and_get_round_trip() {
    let (_dir, store) = setup().await;

    let id = store
        .add(&NewLink {
            url: "https://www.youtube.com/@creator".to_string(),
            kind: Some(LinkKind::Creator),
            site_name: Some("YouTube".to_string()),
            name: Some("My Creator".to_string()),
            cookies_path: None,
            settings: None,
        })
        .await
        .expect("add link");

    let link = store.get(id).await.expect("get").expect("link exists");
    assert_eq!(link.url, "https://www.youtube.com/@creator");
    assert_eq!(link.kind(), LinkKind::Creator);
    assert_eq!(link.status(), LinkStatus::Idle);
    assert_eq!(link.site_name.as_deref(), Some("YouTube"));
    assert_eq!(link.name.as_deref(), Some("My Creator"));
    assert!(link.is_enabled);
    assert!(link.error_message.is_none());
    assert!(link.last_checked_at.is_none());
    assert!(link.last_success_at.is_none());
    assert!(link.parse_settings().is_empty());

    let by_url = store
        .get_by_url("https://www.youtube.com/@creator")
        .await
        .expect("get by url")
        .expect("link exists");
    assert_eq!(by_url.id, id);
}

#[tokio::test]
async fn test_duplicate_url_rejected_as_constraint_violation() {
    let (_dir, store) = setup().await;

    store
        .add(&new_link("https://example.com/user"))
        .await
        .expect("first add");

    let err = store
        .add(&new_link("https://example.com/user"))
        .await
        .expect_err("duplicate should fail");
    assert!(err.is_constraint_violation(), "got: {err:?}");
    assert_eq!(
        err.database_kind(),
        Some(StoreDbErrorKind::UniqueViolation)
    );
}

#[tokio::test]
async fn test_history_for_unknown_link_is_foreign_key_violation() {
    let (_dir, store) = setup().await;

    let err = store
        .append_history(&NewHistoryLog {
            link_id: 999,
            status: Some(HistoryStatus::Failure),
            ..NewHistoryLog::default()
        })
        .await
        .expect_err("append for missing link should fail");
    assert_eq!(
        err.database_kind(),
        Some(StoreDbErrorKind::ForeignKeyViolation)
    );
    assert!(err.is_constraint_violation());
}

#[tokio::test]
async fn test_update_status_error_sets_message_and_checked_at() {
    let (_dir, store) = setup().await;
    let id = store
        .add(&new_link("https://example.com/user"))
        .await
        .expect("add");

    store
        .update_status(id, LinkStatus::Error, Some("tool exploded"), false)
        .await
        .expect("update");

    let link = store.get(id).await.expect("get").expect("exists");
    assert_eq!(link.status(), LinkStatus::Error);
    assert_eq!(link.error_message.as_deref(), Some("tool exploded"));
    assert!(link.last_checked_at.is_some());
    assert!(link.last_success_at.is_none());
}

#[tokio::test]
async fn test_update_status_non_error_clears_message() {
    let (_dir, store) = setup().await;
    let id = store
        .add(&new_link("https://example.com/user"))
        .await
        .expect("add");

    store
        .update_status(id, LinkStatus::Error, Some("transient failure"), false)
        .await
        .expect("set error");
    // Message argument is ignored for non-error statuses
    store
        .update_status(id, LinkStatus::Idle, Some("should be dropped"), false)
        .await
        .expect("back to idle");

    let link = store.get(id).await.expect("get").expect("exists");
    assert_eq!(link.status(), LinkStatus::Idle);
    assert!(link.error_message.is_none());
}

#[tokio::test]
async fn test_update_status_success_sets_last_success_at() {
    let (_dir, store) = setup().await;
    let id = store
        .add(&new_link("https://example.com/user"))
        .await
        .expect("add");

    store
        .update_status(id, LinkStatus::Idle, None, true)
        .await
        .expect("success update");

    let link = store.get(id).await.expect("get").expect("exists");
    assert!(link.last_success_at.is_some());
    assert!(link.last_checked_at.is_some());

    let success_at = link.last_success_at.clone();

    // A later failed attempt must not move last_success_at
    store
        .update_status(id, LinkStatus::Error, Some("boom"), false)
        .await
        .expect("failure update");

    let link = store.get(id).await.expect("get").expect("exists");
    assert_eq!(link.last_success_at, success_at);
}

#[tokio::test]
async fn test_update_status_unknown_id_is_not_found() {
    let (_dir, store) = setup().await;
    let result = store.update_status(42, LinkStatus::Idle, None, false).await;
    assert!(matches!(result, Err(LinkError::LinkNotFound(42))));
}

#[tokio::test]
async fn test_list_eligible_excludes_disabled_and_in_flight() {
    let (_dir, store) = setup().await;

    let idle = store.add(&new_link("https://a.example/1")).await.expect("add");
    let errored = store.add(&new_link("https://a.example/2")).await.expect("add");
    let disabled = store.add(&new_link("https://a.example/3")).await.expect("add");
    let downloading = store.add(&new_link("https://a.example/4")).await.expect("add");
    let recording = store.add(&new_link("https://a.example/5")).await.expect("add");
    let monitoring = store.add(&new_link("https://a.example/6")).await.expect("add");

    store
        .update_status(errored, LinkStatus::Error, Some("old failure"), false)
        .await
        .expect("update");
    store.set_enabled(disabled, false).await.expect("disable");
    store
        .update_status(downloading, LinkStatus::Downloading, None, false)
        .await
        .expect("update");
    store
        .update_status(recording, LinkStatus::Recording, None, false)
        .await
        .expect("update");
    store
        .update_status(monitoring, LinkStatus::Monitoring, None, false)
        .await
        .expect("update");

    let eligible: Vec<i64> = store
        .list_eligible()
        .await
        .expect("list")
        .into_iter()
        .map(|link| link.id)
        .collect();

    // Idle and error links re-enter the batch; the rest stay out
    assert_eq!(eligible, vec![idle, errored]);
}

#[tokio::test]
async fn test_reset_stale_covers_all_in_flight_statuses() {
    let (_dir, store) = setup().await;

    let a = store.add(&new_link("https://a.example/1")).await.expect("add");
    let b = store.add(&new_link("https://a.example/2")).await.expect("add");
    let c = store.add(&new_link("https://a.example/3")).await.expect("add");
    let untouched = store.add(&new_link("https://a.example/4")).await.expect("add");

    store
        .update_status(a, LinkStatus::Monitoring, None, false)
        .await
        .expect("update");
    store
        .update_status(b, LinkStatus::Downloading, None, false)
        .await
        .expect("update");
    store
        .update_status(c, LinkStatus::Recording, None, false)
        .await
        .expect("update");

    let reset = store.reset_stale().await.expect("reset");
    assert_eq!(reset, 3);

    for id in [a, b, c] {
        let link = store.get(id).await.expect("get").expect("exists");
        assert_eq!(link.status(), LinkStatus::Idle);
        assert_eq!(link.error_message.as_deref(), Some(STARTUP_RESET_MARKER));
        // Reset writes no history rows
        assert_eq!(store.count_history_for_link(id).await.expect("count"), 0);
    }

    let link = store.get(untouched).await.expect("get").expect("exists");
    assert!(link.error_message.is_none());

    // Idempotent: nothing left to reset
    assert_eq!(store.reset_stale().await.expect("reset again"), 0);
}

#[tokio::test]
async fn test_history_append_and_read_back() {
    let (_dir, store) = setup().await;
    let id = store
        .add(&new_link("https://example.com/user"))
        .await
        .expect("add");

    let files = vec!["/media/a.mp4".to_string(), "/media/b.mp4".to_string()];
    store
        .append_history(&NewHistoryLog {
            link_id: id,
            status: Some(HistoryStatus::Success),
            downloaded_files: Some(&files),
            error_message: None,
            details: None,
        })
        .await
        .expect("append success");
    store
        .append_history(&NewHistoryLog {
            link_id: id,
            status: Some(HistoryStatus::Failure),
            downloaded_files: None,
            error_message: Some("gallery-dl failed with code 2. Stderr: denied"),
            details: None,
        })
        .await
        .expect("append failure");

    assert_eq!(store.count_history_for_link(id).await.expect("count"), 2);

    let rows = store.history_for_link(id, 10, 0).await.expect("read");
    assert_eq!(rows.len(), 2);
    // Newest first
    assert_eq!(rows[0].status(), HistoryStatus::Failure);
    assert!(
        rows[0]
            .error_message
            .as_deref()
            .is_some_and(|msg| msg.contains("failed with code 2"))
    );
    assert_eq!(rows[1].status(), HistoryStatus::Success);
    assert_eq!(rows[1].parse_downloaded_files(), files);
}

#[tokio::test]
async fn test_history_limit_and_offset() {
    let (_dir, store) = setup().await;
    let id = store
        .add(&new_link("https://example.com/user"))
        .await
        .expect("add");

    for _ in 0..5 {
        store
            .append_history(&NewHistoryLog {
                link_id: id,
                status: Some(HistoryStatus::Success),
                ..NewHistoryLog::default()
            })
            .await
            .expect("append");
    }

    assert_eq!(store.history_for_link(id, 2, 0).await.expect("page").len(), 2);
    assert_eq!(store.history_for_link(id, 10, 4).await.expect("page").len(), 1);
}

#[tokio::test]
async fn test_remove_cascades_history() {
    let (_dir, store) = setup().await;
    let id = store
        .add(&new_link("https://example.com/user"))
        .await
        .expect("add");
    store
        .append_history(&NewHistoryLog {
            link_id: id,
            status: Some(HistoryStatus::Success),
            ..NewHistoryLog::default()
        })
        .await
        .expect("append");

    store.remove(id).await.expect("remove");

    assert!(store.get(id).await.expect("get").is_none());
    assert_eq!(store.count_history_for_link(id).await.expect("count"), 0);

    let result = store.remove(id).await;
    assert!(matches!(result, Err(LinkError::LinkNotFound(_))));
}
