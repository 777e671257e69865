//! Integration tests for the operation boundary and persistence.

mod helpers;

use serde_json::json;

use docvault_core::types::id::DocumentId;

#[tokio::test]
async fn test_state_survives_reopen() {
    let app = helpers::TestApp::new().await;
    let owner = app.create_test_user("owner@example.com", "Olga").await;
    let doc = app.upload(owner, "keep.txt", b"kept bytes").await;
    app.request(
        owner,
        json!({ "op": "add_comment", "document_id": doc["id"], "text": "note to self" }),
    )
    .await
    .ok();

    let app = app.reopen().await;
    let content = app
        .request(
            owner,
            json!({ "op": "download_document", "document_id": doc["id"] }),
        )
        .await
        .ok();
    assert_eq!(content["content"], helpers::TestApp::encode(b"kept bytes"));

    let comments = app
        .request(
            owner,
            json!({ "op": "list_comments", "document_id": doc["id"] }),
        )
        .await
        .ok();
    assert_eq!(comments[0]["text"], "note to self");
    assert_eq!(comments[0]["user_name"], "Olga");
}

#[tokio::test]
async fn test_failures_do_not_leak_between_calls() {
    let app = helpers::TestApp::new().await;
    let owner = app.create_test_user("owner@example.com", "Olga").await;

    let res = app.request(owner, json!({ "op": "upload_document" })).await;
    assert_eq!(res.code, "VALIDATION");
    let res = app
        .request(
            owner,
            json!({ "op": "get_document", "document_id": DocumentId::new() }),
        )
        .await;
    assert_eq!(res.code, "NOT_FOUND");

    app.upload(owner, "fine.txt", b"ok").await;
}

#[tokio::test]
async fn test_search_statistics_and_activity() {
    let app = helpers::TestApp::new().await;
    let owner = app.create_test_user("owner@example.com", "Olga").await;
    let doc = app.upload(owner, "budget-2024.xlsx", b"1234").await;
    app.upload(owner, "photo.png", b"12").await;
    app.request(
        owner,
        json!({ "op": "update_document", "document_id": doc["id"], "tags": ["finance"] }),
    )
    .await
    .ok();

    let hits = app
        .request(owner, json!({ "op": "search", "q": "BUDGET" }))
        .await
        .ok();
    assert_eq!(hits["count"], 1);

    let res = app
        .request(owner, json!({ "op": "search", "q": " " }))
        .await;
    assert_eq!(res.code, "VALIDATION");

    let tags = app.request(owner, json!({ "op": "list_tags" })).await.ok();
    assert_eq!(tags[0]["name"], "finance");

    let stats = app.request(owner, json!({ "op": "statistics" })).await.ok();
    assert_eq!(stats["total_files"], 2);
    assert_eq!(stats["total_size"], 6);

    let feed = app
        .request(owner, json!({ "op": "user_activity" }))
        .await
        .ok();
    assert_eq!(feed[0]["action"], "edit");

    let res = app
        .request(
            owner,
            json!({ "op": "record_activity", "document_id": doc["id"], "action": "teleport" }),
        )
        .await;
    assert_eq!(res.code, "VALIDATION");
}

#[tokio::test]
async fn test_notifications_mark_read() {
    let app = helpers::TestApp::new().await;
    let owner = app.create_test_user("owner@example.com", "Olga").await;
    let guest = app.create_test_user("guest@example.com", "Gus").await;
    for name in ["a.txt", "b.txt"] {
        let doc = app.upload(owner, name, b"x").await;
        app.request(
            owner,
            json!({
                "op": "share_document",
                "document_id": doc["id"],
                "user_id": guest,
                "access_level": "view",
            }),
        )
        .await
        .ok();
    }

    let count = app
        .request(guest, json!({ "op": "unread_count" }))
        .await
        .ok();
    assert_eq!(count["count"], 2);

    let marked = app
        .request(guest, json!({ "op": "mark_notifications_read" }))
        .await
        .ok();
    assert_eq!(marked["marked"], 2);
    let unread = app
        .request(
            guest,
            json!({ "op": "list_notifications", "unread_only": true }),
        )
        .await
        .ok();
    assert!(unread.as_array().unwrap().is_empty());
}
