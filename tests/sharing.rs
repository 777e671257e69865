//! Integration tests for sharing, grants and the edit-version-revoke flow.

mod helpers;

use serde_json::json;

use docvault_auth::acl;
use docvault_entity::permission::AccessLevel;

#[tokio::test]
async fn test_share_edit_version_revoke() {
    let app = helpers::TestApp::new().await;
    let owner = app.create_test_user("owner@example.com", "Olga").await;
    let editor = app.create_test_user("editor@example.com", "Ade").await;

    let doc = app.upload(owner, "report.txt", b"first draft").await;
    let id = doc["id"].clone();

    app.request(
        owner,
        json!({
            "op": "share_document",
            "document_id": id,
            "user_id": editor,
            "access_level": "edit",
        }),
    )
    .await
    .ok();

    let version = app
        .request(
            editor,
            json!({
                "op": "add_version",
                "document_id": id,
                "filename": "report.txt",
                "content": helpers::TestApp::encode(b"second draft"),
            }),
        )
        .await
        .ok();
    assert_eq!(version["version_number"], 2);

    let doc = app
        .request(owner, json!({ "op": "get_document", "document_id": id }))
        .await
        .ok();
    let numbers: Vec<u64> = doc["versions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["version_number"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(doc["storage_ref"], version["storage_ref"]);
    assert_eq!(doc["size"], version["size"]);

    let inbox = app
        .request(owner, json!({ "op": "list_notifications" }))
        .await
        .ok();
    assert!(
        inbox
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["kind"] == "edit" && n["document_id"] == id)
    );

    let denied = app
        .request(
            editor,
            json!({ "op": "revoke_document", "document_id": id, "user_id": editor }),
        )
        .await;
    assert_eq!(denied.code, "FORBIDDEN");

    app.request(
        owner,
        json!({ "op": "revoke_document", "document_id": id, "user_id": editor }),
    )
    .await
    .ok();

    let perms = app
        .request(
            owner,
            json!({ "op": "document_permissions", "document_id": id }),
        )
        .await
        .ok();
    assert!(perms["permissions"].as_array().unwrap().is_empty());

    let log = app
        .request(
            owner,
            json!({ "op": "document_activity", "document_id": id }),
        )
        .await
        .ok();
    assert_eq!(log[0]["action"], "unshare");
}

#[tokio::test]
async fn test_repeated_share_keeps_one_entry() {
    let app = helpers::TestApp::new().await;
    let owner = app.create_test_user("owner@example.com", "Olga").await;
    let guest = app.create_test_user("guest@example.com", "Gus").await;
    let doc = app.upload(owner, "a.txt", b"a").await;

    for level in ["view", "edit", "admin", "view"] {
        app.request(
            owner,
            json!({
                "op": "share_document",
                "document_id": doc["id"],
                "email": "guest@example.com",
                "access_level": level,
            }),
        )
        .await
        .ok();
    }

    let perms = app
        .request(
            owner,
            json!({ "op": "document_permissions", "document_id": doc["id"] }),
        )
        .await
        .ok();
    let entries = perms["permissions"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["access_level"], "view");
    assert_eq!(entries[0]["user_id"], json!(guest));
}

#[tokio::test]
async fn test_self_share_rejected_and_owner_is_admin() {
    let app = helpers::TestApp::new().await;
    let owner = app.create_test_user("owner@example.com", "Olga").await;
    let doc = app.upload(owner, "a.txt", b"a").await;

    let res = app
        .request(
            owner,
            json!({
                "op": "share_document",
                "document_id": doc["id"],
                "user_id": owner,
                "access_level": "admin",
            }),
        )
        .await;
    assert_eq!(res.code, "CONFLICT");

    let id = serde_json::from_value(doc["id"].clone()).unwrap();
    let stored = app
        .services
        .document_repo()
        .find_one(&docvault_database::repositories::DocumentFilter::by_id(id))
        .await
        .unwrap()
        .unwrap();
    assert!(stored.permissions.is_empty());
    assert_eq!(acl::evaluate(owner, &stored), Some(AccessLevel::Admin));
}

#[tokio::test]
async fn test_revoke_missing_grant_is_not_found() {
    let app = helpers::TestApp::new().await;
    let owner = app.create_test_user("owner@example.com", "Olga").await;
    let a = app.create_test_user("a@example.com", "A").await;
    let b = app.create_test_user("b@example.com", "B").await;
    let doc = app.upload(owner, "a.txt", b"a").await;

    app.request(
        owner,
        json!({
            "op": "share_document",
            "document_id": doc["id"],
            "user_id": a,
            "access_level": "view",
        }),
    )
    .await
    .ok();

    let res = app
        .request(
            owner,
            json!({ "op": "revoke_document", "document_id": doc["id"], "user_id": b }),
        )
        .await;
    assert_eq!(res.code, "NOT_FOUND");

    let perms = app
        .request(
            owner,
            json!({ "op": "document_permissions", "document_id": doc["id"] }),
        )
        .await
        .ok();
    assert_eq!(perms["permissions"].as_array().unwrap().len(), 1);
}
