//! Integration tests for ApiClient.
//!
//! Uses wiremock as the backend. Covers login and token persistence, the bearer
//! header, 401 clearing the session, status mapping and the resource calls.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use expense_tracker::api::{CategoryDraft, Credentials, ProfileUpdate, SpendDraft, TaskDraft};
use expense_tracker::config::normalize_base_url;
use expense_tracker::{ApiClient, ApiError, FileSessionStore, MemorySessionStore, Session, SessionStore};
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_with(server: &MockServer, store: Arc<dyn SessionStore>) -> ApiClient {
    ApiClient::new(
        normalize_base_url(&format!("{}/api", server.uri())).unwrap(),
        Duration::from_secs(5),
        store,
    )
    .expect("failed to create client")
}

fn logged_in(server: &MockServer) -> (ApiClient, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::with_session(Session::new(
        "test-token",
        Some("alice".into()),
    )));
    (client_with(server, store.clone()), store)
}

#[tokio::test]
async fn test_login_stores_token_in_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({"username": "alice", "password": "pw123456"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileSessionStore::new(dir.path().join("session.json")));
    let client = client_with(&server, store.clone());

    let session = client
        .login(&Credentials {
            username: "alice".into(),
            password: "pw123456".into(),
        })
        .await
        .expect("login failed");

    assert_eq!(session.token, "tok-1");
    assert!(client.is_authenticated());

    // a fresh store over the same file sees the session, like a restart
    let reopened = FileSessionStore::new(store.path());
    assert_eq!(reopened.load(), Some(Session::new("tok-1", Some("alice".into()))));
}

#[tokio::test]
async fn test_login_rejected_maps_to_validation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "non_field_errors": ["Unable to log in with provided credentials."]
        })))
        .mount(&server)
        .await;

    let store: Arc<MemorySessionStore> = Arc::new(MemorySessionStore::new());
    let client = client_with(&server, store.clone());
    let err = client
        .login(&Credentials {
            username: "alice".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(
        err.field_error("non_field_errors"),
        Some("Unable to log in with provided credentials.")
    );
    assert!(store.load().is_none());
}

#[tokio::test]
async fn test_bearer_header_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/spends/"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Lunch", "amount": "12.50", "category": 2, "date": "2024-05-01", "note": null},
            {"id": 2, "title": "Bus", "amount": "2.75", "category": null, "date": "2024-05-02", "note": "monthly"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = logged_in(&server);
    let spends = client.list_spends().await.expect("list failed");

    assert_eq!(spends.len(), 2);
    assert_eq!(spends[0].amount, Decimal::from_str("12.50").unwrap());
    assert_eq!(spends[1].note.as_deref(), Some("monthly"));
}

#[tokio::test]
async fn test_401_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid token."})),
        )
        .mount(&server)
        .await;

    let (client, store) = logged_in(&server);
    let err = client.list_tasks().await.unwrap_err();

    match err {
        ApiError::Unauthorized { message } => assert_eq!(message, "Invalid token."),
        other => panic!("expected Unauthorized, got {other:?}"),
    }
    assert!(store.load().is_none());
    assert!(!client.is_authenticated());

    // the next call fails locally without reaching the backend
    let received = server.received_requests().await.unwrap().len();
    assert!(client.list_tasks().await.unwrap_err().is_unauthorized());
    assert_eq!(server.received_requests().await.unwrap().len(), received);
}

#[tokio::test]
async fn test_status_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/spends/404/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/spends/403/"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({"detail": "You do not have permission."})),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/spends/500/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let (client, store) = logged_in(&server);

    assert!(matches!(
        client.delete_spend(404).await,
        Err(ApiError::NotFound { .. })
    ));
    assert!(matches!(
        client.delete_spend(403).await,
        Err(ApiError::Forbidden { .. })
    ));
    match client.delete_spend(500).await {
        Err(ApiError::Server { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected Server error, got {other:?}"),
    }
    // only 401 drops the session
    assert!(store.load().is_some());
}

#[tokio::test]
async fn test_invalid_json_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let (client, _) = logged_in(&server);
    assert!(matches!(
        client.list_categories().await,
        Err(ApiError::InvalidResponse { .. })
    ));
}

#[tokio::test]
async fn test_spend_crud() {
    let server = MockServer::start().await;
    let draft = SpendDraft {
        title: "Groceries".into(),
        amount: Decimal::from_str("54.30").unwrap(),
        category: Some(1),
        date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        note: None,
    };
    let stored = json!({
        "id": 7, "title": "Groceries", "amount": "54.30", "category": 1,
        "date": "2024-06-01", "note": null
    });

    Mock::given(method("POST"))
        .and(path("/api/spends/"))
        .and(body_json(json!({
            "title": "Groceries", "amount": "54.30", "category": 1,
            "date": "2024-06-01", "note": null
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(stored.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/spends/7/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/spends/7/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = logged_in(&server);
    let created = client.create_spend(&draft).await.unwrap();
    assert_eq!(created.id, 7);
    let updated = client.update_spend(7, &draft).await.unwrap();
    assert_eq!(updated.title, "Groceries");
    client.delete_spend(7).await.unwrap();
}

#[tokio::test]
async fn test_task_toggle_patches_completed_only() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/tasks/3/"))
        .and(body_json(json!({"completed": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3, "title": "Pay rent", "description": null, "completed": true, "due_date": "2024-07-01"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/"))
        .and(body_json(json!({
            "title": "File taxes", "description": null, "completed": false, "due_date": null
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 4, "title": "File taxes", "completed": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = logged_in(&server);
    let task = client.set_task_completed(3, true).await.unwrap();
    assert!(task.completed);
    assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 7, 1));

    let created = client
        .create_task(&TaskDraft {
            title: "File taxes".into(),
            description: None,
            completed: false,
            due_date: None,
        })
        .await
        .unwrap();
    assert_eq!(created.id, 4);
    assert_eq!(created.description, None);
}

#[tokio::test]
async fn test_categories_and_paginated_lists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1, "next": null, "previous": null,
            "results": [{"id": 1, "name": "Food"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/categories/"))
        .and(body_json(json!({"name": "Rent"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 2, "name": "Rent"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/categories/2/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = logged_in(&server);
    let list = client.list_categories().await.unwrap();
    assert_eq!(list[0].name, "Food");

    let created = client
        .create_category(&CategoryDraft { name: "Rent".into() })
        .await
        .unwrap();
    assert_eq!(created.id, 2);
    client.delete_category(2).await.unwrap();
}

#[tokio::test]
async fn test_profile_get_and_update() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/profile/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "username": "alice", "email": "a@example.com", "first_name": "", "last_name": ""
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/profile/"))
        .and(body_json(json!({"email": "alice@example.com", "first_name": "Alice", "last_name": "Liddell"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "username": "alice", "email": "alice@example.com",
            "first_name": "Alice", "last_name": "Liddell"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = logged_in(&server);
    let profile = client.get_profile().await.unwrap();
    assert_eq!(profile.display_name(), "alice");

    let updated = client
        .update_profile(&ProfileUpdate {
            email: "alice@example.com".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
        })
        .await
        .unwrap();
    assert_eq!(updated.display_name(), "Alice Liddell");
}

#[tokio::test]
async fn test_register_does_not_log_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 5, "username": "bob", "email": "bob@example.com"
        })))
        .mount(&server)
        .await;

    let store: Arc<MemorySessionStore> = Arc::new(MemorySessionStore::new());
    let client = client_with(&server, store.clone());
    let profile = client
        .register(&expense_tracker::api::Registration {
            username: "bob".into(),
            email: "bob@example.com".into(),
            password: "longenough".into(),
        })
        .await
        .unwrap();

    assert_eq!(profile.username, "bob");
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_logout_clears_store() {
    let server = MockServer::start().await;
    let (client, store) = logged_in(&server);
    client.logout().unwrap();
    assert!(store.load().is_none());
}
