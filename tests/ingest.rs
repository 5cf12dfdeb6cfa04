//! Ingestion against a stub API: auth header propagation, per-file failure
//! isolation, token fetch failure aborting the run.

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Form, Json, Router,
};
use serde_json::{json, Value};

use biofeedback_api::dto::CreateEntryRequest;
use biofeedback_api::ingest::{process_directory, run, IngestClient, IngestSummary, TokenRequest};

#[derive(Clone, Default)]
struct Received {
    entries: Arc<Mutex<Vec<(Option<String>, CreateEntryRequest)>>>,
}

async fn accept_entry(
    State(received): State<Received>,
    headers: HeaderMap,
    Json(body): Json<CreateEntryRequest>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let mut entries = received.entries.lock().unwrap();
    entries.push((auth, body));
    let id = entries.len();
    (
        StatusCode::OK,
        Json(json!({ "id": id, "message": "New entry created successfully" })),
    )
}

async fn issue_token(Form(form): Form<std::collections::HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    if form.get("username").map(String::as_str) == Some("journal")
        && form.get("password").map(String::as_str) == Some("hunter2")
    {
        (StatusCode::OK, Json(json!({ "access_token": "tok-123", "token_type": "bearer" })))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "bad credentials" })))
    }
}

async fn spawn_stub() -> (String, Received) {
    let received = Received::default();
    let app = Router::new()
        .route("/biofeedback", post(accept_entry))
        .route("/token", post(issue_token))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), received)
}

fn write_transcripts(dir: &std::path::Path) {
    std::fs::write(
        dir.join("001.json"),
        json!({ "text": "Mood: 4\nSleep Quality: 2\n- walked the dog\n" }).to_string(),
    )
    .unwrap();
    std::fs::write(dir.join("002.json"), "{ not json").unwrap();
    std::fs::write(
        dir.join("003.json"),
        json!({ "text": "Mood: five\nDigestion: 3" }).to_string(),
    )
    .unwrap();
    std::fs::write(dir.join("readme.txt"), "ignored").unwrap();
}

#[tokio::test]
async fn test_directory_continues_past_bad_file() {
    let (url, received) = spawn_stub().await;
    let dir = tempfile::tempdir().unwrap();
    write_transcripts(dir.path());

    let client = IngestClient::new(url);
    let summary = process_directory(&client, dir.path()).await.unwrap();
    assert_eq!(summary, IngestSummary { processed: 2, failed: 1 });

    let entries = received.entries.lock().unwrap();
    assert_eq!(entries.len(), 2);

    let (auth, first) = &entries[0];
    assert!(auth.is_none());
    assert_eq!(first.metrics["mood"].score, Some(4));
    assert_eq!(first.metrics["sleep_quality"].score, Some(2));
    assert_eq!(first.additional_notes, vec!["- walked the dog"]);

    let (_, second) = &entries[1];
    assert_eq!(second.metrics["mood"].score, Some(0));
    assert_eq!(second.metrics["digestion"].score, Some(3));
}

#[tokio::test]
async fn test_token_is_sent_as_bearer() {
    let (url, received) = spawn_stub().await;
    let dir = tempfile::tempdir().unwrap();
    write_transcripts(dir.path());

    let mut client = IngestClient::new(url.clone());
    let token = TokenRequest {
        url: format!("{url}/token"),
        username: "journal".into(),
        password: "hunter2".into(),
    };
    let summary = run(&mut client, Some(&token), dir.path()).await.unwrap();
    assert_eq!(summary, IngestSummary { processed: 2, failed: 1 });

    let entries = received.entries.lock().unwrap();
    assert!(!entries.is_empty());
    assert!(entries
        .iter()
        .all(|(auth, _)| auth.as_deref() == Some("Bearer tok-123")));
}

#[tokio::test]
async fn test_rejected_credentials_fail_authentication() {
    let (url, _) = spawn_stub().await;
    let mut client = IngestClient::new(url.clone());
    let result = client
        .authenticate(&format!("{url}/token"), "journal", "wrong")
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_rejected_token_sends_no_entries() {
    let (url, received) = spawn_stub().await;
    let dir = tempfile::tempdir().unwrap();
    write_transcripts(dir.path());

    let mut client = IngestClient::new(url.clone());
    let token = TokenRequest {
        url: format!("{url}/token"),
        username: "journal".into(),
        password: "wrong".into(),
    };
    let err = run(&mut client, Some(&token), dir.path()).await.unwrap_err();
    assert!(format!("{err:#}").contains("Failed to obtain authentication token"));
    assert!(received.entries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_directory_is_an_error() {
    let (url, _) = spawn_stub().await;
    let client = IngestClient::new(url);
    let missing = std::path::Path::new("/definitely/not/a/transcript/dir");
    assert!(process_directory(&client, missing).await.is_err());
}
