mod common;

use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use bg_remover::error::{AppError, TRANSFER_FAILED_MESSAGE};
use bg_remover::workflow::{ImageTransferWorkflow, SelectedFile, WorkflowStatus};
use bg_remover::RemoveBgClient;
use common::png_bytes;

#[derive(Debug, Clone)]
struct Received {
    api_key: Option<String>,
    field: String,
    file_name: Option<String>,
    content_type: Option<String>,
    size: usize,
}

type Log = Arc<Mutex<Vec<Received>>>;

/// Answers like remove.bg, keyed on the API key sent.
async fn fake_removebg(State(log): State<Log>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    while let Some(field) = multipart.next_field().await.unwrap() {
        let received = Received {
            api_key: api_key.clone(),
            field: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
            size: 0,
        };
        let size = field.bytes().await.unwrap().len();
        log.lock().unwrap().push(Received { size, ..received });
    }

    match api_key.as_deref() {
        Some("good-key") => ([("content-type", "image/png")], png_bytes(2, 2)).into_response(),
        Some("broke-key") => (
            StatusCode::PAYMENT_REQUIRED,
            [("content-type", "application/json")],
            r#"{"errors":[{"title":"Insufficient credits","code":"insufficient_credits"}]}"#,
        )
            .into_response(),
        Some("empty-key") => StatusCode::OK.into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "<html>upstream exploded</html>").into_response(),
    }
}

async fn spawn_fake_service() -> (String, Log) {
    let log: Log = Arc::default();
    let app = Router::new()
        .route("/v1.0/removebg", post(fake_removebg))
        .with_state(log.clone());
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::Server::from_tcp(listener)
            .unwrap()
            .serve(app.into_make_service())
            .await
            .unwrap();
    });
    (format!("http://{}/v1.0/removebg", addr), log)
}

#[tokio::test]
async fn sends_api_key_and_image_file_part() {
    let (endpoint, log) = spawn_fake_service().await;
    let client = RemoveBgClient::new(endpoint, "good-key".into());

    let source = png_bytes(3, 3);
    let out = client
        .remove_background_bytes("cat.png", "image/png", source.clone())
        .await
        .unwrap();
    assert_eq!(out, png_bytes(2, 2));

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].api_key.as_deref(), Some("good-key"));
    assert_eq!(log[0].field, "image_file");
    assert_eq!(log[0].file_name.as_deref(), Some("cat.png"));
    assert_eq!(log[0].content_type.as_deref(), Some("image/png"));
    assert_eq!(log[0].size, source.len());
}

#[tokio::test]
async fn error_title_becomes_transfer_error() {
    let (endpoint, _log) = spawn_fake_service().await;
    let client = RemoveBgClient::new(endpoint, "broke-key".into());
    let err = client
        .remove_background_bytes("cat.png", "image/png", png_bytes(1, 1))
        .await
        .unwrap_err();
    match err {
        AppError::Transfer(message) => assert_eq!(message, "Insufficient credits"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn unparseable_error_body_falls_back() {
    let (endpoint, _log) = spawn_fake_service().await;
    let client = RemoveBgClient::new(endpoint, "unknown-key".into());
    let err = client
        .remove_background_bytes("cat.png", "image/png", png_bytes(1, 1))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), TRANSFER_FAILED_MESSAGE);
}

#[tokio::test]
async fn empty_success_body_is_a_failure() {
    let (endpoint, _log) = spawn_fake_service().await;
    let client = RemoveBgClient::new(endpoint, "empty-key".into());
    let err = client
        .remove_background_bytes("cat.png", "image/png", png_bytes(1, 1))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), TRANSFER_FAILED_MESSAGE);
}

#[tokio::test]
async fn workflow_round_trip_through_http() {
    let (endpoint, _log) = spawn_fake_service().await;
    let workflow = ImageTransferWorkflow::new(Arc::new(RemoveBgClient::new(endpoint.clone(), "good-key".into())));
    workflow
        .accept_file(SelectedFile::from_bytes("cat.png", Some("image/png".into()), png_bytes(6, 6)))
        .await
        .unwrap();
    workflow.request_background_removal().await.unwrap();
    assert_eq!(workflow.status().await, WorkflowStatus::Completed);

    let failing = ImageTransferWorkflow::new(Arc::new(RemoveBgClient::new(endpoint, "broke-key".into())));
    failing
        .accept_file(SelectedFile::from_bytes("cat.png", Some("image/png".into()), png_bytes(6, 6)))
        .await
        .unwrap();
    assert!(failing.request_background_removal().await.is_err());
    let snapshot = failing.snapshot().await;
    assert_eq!(snapshot.error.as_deref(), Some("Insufficient credits"));
    assert_eq!(snapshot.status, WorkflowStatus::ImageLoaded);
}

#[tokio::test]
async fn unreachable_service_is_reported_generically() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = RemoveBgClient::new(format!("http://{}/v1.0/removebg", addr), "good-key".into());
    let workflow = ImageTransferWorkflow::new(Arc::new(client));
    workflow
        .accept_file(SelectedFile::from_bytes("cat.png", Some("image/png".into()), png_bytes(2, 2)))
        .await
        .unwrap();

    let err = workflow.request_background_removal().await.unwrap_err();
    assert!(matches!(err, AppError::HttpClient(_)));
    assert_eq!(workflow.snapshot().await.error.as_deref(), Some(TRANSFER_FAILED_MESSAGE));
    assert_eq!(workflow.status().await, WorkflowStatus::ImageLoaded);
}
