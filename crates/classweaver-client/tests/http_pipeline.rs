//! End-to-end tests of the request pipeline against a stub backend.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use classweaver_client::http::AUTH_STORAGE_KEY;
use classweaver_client::{ApiClient, ClientConfig, RequestOptions};
use classweaver_core::WeaverError;
use classweaver_core::storage::{MemoryStorage, SessionStorage};

#[derive(Default)]
struct ServerState {
    csrf_hits: AtomicUsize,
    /// Recorded (path, headers) of every non-CSRF request.
    requests: Mutex<Vec<(String, HeaderMap)>>,
}

impl ServerState {
    fn recorded(&self) -> Vec<(String, HeaderMap)> {
        self.requests.lock().unwrap().clone()
    }
}

async fn csrf_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    state.csrf_hits.fetch_add(1, Ordering::SeqCst);
    (
        [(header::SET_COOKIE, "csrftoken=tok123; Path=/")],
        Json(json!({ "csrfToken": "tok123" })),
    )
}

async fn login_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state
        .requests
        .lock()
        .unwrap()
        .push(("/api/auth/login/".to_string(), headers));
    Json(json!({ "id": 1, "username": "ada" }))
}

async fn upload_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state
        .requests
        .lock()
        .unwrap()
        .push(("/api/kb/upload/".to_string(), headers));
    Json(json!({
        "docs_created": 1,
        "chunks": 4,
        "backend": "memory",
        "dim": 768,
        "documents": []
    }))
}

async fn spawn_server(app: axum::Router) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(addr)
}

fn client_for(addr: SocketAddr) -> Result<(ApiClient, Arc<MemoryStorage>)> {
    let storage = Arc::new(MemoryStorage::new());
    let config = ClientConfig::with_base(format!("http://{addr}"));
    let client = ApiClient::new(&config, storage.clone())?;
    Ok((client, storage))
}

#[tokio::test]
async fn error_body_detail_becomes_the_message() -> Result<()> {
    let app = axum::Router::new().route(
        "/api/jobs/:job_id/",
        get(|| async { (StatusCode::NOT_FOUND, Json(json!({ "detail": "no such job" }))) }),
    );
    let addr = spawn_server(app).await?;
    let (client, _storage) = client_for(addr)?;

    let err = client.get_job_status("missing").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "no such job");
    Ok(())
}

#[tokio::test]
async fn no_content_resolves_to_empty_result() -> Result<()> {
    let app = axum::Router::new().route("/api/ping/", get(|| async { StatusCode::NO_CONTENT }));
    let addr = spawn_server(app).await?;
    let (client, _storage) = client_for(addr)?;

    let result: Option<Value> = client.request("/api/ping/", RequestOptions::get()).await?;
    assert_eq!(result, None);
    Ok(())
}

#[tokio::test]
async fn unparsable_success_body_surfaces_raw_text() -> Result<()> {
    let app = axum::Router::new().route("/api/ping/", get(|| async { "not-json" }));
    let addr = spawn_server(app).await?;
    let (client, _storage) = client_for(addr)?;

    let err = client
        .request::<Value>("/api/ping/", RequestOptions::get())
        .await
        .unwrap_err();
    match err {
        WeaverError::InvalidBody { body } => assert_eq!(body, "not-json"),
        other => panic!("expected InvalidBody, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_surfaces_a_transport_error() -> Result<()> {
    // Bind and immediately drop a listener so the port is known-dead.
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    let (client, _storage) = client_for(addr)?;

    let err = client
        .request::<Value>("/api/ping/", RequestOptions::get())
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.status(), None);
    Ok(())
}

#[tokio::test]
async fn unauthorized_response_clears_persisted_snapshot() -> Result<()> {
    let app = axum::Router::new().route(
        "/api/auth/me/",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": "authentication required" })),
            )
        }),
    );
    let addr = spawn_server(app).await?;
    let (client, storage) = client_for(addr)?;
    storage.set_item(AUTH_STORAGE_KEY, r#"{"id":1,"username":"ada"}"#);

    let err = client.fetch_current_user().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(storage.get_item(AUTH_STORAGE_KEY), None);
    Ok(())
}

#[tokio::test]
async fn csrf_token_is_fetched_once_and_echoed_on_mutations() -> Result<()> {
    let state = Arc::new(ServerState::default());
    let app = axum::Router::new()
        .route("/api/auth/csrf/", get(csrf_handler))
        .route("/api/auth/login/", post(login_handler))
        .with_state(state.clone());
    let addr = spawn_server(app).await?;
    let (client, _storage) = client_for(addr)?;

    let request = classweaver_core::user::SignInRequest {
        username: "ada".to_string(),
        password: "secret".to_string(),
    };
    client.login(&request).await?;
    client.login(&request).await?;

    // Token endpoint hit only while the cookie was absent
    assert_eq!(state.csrf_hits.load(Ordering::SeqCst), 1);
    let recorded = state.recorded();
    assert_eq!(recorded.len(), 2);
    for (_, headers) in &recorded {
        assert_eq!(
            headers.get("x-csrftoken").and_then(|v| v.to_str().ok()),
            Some("tok123")
        );
        assert_eq!(
            headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok()),
            Some("zh-CN")
        );
    }
    Ok(())
}

#[tokio::test]
async fn failed_token_issuance_is_a_soft_failure() -> Result<()> {
    let state = Arc::new(ServerState::default());
    let app = axum::Router::new()
        .route(
            "/api/auth/csrf/",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route("/api/auth/login/", post(login_handler))
        .with_state(state.clone());
    let addr = spawn_server(app).await?;
    let (client, _storage) = client_for(addr)?;

    let request = classweaver_core::user::SignInRequest {
        username: "ada".to_string(),
        password: "secret".to_string(),
    };
    // The mutation proceeds without the header rather than aborting
    let user = client.login(&request).await?;
    assert_eq!(user.id, 1);

    let recorded = state.recorded();
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].1.get("x-csrftoken").is_none());
    Ok(())
}

#[tokio::test]
async fn multipart_uploads_let_the_transport_set_the_boundary() -> Result<()> {
    let state = Arc::new(ServerState::default());
    let app = axum::Router::new()
        .route("/api/auth/csrf/", get(csrf_handler))
        .route("/api/kb/upload/", post(upload_handler))
        .with_state(state.clone());
    let addr = spawn_server(app).await?;
    let (client, _storage) = client_for(addr)?;

    let uploaded = client
        .upload_knowledge(vec![("notes.txt".to_string(), b"cells".to_vec())], None)
        .await?;
    assert_eq!(uploaded.docs_created, 1);

    let recorded = state.recorded();
    let content_type = recorded[0]
        .1
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(
        content_type.starts_with("multipart/form-data; boundary="),
        "unexpected content type: {content_type}"
    );
    Ok(())
}
