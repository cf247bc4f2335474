use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use aurora_nexus::api::create_router;
use aurora_nexus::auth::SessionStore;
use aurora_nexus::config::{AuthConfig, Config, NodeConfig, StorageBackend, StorageConfig};
use aurora_nexus::registry::FileRegistry;
use aurora_nexus::storage::{KeyValueStore, MemoryStore};
use aurora_nexus::AppState;

const BOUNDARY: &str = "nexus-test-boundary";

fn test_app() -> (Arc<AppState>, Router) {
    let config = Config {
        auth: AuthConfig {
            login_delay_ms: 0,
            ..AuthConfig::default()
        },
        node: NodeConfig {
            bind_address: "127.0.0.1:0".to_string(),
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            ..StorageConfig::default()
        },
        max_upload_size: 1024,
    };

    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let sessions = SessionStore::open(Arc::clone(&kv), &config.auth).unwrap();
    let files = FileRegistry::open(kv);
    let state = Arc::new(AppState {
        config,
        files,
        sessions,
    });
    let router = create_router(Arc::clone(&state));
    (state, router)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Multipart body with one `file` part per (filename, content type, bytes).
/// An empty content type leaves the part's Content-Type header out.
fn upload_request(token: &str, parts: &[(&str, &str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (filename, content_type, data) in parts {
        let mut head = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n"
        );
        if !content_type.is_empty() {
            head.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        head.push_str("\r\n");
        body.extend_from_slice(head.as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/files")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}

async fn login(router: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        router,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "username": username, "password": password }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn register(router: &Router, username: &str, password: &str) {
    let (status, body) = send(
        router,
        json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "username": username, "password": password, "confirm_password": password }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
}

#[tokio::test]
async fn test_health() {
    let (_state, router) = test_app();
    let (status, body) = send(&router, empty_request("GET", "/_internal/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_login_returns_token_and_redirect() {
    let (_state, router) = test_app();

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "username": "admin", "password": "admin123", "from": "/admin/users" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "admin");
    assert_eq!(body["data"]["role"], "admin");
    assert_eq!(body["data"]["redirect_to"], "/admin/users");
    assert!(body["data"]["token"].as_str().is_some());

    let (_, session) = send(&router, empty_request("GET", "/auth/session", None)).await;
    assert_eq!(session["data"]["is_authenticated"], true);
    assert_eq!(session["data"]["user"]["name"], "Aurora Admin");
}

#[tokio::test]
async fn test_login_failures_are_jsend_fail() {
    let (_state, router) = test_app();

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "username": "admin", "password": "wrong-password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");
    assert_eq!(
        body["data"]["message"],
        "We could not find an account with those credentials."
    );

    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "username": "a b", "password": "whatever" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_conflict() {
    let (_state, router) = test_app();
    register(&router, "jane", "secret1").await;

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "username": "JANE", "password": "secret1", "confirmPassword": "secret1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["data"]["message"], "That username is already taken.");
}

#[tokio::test]
async fn test_files_require_sign_in() {
    let (_state, router) = test_app();

    let (status, body) = send(&router, empty_request("GET", "/files", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["redirect"]["to"], "/login");
    assert_eq!(body["data"]["redirect"]["from"], "/files");

    let (status, _) = send(&router, empty_request("GET", "/files", Some("forged"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_members() {
    let (_state, router) = test_app();
    register(&router, "jane", "secret1").await;
    let token = login(&router, "jane", "secret1").await;

    let (status, body) = send(&router, empty_request("GET", "/admin/users", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["data"]["redirect"]["to"], "/dashboard");
    assert_eq!(body["data"]["redirect"]["from"], "/admin/users");
}

#[tokio::test]
async fn test_upload_search_and_stats() {
    let (_state, router) = test_app();
    register(&router, "jane", "secret1").await;
    let token = login(&router, "jane", "secret1").await;

    let hundred = [b'a'; 100];
    let fifty = [b'b'; 50];
    let (status, body) = send(
        &router,
        upload_request(
            &token,
            &[
                ("a.txt", "text/plain", &hundred[..]),
                ("a.txt", "text/plain", &hundred[..]),
                ("b.txt", "text/plain", &fifty[..]),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "upload failed: {body}");
    let created = body["data"].as_array().unwrap();
    assert_eq!(created.len(), 3);
    assert_eq!(created[0]["owner"], "jane");
    assert_eq!(created[0]["size_bytes"], 100);
    assert_eq!(created[0]["is_public"], false);

    let (status, body) = send(&router, empty_request("GET", "/files", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 3);
    assert_eq!(body["data"]["stats"]["totalOriginal"], 250);
    assert_eq!(body["data"]["stats"]["totalDeduplicated"], 150);
    assert_eq!(body["data"]["stats"]["savingsPercent"], 40);

    let (_, body) = send(
        &router,
        empty_request("GET", "/files?size_min=60", Some(&token)),
    )
    .await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["stats"]["savingsPercent"], 50);
}

#[tokio::test]
async fn test_upload_over_limit_rejected() {
    let (_state, router) = test_app();
    let token = login(&router, "admin", "admin123").await;

    let big = vec![0u8; 2048];
    let (status, _) = send(&router, upload_request(&token, &[("big.bin", "", &big[..])])).await;
    assert!(status == StatusCode::PAYLOAD_TOO_LARGE || status == StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_share_download_and_ownership() {
    let (state, router) = test_app();
    register(&router, "jane", "secret1").await;
    register(&router, "john", "secret1").await;

    let jane_token = login(&router, "jane", "secret1").await;
    let (_, body) = send(
        &router,
        upload_request(&jane_token, &[("notes.md", "", &b"# hi"[..])]),
    )
    .await;
    let id = body["data"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"][0]["mime_type"], "application/octet-stream");

    // Private: anonymous callers are sent to sign in
    let download = format!("/files/{id}/download");
    let (status, _) = send(&router, empty_request("POST", &download, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &router,
        empty_request("PUT", &format!("/files/{id}/share"), Some(&jane_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_public"], true);

    let (_, body) = send(&router, empty_request("GET", "/public/files", None)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Public: anyone may download
    let (status, body) = send(&router, empty_request("POST", &download, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["download_count"], 1);

    // Only one session is active at a time; john signing in replaces jane
    let john_token = login(&router, "john", "secret1").await;
    let (status, _) = send(
        &router,
        empty_request("DELETE", &format!("/files/{id}"), Some(&john_token)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(state.files.get(&id).is_some());

    let admin_token = login(&router, "admin", "admin123").await;
    let (status, _) = send(
        &router,
        empty_request("DELETE", &format!("/files/{id}"), Some(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(state.files.get(&id).is_none());
}

#[tokio::test]
async fn test_admin_user_management() {
    let (state, router) = test_app();
    register(&router, "jane", "secret1").await;
    let token = login(&router, "admin", "admin123").await;

    let (status, body) = send(&router, empty_request("GET", "/admin/users", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert!(body["data"][0].get("passwordHash").is_none());

    let (status, body) = send(
        &router,
        json_request(
            "PUT",
            "/admin/users/jane/role",
            Some(&token),
            json!({ "role": "admin" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "admin");

    let (status, _) = send(
        &router,
        empty_request("DELETE", "/admin/users/admin", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &router,
        empty_request("DELETE", "/admin/users/jane", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.sessions.users().len(), 1);

    let (status, _) = send(
        &router,
        empty_request("DELETE", "/admin/users/jane", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_overview_totals() {
    let (state, router) = test_app();
    let created = state.files.upload(
        "jane",
        &[
            aurora_nexus::storage::models::UploadFile::new("a.txt", 100, "text/plain"),
            aurora_nexus::storage::models::UploadFile::new("a.txt", 100, "text/plain"),
        ],
    );
    state.files.increment_download(&created[0].id);
    state.files.increment_download(&created[1].id);

    let token = login(&router, "admin", "admin123").await;
    let (status, body) = send(&router, empty_request("GET", "/admin/overview", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_count"], 1);
    assert_eq!(body["data"]["file_count"], 2);
    assert_eq!(body["data"]["downloads"], 2);
    assert_eq!(body["data"]["stats"]["totalSavings"], 100);
    assert_eq!(body["data"]["stats"]["savingsPercent"], 50);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let (_state, router) = test_app();
    let token = login(&router, "admin", "admin123").await;

    let (status, _) = send(&router, empty_request("POST", "/auth/logout", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&router, empty_request("GET", "/files", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_requires_session_token() {
    let (state, router) = test_app();
    let token = login(&router, "admin", "admin123").await;

    let (status, _) = send(&router, empty_request("POST", "/auth/logout", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&router, empty_request("POST", "/auth/logout", Some("stale"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(state.sessions.is_authenticated());

    let (status, _) = send(&router, empty_request("GET", "/files", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_without_session_is_noop() {
    let (state, router) = test_app();

    let (status, _) = send(&router, empty_request("POST", "/auth/logout", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!state.sessions.is_authenticated());
}

#[tokio::test]
async fn test_contact_validation() {
    let (_state, router) = test_app();

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/contact",
            None,
            json!({ "name": "Ada", "email": "ada@example", "message": "Hello" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["data"]["message"],
        "Let us know how to reach you with a valid email."
    );

    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/contact",
            None,
            json!({ "name": " ", "email": "ada@example.com", "message": "Hello" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/contact",
            None,
            json!({ "name": "Ada", "email": "ada@example.com", "message": "Hello" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
