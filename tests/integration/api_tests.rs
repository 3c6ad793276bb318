//! API integration tests
//!
//! The catalog and records APIs are replaced by small local axum servers so
//! the whole scan path runs over real HTTP.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, Request, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::ServiceExt;

use shelfscan::{
    api::create_router,
    config::{AppConfig, CatalogConfig, RecordsConfig},
    models::{
        book::{BookRecord, Isbn},
        capture::ReaderSupport,
    },
    services::{
        catalog::{CatalogClient, LookupOutcome, OpenLibraryClient},
        records::{LocalRecordsClient, RecordsClient, SyncOutcome},
        Services,
    },
    AppState,
};

const KNOWN_ISBN: &str = "9781839762123";

#[derive(Clone, Default)]
struct Recorded {
    added: Arc<Mutex<Vec<Value>>>,
    removed: Arc<Mutex<Vec<String>>>,
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("fake server");
    });
    addr
}

async fn search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    if params.get("isbn").map(String::as_str) == Some(KNOWN_ISBN) {
        Json(json!({
            "numFound": 1,
            "docs": [{
                "title": "Mutual Aid: A Factor in Evolution",
                "author_name": ["Peter Kropotkin"],
                "first_publish_year": 1902,
                "isbn": [KNOWN_ISBN, "1839762128"]
            }]
        }))
    } else {
        Json(json!({ "numFound": 0, "docs": [] }))
    }
}

async fn fake_catalog() -> String {
    let addr = serve(Router::new().route("/search.json", get(search))).await;
    format!("http://{}", addr)
}

async fn fake_records() -> (String, Recorded) {
    async fn add(State(rec): State<Recorded>, Json(body): Json<Value>) -> StatusCode {
        rec.added.lock().await.push(body);
        StatusCode::CREATED
    }

    async fn remove(State(rec): State<Recorded>, Path(isbn): Path<String>) -> StatusCode {
        rec.removed.lock().await.push(isbn);
        StatusCode::OK
    }

    let recorded = Recorded::default();
    let router = Router::new()
        .route("/", post(add))
        .route("/:isbn", post(remove))
        .with_state(recorded.clone());
    let addr = serve(router).await;
    (format!("http://{}", addr), recorded)
}

/// An address nothing listens on
async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}", addr)
}

fn record() -> BookRecord {
    serde_json::from_value(json!({
        "isbn": KNOWN_ISBN,
        "title": "Mutual Aid: A Factor in Evolution",
        "authors": "Peter Kropotkin",
        "first_publish_date": "1902",
        "count": 1,
        "dateAdded": "2024-01-02T03:04:05Z",
        "dateModified": "2024-01-02T03:04:05Z"
    }))
    .expect("record")
}

async fn test_config(continue_scanning: bool) -> (AppConfig, Recorded) {
    let (records_url, recorded) = fake_records().await;
    let mut config = AppConfig::default();
    config.catalog.base_url = fake_catalog().await;
    config.catalog.timeout_secs = Some(5);
    config.records.base_url = records_url;
    config.scanner.interval_ms = 50;
    config.scanner.continue_scanning = continue_scanning;
    (config, recorded)
}

async fn app(config: AppConfig) -> (Router, AppState) {
    let services = Services::new(&config).expect("services");
    let state = AppState::new(config, services);
    state.session.initialize().await;
    (create_router(state.clone()), state)
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn play(router: &Router) -> Value {
    let (status, body) = send(
        router,
        "POST",
        "/api/v1/capture/play",
        Some(json!({
            "settings": { "torch": false, "zoom": 1.0 },
            "capabilities": { "torch": true, "zoom": { "min": 1.0, "max": 4.0 } },
            "devices": [
                { "device_id": "cam-front", "label": "Front" },
                { "device_id": "cam-back", "label": "" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

async fn push(router: &Router, raw_value: &str) -> bool {
    let (status, body) = send(
        router,
        "POST",
        "/api/v1/capture/frames",
        Some(json!({ "raw_value": raw_value, "format": "ean_13" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    body["accepted"].as_bool().unwrap_or(false)
}

/// Poll the inventory until `check` holds or five seconds pass
async fn wait_for_inventory(router: &Router, check: impl Fn(&Value) -> bool) -> Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let (_, body) = send(router, "GET", "/api/v1/inventory", None).await;
        if check(&body) {
            return body;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "inventory never reached expected state: {}",
            body
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

#[tokio::test]
async fn test_catalog_client_found() {
    let config = CatalogConfig {
        base_url: fake_catalog().await,
        timeout_secs: Some(5),
    };
    let client = OpenLibraryClient::new(&config).unwrap();

    match client.fetch_book(&Isbn::new(KNOWN_ISBN)).await {
        LookupOutcome::Found(doc) => {
            assert_eq!(doc.isbn, Some(Isbn::new(KNOWN_ISBN)));
            assert_eq!(doc.author_name, Some(vec!["Peter Kropotkin".to_string()]));
            assert_eq!(doc.first_publish_year, Some(1902));
        }
        other => panic!("expected a match, got {:?}", other),
    }
}

#[tokio::test]
async fn test_catalog_client_not_found() {
    let config = CatalogConfig {
        base_url: fake_catalog().await,
        timeout_secs: Some(5),
    };
    let client = OpenLibraryClient::new(&config).unwrap();

    let outcome = client.fetch_book(&Isbn::new("0000000000000")).await;
    assert!(matches!(outcome, LookupOutcome::NotFound));
}

#[tokio::test]
async fn test_catalog_client_network_error_is_a_value() {
    let config = CatalogConfig {
        base_url: closed_port().await,
        timeout_secs: Some(2),
    };
    let client = OpenLibraryClient::new(&config).unwrap();

    let outcome = client.fetch_book(&Isbn::new(KNOWN_ISBN)).await;
    assert!(matches!(outcome, LookupOutcome::Failed(_)));
}

#[tokio::test]
async fn test_records_client_posts_camel_case_record() {
    let (base_url, recorded) = fake_records().await;
    let client = LocalRecordsClient::new(&RecordsConfig {
        base_url,
        sync_on_scan: false,
    })
    .unwrap();

    assert_eq!(client.add_book(&record()).await, SyncOutcome::Stored);
    assert_eq!(client.remove_book(&record()).await, SyncOutcome::Stored);

    let added = recorded.added.lock().await;
    assert_eq!(added.len(), 1);
    assert_eq!(added[0]["isbn"], KNOWN_ISBN);
    assert_eq!(added[0]["authors"], "Peter Kropotkin");
    assert!(added[0].get("dateAdded").is_some());
    assert!(added[0].get("dateModified").is_some());
    assert_eq!(*recorded.removed.lock().await, vec![KNOWN_ISBN.to_string()]);
}

#[tokio::test]
async fn test_records_client_encodes_isbn_in_path() {
    let (base_url, recorded) = fake_records().await;
    let client = LocalRecordsClient::new(&RecordsConfig {
        base_url,
        sync_on_scan: false,
    })
    .unwrap();

    let mut odd = record();
    odd.isbn = Isbn::new("ABC#123");
    assert_eq!(client.remove_book(&odd).await, SyncOutcome::Stored);

    odd.isbn = Isbn::new("A/B?c=1");
    assert_eq!(client.remove_book(&odd).await, SyncOutcome::Stored);

    assert_eq!(
        *recorded.removed.lock().await,
        vec!["ABC#123".to_string(), "A/B?c=1".to_string()]
    );
}

#[tokio::test]
async fn test_records_client_failure_is_a_value() {
    let client = LocalRecordsClient::new(&RecordsConfig {
        base_url: closed_port().await,
        sync_on_scan: false,
    })
    .unwrap();

    assert!(!client.add_book(&record()).await.is_stored());
}

#[tokio::test]
async fn test_health_and_ready() {
    let (config, _) = test_config(false).await;
    let (router, _) = app(config).await;

    let (status, body) = send(&router, "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&router, "GET", "/api/v1/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_unsupported_reader_blocks_scanning() {
    let (mut config, _) = test_config(false).await;
    config.scanner.formats.clear();
    let services = Services::new(&config).unwrap();
    let state = AppState::new(config, services);
    assert!(matches!(
        state.session.initialize().await,
        ReaderSupport::Unsupported { .. }
    ));
    let router = create_router(state);

    let (status, _) = send(&router, "GET", "/api/v1/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = send(&router, "POST", "/api/v1/capture/play", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = send(&router, "GET", "/api/v1/session", None).await;
    assert_eq!(body["reader_supported"], false);
    assert_eq!(body["view"]["global_actions_visible"], false);
    assert_eq!(body["view"]["alert"]["persistent"], true);
}

#[tokio::test]
async fn test_frames_dropped_before_play() {
    let (config, _) = test_config(false).await;
    let (router, _) = app(config).await;

    assert!(!push(&router, KNOWN_ISBN).await);
}

#[tokio::test]
async fn test_frames_need_an_enabled_format() {
    let (config, _) = test_config(false).await;
    let (router, _) = app(config).await;
    play(&router).await;

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/capture/frames",
        Some(json!({ "raw_value": KNOWN_ISBN })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/capture/frames",
        Some(json!({ "raw_value": "https://example.org", "format": "qr_code" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["accepted"], false);

    let (status, body) = send(&router, "POST", "/api/v1/capture/frames", Some(json!({}))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["accepted"], true);
}

#[tokio::test]
async fn test_play_exposes_controls() {
    let (config, _) = test_config(false).await;
    let (router, _) = app(config).await;

    let body = play(&router).await;
    let view = &body["view"];
    assert_eq!(view["scan_frame_visible"], true);
    assert_eq!(view["torch_button_visible"], true);
    assert_eq!(view["camera_select_visible"], true);
    assert_eq!(view["zoom"]["min"], 1.0);
    assert_eq!(view["zoom"]["max"], 4.0);
    assert_eq!(view["cameras"][1]["label"], "Camera 2");

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/capture/zoom",
        Some(json!({ "action": "in" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"]["zoom"]["current"], 1.5);

    let (status, body) = send(&router, "POST", "/api/v1/capture/torch", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"]["torch_on"], true);
}

#[tokio::test]
async fn test_scan_adds_and_increments() {
    let (config, _) = test_config(true).await;
    let (router, _) = app(config).await;
    play(&router).await;

    assert!(push(&router, KNOWN_ISBN).await);
    let body = wait_for_inventory(&router, |b| b["titles"] == 1).await;
    let first = &body["records"][0];
    assert_eq!(first["isbn"], KNOWN_ISBN);
    assert_eq!(first["authors"], "Peter Kropotkin");
    assert_eq!(first["first_publish_date"], "1902");
    assert_eq!(first["count"], 1);

    assert!(push(&router, KNOWN_ISBN).await);
    let body = wait_for_inventory(&router, |b| b["copies"] == 2).await;
    assert_eq!(body["titles"], 1);
    assert_eq!(body["records"][0]["count"], 2);

    let (status, body) = send(
        &router,
        "GET",
        &format!("/api/v1/inventory/{}", KNOWN_ISBN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn test_unknown_isbn_leaves_inventory_empty() {
    let (config, _) = test_config(true).await;
    let (router, state) = app(config).await;
    let mut events = state.session.services().events.subscribe();
    play(&router).await;

    assert!(push(&router, "0000000000000").await);
    let event = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event) if event.name() == "lookup-failed" => return event,
                Ok(_) => continue,
                Err(e) => panic!("event bus closed: {}", e),
            }
        }
    })
    .await
    .expect("lookup-failed event");
    assert_eq!(event.name(), "lookup-failed");

    let (_, body) = send(&router, "GET", "/api/v1/inventory", None).await;
    assert_eq!(body["titles"], 0);
}

#[tokio::test]
async fn test_single_shot_shows_scan_button() {
    let (config, _) = test_config(false).await;
    let (router, _) = app(config).await;
    play(&router).await;

    assert!(push(&router, KNOWN_ISBN).await);
    wait_for_inventory(&router, |b| b["titles"] == 1).await;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let (_, body) = send(&router, "GET", "/api/v1/session", None).await;
        if body["view"]["scan_button_visible"] == true {
            assert_eq!(body["scan_state"], "idle");
            assert_eq!(body["view"]["scan_frame_visible"], false);
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "scan button never shown");
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/session/keys",
        Some(json!({ "key": "Escape" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"]["scan_button_visible"], false);
    assert_eq!(body["view"]["scan_frame_visible"], true);
}

#[tokio::test]
async fn test_sync_on_scan_posts_new_records() {
    let (mut config, recorded) = test_config(false).await;
    config.records.sync_on_scan = true;
    let (router, _) = app(config).await;
    play(&router).await;

    assert!(push(&router, KNOWN_ISBN).await);
    wait_for_inventory(&router, |b| b["titles"] == 1).await;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while recorded.added.lock().await.is_empty() {
        assert!(tokio::time::Instant::now() < deadline, "record never posted");
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert_eq!(recorded.added.lock().await[0]["isbn"], KNOWN_ISBN);
}

#[tokio::test]
async fn test_remove_and_missing_record() {
    let (config, recorded) = test_config(true).await;
    let (router, _) = app(config).await;
    play(&router).await;

    let uri = format!("/api/v1/inventory/{}", KNOWN_ISBN);
    let (status, body) = send(&router, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchRecord");

    assert!(push(&router, KNOWN_ISBN).await);
    wait_for_inventory(&router, |b| b["titles"] == 1).await;

    let (status, body) = send(&router, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["synced"], true);
    assert_eq!(body["record"]["isbn"], KNOWN_ISBN);
    assert_eq!(*recorded.removed.lock().await, vec![KNOWN_ISBN.to_string()]);

    let (status, _) = send(&router, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_export_is_a_json_download() {
    let (config, _) = test_config(true).await;
    let (router, _) = app(config).await;
    play(&router).await;
    assert!(push(&router, KNOWN_ISBN).await);
    wait_for_inventory(&router, |b| b["titles"] == 1).await;

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/inventory/export")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    assert_eq!(
        disposition.as_deref(),
        Some("attachment; filename=\"inventory.json\"")
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let exported: Vec<BookRecord> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(exported.len(), 1);
    assert_eq!(exported[0].isbn.as_str(), KNOWN_ISBN);
}

#[tokio::test]
async fn test_settings_validation() {
    let (config, _) = test_config(false).await;
    let (router, _) = app(config).await;

    let (status, body) = send(&router, "GET", "/api/v1/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["interval_ms"], 50);

    let (status, _) = send(
        &router,
        "PUT",
        "/api/v1/settings",
        Some(json!({ "interval_ms": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &router,
        "PUT",
        "/api/v1/settings",
        Some(json!({ "interval_ms": 250, "continue_scanning": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["interval_ms"], 250);
    assert_eq!(body["continue_scanning"], true);
}

#[tokio::test]
async fn test_capture_permission_error() {
    let (config, _) = test_config(false).await;
    let (router, _) = app(config).await;

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/capture/error",
        Some(json!({ "name": "NotAllowedError", "message": "Permission denied" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"]["scan_frame_visible"], false);
    assert_eq!(body["view"]["alert"]["variant"], "danger");
}

#[tokio::test]
async fn test_openapi_document() {
    let (config, _) = test_config(false).await;
    let (router, _) = app(config).await;

    let (status, body) = send(&router, "GET", "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/inventory"].is_object());
}
