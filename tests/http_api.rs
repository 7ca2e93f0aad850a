//! Integration tests for the HTTP identify path
//!
//! Tests GET /identify responses and that slow drivers never hold up replies

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Semaphore};
use tower::ServiceExt;

use identify_pulse::core::{create_router, DeviceDriver, IdentifyPlugin, NoopDriver, PluginConfig, SelectorMapping};
use identify_pulse::error::DriverError;
use identify_pulse::types::{IdentifyRequest, StateKey};

/// Driver that blocks every identify until the test releases it
struct GatedDriver {
    started: mpsc::UnboundedSender<String>,
    gate: Semaphore,
    completed: AtomicUsize,
}

impl GatedDriver {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (started, rx) = mpsc::unbounded_channel();
        let driver = Arc::new(Self {
            started,
            gate: Semaphore::new(0),
            completed: AtomicUsize::new(0),
        });
        (driver, rx)
    }
}

#[async_trait]
impl DeviceDriver for GatedDriver {
    async fn identify(&self, selector: &str) -> Result<(), DriverError> {
        let _ = self.started.send(selector.to_string());
        let permit = self.gate.acquire().await.expect("gate closed");
        permit.forget();
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let length = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, length, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_identify_with_selector() {
    let app = create_router(Arc::new(NoopDriver));

    let (status, _, body) = get(app, "/identify?com=COM3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Blinking COM3");
}

#[tokio::test]
async fn test_identify_with_empty_selector() {
    let app = create_router(Arc::new(NoopDriver));

    let (status, _, body) = get(app, "/identify?com=").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Missing COM parameter");
}

#[tokio::test]
async fn test_identify_without_query() {
    let app = create_router(Arc::new(NoopDriver));

    let (status, _, body) = get(app.clone(), "/identify").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Missing COM parameter");

    let (_, _, body) = get(app, "/identify?port=COM3").await;
    assert_eq!(body, "Missing COM parameter");
}

#[tokio::test]
async fn test_missing_selector_never_reaches_driver() {
    let (driver, mut started) = GatedDriver::new();
    let app = create_router(driver.clone());

    get(app.clone(), "/identify?com=").await;
    get(app, "/identify").await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(started.try_recv().is_err());
}

#[tokio::test]
async fn test_selector_is_url_decoded() {
    let app = create_router(Arc::new(NoopDriver));

    let (_, _, body) = get(app, "/identify?com=%2Fdev%2FttyUSB0").await;

    assert_eq!(body, "Blinking /dev/ttyUSB0");
}

#[tokio::test]
async fn test_repeated_selector_uses_first_value() {
    let app = create_router(Arc::new(NoopDriver));

    let (status, _, body) = get(app.clone(), "/identify?com=COM3&com=COM4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Blinking COM3");

    let (status, _, body) = get(app.clone(), "/identify?com=COM3&com=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Blinking COM3");

    let (status, _, body) = get(app.clone(), "/identify?com=&com=COM4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Blinking COM4");

    let (status, _, body) = get(app, "/identify?com=&com=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Missing COM parameter");
}

#[tokio::test]
async fn test_odd_query_strings_never_reject() {
    let app = create_router(Arc::new(NoopDriver));

    for uri in ["/identify?com", "/identify?&&", "/identify?com=%FF", "/identify?=COM3", "/identify?com=a=b"] {
        let (status, _, body) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::OK, "uri {}", uri);
        assert!(
            body.starts_with("Blinking ") || body == "Missing COM parameter",
            "uri {} answered {:?}",
            uri,
            body
        );
    }
}

#[tokio::test]
async fn test_content_length_matches_body() {
    let app = create_router(Arc::new(NoopDriver));

    for uri in ["/identify?com=COM3", "/identify?com="] {
        let (_, length, body) = get(app.clone(), uri).await;
        assert_eq!(length, Some(body.len().to_string()), "uri {}", uri);
    }
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = create_router(Arc::new(NoopDriver));

    let (status, _, body) = get(app, "/blink?com=COM3").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_response_does_not_wait_for_driver() {
    let (driver, mut started) = GatedDriver::new();
    let app = create_router(driver.clone());

    // First identify blocks inside the driver
    let (_, _, body) = get(app.clone(), "/identify?com=COM3").await;
    assert_eq!(body, "Blinking COM3");
    assert_eq!(started.recv().await.as_deref(), Some("COM3"));

    // A second request is answered while the first is still in progress
    let (_, _, body) = get(app, "/identify?com=COM4").await;
    assert_eq!(body, "Blinking COM4");
    assert_eq!(started.recv().await.as_deref(), Some("COM4"));
    assert_eq!(driver.completed.load(Ordering::SeqCst), 0);

    driver.gate.add_permits(2);
    tokio::time::timeout(Duration::from_secs(5), async {
        while driver.completed.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("drivers did not finish");
}

/// Raw HTTP/1.1 GET over TCP, returns the full response text
async fn raw_get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, addr
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_plugin_listener_serves_concurrent_requests() {
    let (driver, mut started) = GatedDriver::new();
    let mut plugin = IdentifyPlugin::new(PluginConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        ..PluginConfig::default()
    })
    .with_driver(driver.clone());
    let addr = plugin.init().await.unwrap();

    let first = raw_get(addr, "/identify?com=COM3").await;
    assert!(first.starts_with("HTTP/1.1 200 OK"), "{}", first);
    assert!(first.ends_with("Blinking COM3"), "{}", first);
    assert_eq!(started.recv().await.as_deref(), Some("COM3"));

    let second = raw_get(addr, "/identify?com=COM5").await;
    assert!(second.ends_with("Blinking COM5"), "{}", second);
    assert_eq!(driver.completed.load(Ordering::SeqCst), 0);

    let missing = raw_get(addr, "/identify").await;
    assert!(missing.contains("content-length: 21"), "{}", missing);
    assert!(missing.ends_with("Missing COM parameter"), "{}", missing);

    driver.gate.add_permits(2);
    plugin.shutdown().await.unwrap();
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_mapped_selector_drives_sequencer() {
    let mapping: SelectorMapping = "COM3=5:2".parse().unwrap();
    let mut plugin = IdentifyPlugin::new(PluginConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        selectors: [mapping].into_iter().collect(),
        ..PluginConfig::default()
    });
    let addr = plugin.init().await.unwrap();
    let mut changes = plugin.bus().subscribe();

    let response = raw_get(addr, "/identify?com=COM3").await;
    assert!(response.ends_with("Blinking COM3"));

    // The mapped request shows up on the bus
    let target = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let change = changes.recv().await.unwrap();
            if change.key == StateKey::IdentifyTargetId {
                return change.value;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(target, IdentifyRequest::new(5, 2, 0).target_id);

    plugin.shutdown().await.unwrap();
}
