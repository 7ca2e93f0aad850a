//! HTTP control surface for identify
//!
//! Endpoints:
//! - GET /identify?com={selector} - Blink the device behind a selector
//!
//! Anything else answers 404 with an empty body.

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::driver::DeviceDriver;

/// Body sent when the selector is absent or empty
pub const MISSING_SELECTOR_BODY: &str = "Missing COM parameter";

/// Route served by the listener
pub const IDENTIFY_ROUTE: &str = "/identify";

/// App state
#[derive(Clone)]
pub struct ApiState {
    pub driver: Arc<dyn DeviceDriver>,
}

/// Pick the selector out of decoded query pairs
///
/// `com` may repeat; the first non-empty value wins. `None` when every `com`
/// value is empty or the key is absent.
fn selector_from_query(pairs: &[(String, String)]) -> Option<&str> {
    pairs
        .iter()
        .filter(|(key, _)| key == "com")
        .map(|(_, value)| value.as_str())
        .find(|value| !value.is_empty())
}

/// Create the API router
pub fn create_router(driver: Arc<dyn DeviceDriver>) -> Router {
    Router::new()
        .route(IDENTIFY_ROUTE, get(identify))
        .with_state(ApiState { driver })
}

/// Identify endpoint
///
/// Both outcomes are `200 OK` plain text; callers tell them apart by body.
/// The driver call is spawned, so the response never waits on the device.
async fn identify(
    State(state): State<ApiState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> String {
    let selector = match selector_from_query(&pairs) {
        Some(com) => com.to_string(),
        None => {
            debug!("identify request without selector");
            return MISSING_SELECTOR_BODY.to_string();
        }
    };

    let driver = state.driver.clone();
    let task_selector = selector.clone();
    tokio::spawn(async move {
        if let Err(e) = driver.identify(&task_selector).await {
            warn!(selector = %task_selector, error = %e, "identify failed");
        }
    });

    format!("Blinking {}", selector)
}

/// Serve `router` on an already-bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("identify API listening on http://{}", addr);
        info!("  GET  {}?com=<selector> - Blink device", IDENTIFY_ROUTE);
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("identify API stopped");
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_selector_first_non_empty_com_wins() {
        assert_eq!(selector_from_query(&pairs(&[("com", "COM3"), ("com", "COM4")])), Some("COM3"));
        assert_eq!(selector_from_query(&pairs(&[("com", ""), ("com", "COM4")])), Some("COM4"));
        assert_eq!(selector_from_query(&pairs(&[("port", "COM9"), ("com", "COM3")])), Some("COM3"));
    }

    #[test]
    fn test_selector_missing_or_empty() {
        assert_eq!(selector_from_query(&[]), None);
        assert_eq!(selector_from_query(&pairs(&[("com", "")])), None);
        assert_eq!(selector_from_query(&pairs(&[("com", ""), ("com", "")])), None);
        assert_eq!(selector_from_query(&pairs(&[("COM", "COM3")])), None);
    }
}
