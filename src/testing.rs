//! in-process stand-in for the upstream temperature service, for tests

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Request, State},
    http::header,
    middleware::{self, Next},
    response::Response,
    routing::{get, MethodRouter},
    Router,
};
use serde_json::json;

use crate::config::UpstreamConfig;
use crate::fetcher::DataFetcher;
use crate::series::{normalize, Series};

const ALL_READINGS: &str =
    r#"[{"time":"2024-01-01T00:00:00","value":20.1},{"time":"2024-01-01T01:00:00","value":20.5}]"#;

/// serve `router` on an ephemeral local port, returning its base url
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// a base url nobody is listening on
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn fetcher(base_url: &str) -> DataFetcher {
    DataFetcher::new(&UpstreamConfig {
        base_url: base_url.to_string(),
        timeout_seconds: 5,
    })
    .unwrap()
}

/// every endpoint answers like the real service does
pub fn healthy_upstream() -> Router {
    upstream_with_hourly(get(|| async {
        axum::Json(json!([
            {"time": "2024-01-01 00:00:00", "value": 20.3},
            {"time": "2024-01-01 01:00:00", "value": 20.7}
        ]))
    }))
}

/// healthy upstream whose `/hourly_average` is replaced
pub fn upstream_with_hourly(hourly: MethodRouter) -> Router {
    Router::new()
        .route("/current", get(|| async { "21.5\n" }))
        .route(
            "/all_readings",
            get(|| async { ([(header::CONTENT_TYPE, "application/json")], ALL_READINGS) }),
        )
        .route("/hourly_average", hourly)
        .route(
            "/daily_average",
            get(|| async { axum::Json(json!([{"time": "2024-01-01 00:00:00", "value": 20.4}])) }),
        )
}

/// paths requested from a stub, in arrival order
pub type RequestLog = Arc<Mutex<Vec<String>>>;

/// wrap `router` so every request path is appended to the returned log
pub fn recording(router: Router) -> (Router, RequestLog) {
    let log = RequestLog::default();
    let router = router.layer(middleware::from_fn_with_state(log.clone(), record_path));
    (router, log)
}

async fn record_path(State(log): State<RequestLog>, request: Request, next: Next) -> Response {
    log.lock().unwrap().push(request.uri().path().to_string());
    next.run(request).await
}

pub fn two_readings() -> Series {
    normalize(&serde_json::from_str::<serde_json::Value>(ALL_READINGS).unwrap()).unwrap()
}
