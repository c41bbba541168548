use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::ToSocketAddrs;

use crate::snapshot::Collector;

/// Runs one poll and returns the snapshot as pretty-printed JSON.
async fn sysinfo(State(collector): State<Arc<Collector>>) -> Response {
    let snapshot = collector.poll().await;
    match serde_json::to_string_pretty(&snapshot) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(err) => {
            log::error!("failed to serialize snapshot: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to serialize snapshot",
            )
                .into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Builds the read-only HTTP routes.
pub fn router(collector: Arc<Collector>) -> axum::Router {
    axum::Router::new()
        .route("/sysinfo", get(sysinfo))
        .route("/health", get(health))
        .with_state(collector)
}

pub struct APIServer {
    router: axum::Router,
}

impl APIServer {
    pub fn new(collector: Arc<Collector>) -> Self {
        Self {
            router: router(collector),
        }
    }

    pub async fn listen(self, addr: impl ToSocketAddrs) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        log::info!("serving snapshots on http://{}", listener.local_addr()?);
        axum::serve(listener, self.router.into_make_service()).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::cgroup::StatReader;
    use crate::host::HostReader;
    use crate::process::{ProcFs, ProcessScanner};
    use crate::snapshot::CollectorOptions;
    use crate::testutil::FakeHost;

    fn app(host: &FakeHost) -> axum::Router {
        router(Arc::new(Collector::new(
            Arc::new(ProcFs::new(host.proc_root())),
            HostReader::new(host.proc_root()),
            ProcessScanner::new("stress"),
            StatReader::new(host.cgroup_root(), "system.slice", Duration::from_secs(5)),
            CollectorOptions::default(),
        )))
    }

    async fn get_body(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_sysinfo_returns_document() {
        let host = FakeHost::new();
        host.set_meminfo(2 * 1024 * 1024, 1024 * 1024);
        host.set_proc_stat(1, 0, 1, 2);
        host.add_process(10, 1, "stress", "stress\0--cpu\01\0", Some("abc"));
        host.add_process(11, 10, "stress", "stress\0--cpu\01\0", Some("abc"));
        host.set_container_stats("abc", 1024 * 1024, 1, "");

        let (status, body) = get_body(app(&host), "/sysinfo").await;

        assert_eq!(status, StatusCode::OK);
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(doc["Memory"]["Total_Memory_MB"], 2048);
        assert_eq!(doc["Memory"]["Used_Memory_MB"], 1024);
        assert_eq!(doc["Memory"]["CPU_Usage_Percentage"].as_f64(), Some(50.0));
        let containers = doc["Docker_Containers"].as_array().unwrap();
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0]["PID"], 10);
        assert_eq!(containers[0]["ContainerID"], "abc");
        assert_eq!(containers[0]["MemoryUsage_MB"].as_f64(), Some(1.0));
    }

    #[tokio::test]
    async fn test_sysinfo_without_containers() {
        let host = FakeHost::new();

        let (status, body) = get_body(app(&host), "/sysinfo").await;

        assert_eq!(status, StatusCode::OK);
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(doc["Docker_Containers"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_health() {
        let host = FakeHost::new();
        let (status, body) = get_body(app(&host), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn test_no_write_routes() {
        let host = FakeHost::new();
        let response = app(&host)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sysinfo")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
