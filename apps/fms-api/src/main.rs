//! 巡检 HTTP API：会话、扫码、清单、取证、提交与报表。

mod handlers;
mod middleware;
mod routes;
mod utils;

use axum::{Router, extract::DefaultBodyLimit, middleware::from_fn};
use fms_config::AppConfig;
use fms_patrol::{LocationRegistry, PatrolService, PatrolServiceConfig, RepeatScanPolicy};
use fms_storage::{InMemoryPatrolStore, PatrolStore, PgPatrolStore};
use fms_telemetry::init_tracing;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::middleware::request_context;
use crate::routes::create_api_router;

#[derive(Clone)]
pub struct AppState {
    pub patrol: Arc<PatrolService>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    let registry = Arc::new(load_registry(config.patrol_locations_file.as_deref()).await?);
    let store: Arc<dyn PatrolStore> = match config.database_url.as_deref() {
        // Postgres 存储（需先执行 migrations）
        Some(database_url) => Arc::new(PgPatrolStore::connect(database_url).await?),
        None => {
            warn!(target: "fms.api", "database url not set, patrol records kept in memory");
            Arc::new(InMemoryPatrolStore::new())
        }
    };
    let patrol = Arc::new(PatrolService::new_with_config(
        registry.clone(),
        store,
        patrol_config(&config),
    ));
    let body_limit = request_body_limit(config.evidence_max_bytes);
    let app = build_app(AppState { patrol }, body_limit);

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(
        target: "fms.api",
        http_addr = %config.http_addr,
        locations = registry.len(),
        count_repeat_scans = config.patrol_count_repeat_scans,
        body_limit,
        "http_listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

/// 单次取证请求最多携带的满尺寸图片数
const EVIDENCE_FILES_PER_REQUEST: u64 = 4;
/// JSON 字段与 data URI 前缀的余量
const BODY_HEADROOM_BYTES: u64 = 64 * 1024;

/// 请求体上限：按单张图片上限的 base64 长度计算。
fn request_body_limit(evidence_max_bytes: u64) -> usize {
    let encoded = evidence_max_bytes.div_ceil(3).saturating_mul(4);
    let limit = encoded
        .saturating_mul(EVIDENCE_FILES_PER_REQUEST)
        .saturating_add(BODY_HEADROOM_BYTES);
    usize::try_from(limit).unwrap_or(usize::MAX)
}

/// 组装路由：同时挂载在 `/` 与 `/api` 下。
pub fn build_app(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .merge(create_api_router())
        .nest("/api", create_api_router())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 注入 request_id/trace_id
        .layer(from_fn(request_context))
}

/// 点位目录：配置了文件则从 JSON 加载，否则使用内置目录。
async fn load_registry(path: Option<&str>) -> Result<LocationRegistry, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let json = tokio::fs::read_to_string(path).await?;
            let registry = LocationRegistry::from_json_str(&json)?;
            info!(target: "fms.api", path = %path, locations = registry.len(), "patrol_catalog_loaded");
            Ok(registry)
        }
        None => Ok(LocationRegistry::default_catalog()),
    }
}

fn patrol_config(config: &AppConfig) -> PatrolServiceConfig {
    let repeat_scan_policy = if config.patrol_count_repeat_scans {
        RepeatScanPolicy::CountEveryCheck
    } else {
        RepeatScanPolicy::CountEachLocationOnce
    };
    PatrolServiceConfig {
        repeat_scan_policy,
        geolocation_timeout: Duration::from_millis(config.geolocation_timeout_ms),
        evidence_max_bytes: config.evidence_max_bytes,
        completed_retention: config.patrol_completed_retention,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app_with_limit(evidence_max_bytes: u64) -> Router {
        let patrol = PatrolService::new_with_config(
            Arc::new(LocationRegistry::default_catalog()),
            Arc::new(InMemoryPatrolStore::new()),
            PatrolServiceConfig {
                evidence_max_bytes,
                ..PatrolServiceConfig::default()
            },
        );
        build_app(
            AppState {
                patrol: Arc::new(patrol),
            },
            request_body_limit(evidence_max_bytes),
        )
    }

    fn app() -> Router {
        app_with_limit(PatrolServiceConfig::default().evidence_max_bytes)
    }

    async fn scanned_session(app: &Router, code: &str) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/patrol/sessions",
            Some(json!({ "department": "security" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let session_id = body["data"]["sessionId"].as_str().expect("session id").to_string();
        let (status, _) = call(
            app,
            Method::POST,
            &format!("/patrol/sessions/{session_id}/scan"),
            Some(json!({ "code": code })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        session_id
    }

    /// 全 `A` 的 base64 串解码为 `raw_len` 个零字节
    fn jpeg_data_uri(raw_len: usize) -> String {
        format!("data:image/jpeg;base64,{}", "A".repeat(raw_len.div_ceil(3) * 4))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-tenant-id", "tenant-1")
            .header("x-operator-id", "op1");
        let body = match body {
            Some(body) => {
                builder = builder.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_sets_trace_headers() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("x-trace-id"));
    }

    #[tokio::test]
    async fn patrol_routes_require_identity() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/patrol/locations")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn security_patrol_over_http() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/patrol/locations?department=security", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/patrol/sessions",
            Some(json!({ "department": "security" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalLocations"], 2);
        let session_id = body["data"]["sessionId"].as_str().expect("session id").to_string();
        let base = format!("/api/patrol/sessions/{session_id}");

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("{base}/scan"),
            Some(json!({ "code": "LOB-001" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "PATROL.DEPARTMENT_MISMATCH");

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("{base}/scan"),
            Some(json!({ "code": "NOPE" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "PATROL.UNKNOWN_LOCATION");

        for code in ["ENT-001", "PRK-B01"] {
            let (status, body) = call(
                &app,
                Method::POST,
                &format!("{base}/scan"),
                Some(json!({ "code": code })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            let names: Vec<String> = body["data"]["items"]
                .as_array()
                .expect("items")
                .iter()
                .filter_map(|item| item["name"].as_str().map(str::to_string))
                .collect();

            let (status, body) = call(&app, Method::POST, &format!("{base}/submit"), Some(json!({}))).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body["error"]["code"], "PATROL.INCOMPLETE_CHECKLIST");

            for name in names {
                let (status, _) = call(
                    &app,
                    Method::PUT,
                    &format!("{base}/checklist/checks"),
                    Some(json!({ "name": name, "done": true })),
                )
                .await;
                assert_eq!(status, StatusCode::OK);
            }
            let (status, body) = call(
                &app,
                Method::POST,
                &format!("{base}/checklist/evidence"),
                Some(json!({ "files": [
                    { "fileName": "a.jpg", "contentType": "image/jpeg", "data": "https://cdn.example.com/a.jpg" },
                    { "fileName": "a.txt", "contentType": "text/plain", "data": "aGVsbG8=" }
                ] })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["accepted"], 1);
            assert_eq!(body["data"]["skipped"], 1);
            assert_eq!(body["data"]["checklist"]["readyToSubmit"], true);

            let (status, body) = call(
                &app,
                Method::POST,
                &format!("{base}/submit"),
                Some(json!({ "coordinates": { "lat": 31.2, "lng": 121.5 } })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["check"]["locationCode"], code);
        }

        let (status, body) = call(&app, Method::GET, &base, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["session"]["status"], "completed");
        assert_eq!(body["data"]["session"]["progressPercentage"], 100.0);

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("{base}/scan"),
            Some(json!({ "code": "ENT-001" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "PATROL.SESSION_NOT_ACTIVE");

        let (status, body) = call(&app, Method::GET, &format!("{base}/checks"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

        let (status, body) = call(&app, Method::GET, "/patrol/reports?department=security", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["sessionsCompleted"], 1);
        assert_eq!(body["data"]["checksRecorded"], 2);
        assert_eq!(body["data"]["checksWithCoordinatesPercentage"], 100.0);
    }

    #[tokio::test]
    async fn evidence_accepts_image_under_configured_limit() {
        let app = app();
        let session_id = scanned_session(&app, "ENT-001").await;
        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/patrol/sessions/{session_id}/checklist/evidence"),
            Some(json!({ "files": [
                { "fileName": "door.jpg", "contentType": "image/jpeg", "data": jpeg_data_uri(1_800_000) }
            ] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["accepted"], 1);
        assert_eq!(body["data"]["skipped"], 0);
    }

    #[tokio::test]
    async fn oversized_body_rejected_with_envelope() {
        let app = app_with_limit(1_024);
        let session_id = scanned_session(&app, "ENT-001").await;
        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/patrol/sessions/{session_id}/checklist/evidence"),
            Some(json!({ "files": [
                { "contentType": "image/jpeg", "data": jpeg_data_uri(200_000) }
            ] })),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "REQUEST.TOO_LARGE");
    }

    #[tokio::test]
    async fn malformed_body_rejected_with_envelope() {
        let app = app();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/patrol/sessions")
                    .header("x-tenant-id", "tenant-1")
                    .header("x-operator-id", "op1")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"department\":"))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let body: Value = serde_json::from_slice(&bytes).expect("json envelope");
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "INVALID.REQUEST");

        let (status, body) = call(&app, Method::POST, "/patrol/sessions", None).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "INVALID.REQUEST");
    }

    #[test]
    fn body_limit_covers_encoded_images() {
        let limit = request_body_limit(5 * 1024 * 1024);
        assert!(limit > 4 * (5 * 1024 * 1024 / 3 * 4));
        assert_eq!(request_body_limit(3), 4 * 4 + 64 * 1024);
    }

    #[tokio::test]
    async fn unknown_department_is_bad_request() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/patrol/sessions",
            Some(json!({ "department": "catering" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID.REQUEST");
        let (status, _) = call(&app, Method::GET, "/patrol/sessions/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
