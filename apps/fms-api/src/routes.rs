//! 路由定义
//!
//! 集中管理所有 API 路由，将路径映射到对应的 handlers。
//! 路由包括：
//! - 健康检查与指标：/health, /metrics
//! - 点位目录：/patrol/locations
//! - 巡检会话：/patrol/sessions/*
//! - 当前点位清单：/patrol/sessions/{id}/checklist/*
//! - 报表：/patrol/reports

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// 创建 API 路由
///
/// 返回包含所有 API 端点的 Router，由 `build_app` 同时挂载在 / 和 /api/ 下
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
        .route("/patrol/locations", get(list_locations))
        .route("/patrol/sessions", post(start_session))
        .route("/patrol/sessions/:session_id", get(get_session))
        .route("/patrol/sessions/:session_id/scan", post(scan_location))
        .route(
            "/patrol/sessions/:session_id/checklist",
            delete(discard_checklist),
        )
        .route(
            "/patrol/sessions/:session_id/checklist/checks",
            put(set_check),
        )
        .route(
            "/patrol/sessions/:session_id/checklist/notes",
            put(set_notes),
        )
        .route(
            "/patrol/sessions/:session_id/checklist/evidence",
            post(attach_evidence),
        )
        .route("/patrol/sessions/:session_id/submit", post(submit_check))
        .route("/patrol/sessions/:session_id/checks", get(list_session_checks))
        .route("/patrol/reports", get(get_report))
}
