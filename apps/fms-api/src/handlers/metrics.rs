//! 巡检计数指标快照。
//!
//! - GET /metrics

use api_contract::ApiResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fms_telemetry::metrics;

use crate::utils::metrics_to_dto;

pub async fn get_metrics() -> Response {
    let snapshot = metrics().snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(metrics_to_dto(snapshot))),
    )
        .into_response()
}
