//! 巡检 handlers
//!
//! - GET /patrol/locations?department= - 点位目录
//! - POST /patrol/sessions - 开始巡检
//! - GET /patrol/sessions/{id} - 会话详情（进度 + 当前清单）
//! - POST /patrol/sessions/{id}/scan - 扫码并初始化清单
//! - PUT /patrol/sessions/{id}/checklist/checks - 设置检查项
//! - PUT /patrol/sessions/{id}/checklist/notes - 设置备注
//! - POST /patrol/sessions/{id}/checklist/evidence - 附加取证图片
//! - DELETE /patrol/sessions/{id}/checklist - 丢弃当前清单
//! - POST /patrol/sessions/{id}/submit - 提交点位检查
//! - GET /patrol/sessions/{id}/checks - 已持久化的检查记录
//! - GET /patrol/reports?department= - 巡检报表
//!
//! 所有接口需要 `x-tenant-id` 与 `x-operator-id` 请求头

use crate::AppState;
use crate::middleware::require_operator_context;
use crate::utils::response::{json_rejection_error, not_found_error, patrol_error};
use crate::utils::{
    check_record_to_dto, check_to_dto, checklist_to_dto, location_to_dto, normalize_required,
    parse_department, parse_department_filter, report_to_dto, session_to_dto,
};
use api_contract::{
    ApiResponse, AttachEvidenceRequest, DiscardChecklistDto, EvidenceOutcomeDto, LocationCheckDto,
    LocationDto, ScanRequest, SessionDetailDto, SetCheckRequest, SetNotesRequest,
    StartPatrolRequest, SubmitCheckRequest, SubmitCheckResponse,
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use domain::Coordinates;
use fms_patrol::{RawContent, RawFile, ReportedPosition};

#[derive(serde::Deserialize)]
pub struct SessionPath {
    session_id: String,
}

#[derive(serde::Deserialize)]
pub struct DepartmentQuery {
    department: Option<String>,
}

/// 列出点位目录
pub async fn list_locations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DepartmentQuery>,
) -> Response {
    if let Err(response) = require_operator_context(&headers) {
        return response;
    }
    let department = match parse_department_filter(query.department.as_deref()) {
        Ok(value) => value,
        Err(response) => return response,
    };
    let data: Vec<LocationDto> = state
        .patrol
        .locations(department)
        .iter()
        .map(location_to_dto)
        .collect();
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// 开始巡检
pub async fn start_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<StartPatrolRequest>, JsonRejection>,
) -> Response {
    let ctx = match require_operator_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_error(rejection),
    };
    let department = match parse_department(&req.department) {
        Ok(value) => value,
        Err(response) => return response,
    };
    match state
        .patrol
        .start_patrol(&ctx, department, now_epoch_ms())
        .await
    {
        Ok(session) => (
            StatusCode::OK,
            Json(ApiResponse::success(session_to_dto(&session))),
        )
            .into_response(),
        Err(err) => patrol_error(err),
    }
}

/// 获取会话详情
pub async fn get_session(
    State(state): State<AppState>,
    Path(path): Path<SessionPath>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_operator_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match state.patrol.session(&ctx, &path.session_id).await {
        Some(snapshot) => {
            let data = SessionDetailDto {
                session: session_to_dto(&snapshot.session),
                checklist: snapshot.checklist.as_ref().map(checklist_to_dto),
            };
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        None => not_found_error(),
    }
}

/// 扫码
pub async fn scan_location(
    State(state): State<AppState>,
    Path(path): Path<SessionPath>,
    headers: HeaderMap,
    body: Result<Json<ScanRequest>, JsonRejection>,
) -> Response {
    let ctx = match require_operator_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_error(rejection),
    };
    match state.patrol.scan(&ctx, &path.session_id, &req.code).await {
        Ok(checklist) => (
            StatusCode::OK,
            Json(ApiResponse::success(checklist_to_dto(&checklist))),
        )
            .into_response(),
        Err(err) => patrol_error(err),
    }
}

/// 设置检查项
pub async fn set_check(
    State(state): State<AppState>,
    Path(path): Path<SessionPath>,
    headers: HeaderMap,
    body: Result<Json<SetCheckRequest>, JsonRejection>,
) -> Response {
    let ctx = match require_operator_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_error(rejection),
    };
    let name = match normalize_required(req.name, "name") {
        Ok(value) => value,
        Err(response) => return response,
    };
    match state
        .patrol
        .set_check(&ctx, &path.session_id, &name, req.done)
        .await
    {
        Ok(checklist) => (
            StatusCode::OK,
            Json(ApiResponse::success(checklist_to_dto(&checklist))),
        )
            .into_response(),
        Err(err) => patrol_error(err),
    }
}

/// 设置备注
pub async fn set_notes(
    State(state): State<AppState>,
    Path(path): Path<SessionPath>,
    headers: HeaderMap,
    body: Result<Json<SetNotesRequest>, JsonRejection>,
) -> Response {
    let ctx = match require_operator_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_error(rejection),
    };
    match state
        .patrol
        .set_notes(&ctx, &path.session_id, &req.notes)
        .await
    {
        Ok(checklist) => (
            StatusCode::OK,
            Json(ApiResponse::success(checklist_to_dto(&checklist))),
        )
            .into_response(),
        Err(err) => patrol_error(err),
    }
}

/// 附加取证图片
pub async fn attach_evidence(
    State(state): State<AppState>,
    Path(path): Path<SessionPath>,
    headers: HeaderMap,
    body: Result<Json<AttachEvidenceRequest>, JsonRejection>,
) -> Response {
    let ctx = match require_operator_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_error(rejection),
    };
    let files = req
        .files
        .into_iter()
        .map(|file| RawFile {
            file_name: file.file_name,
            content_type: file.content_type,
            content: RawContent::classify(file.data),
        })
        .collect();
    match state
        .patrol
        .attach_evidence(&ctx, &path.session_id, files)
        .await
    {
        Ok(outcome) => {
            let data = EvidenceOutcomeDto {
                accepted: outcome.accepted,
                skipped: outcome.skipped,
                checklist: checklist_to_dto(&outcome.checklist),
            };
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => patrol_error(err),
    }
}

/// 丢弃当前清单
pub async fn discard_checklist(
    State(state): State<AppState>,
    Path(path): Path<SessionPath>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_operator_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match state
        .patrol
        .discard_checklist(&ctx, &path.session_id)
        .await
    {
        Ok(discarded) => (
            StatusCode::OK,
            Json(ApiResponse::success(DiscardChecklistDto { discarded })),
        )
            .into_response(),
        Err(err) => patrol_error(err),
    }
}

/// 提交点位检查
pub async fn submit_check(
    State(state): State<AppState>,
    Path(path): Path<SessionPath>,
    headers: HeaderMap,
    body: Result<Json<SubmitCheckRequest>, JsonRejection>,
) -> Response {
    let ctx = match require_operator_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_error(rejection),
    };
    let position = ReportedPosition(req.coordinates.map(|value| Coordinates {
        lat: value.lat,
        lng: value.lng,
    }));
    match state
        .patrol
        .submit(&ctx, &path.session_id, &position, now_epoch_ms())
        .await
    {
        Ok(outcome) => {
            let data = SubmitCheckResponse {
                session: session_to_dto(&outcome.session),
                check: check_to_dto(outcome.check),
            };
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => patrol_error(err),
    }
}

/// 列出会话已持久化的检查记录
pub async fn list_session_checks(
    State(state): State<AppState>,
    Path(path): Path<SessionPath>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_operator_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match state.patrol.location_checks(&ctx, &path.session_id).await {
        Ok(records) => {
            let data: Vec<LocationCheckDto> =
                records.into_iter().map(check_record_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => patrol_error(err),
    }
}

/// 巡检报表
pub async fn get_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DepartmentQuery>,
) -> Response {
    let ctx = match require_operator_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let department = match parse_department_filter(query.department.as_deref()) {
        Ok(value) => value,
        Err(response) => return response,
    };
    match state.patrol.report(&ctx, department).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(report_to_dto(report))),
        )
            .into_response(),
        Err(err) => patrol_error(err),
    }
}

fn now_epoch_ms() -> i64 {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_millis() as i64
}
