//! HTTP 响应辅助函数和 DTO 转换
//!
//! 提供统一的错误响应构造函数和 DTO 转换函数：
//! - 错误响应：auth_error, bad_request_error, json_rejection_error, not_found_error, patrol_error
//! - DTO 转换：location_to_dto, session_to_dto, checklist_to_dto, check_to_dto,
//!   check_record_to_dto, report_to_dto, metrics_to_dto
//!
//! 所有错误返回统一的 ApiResponse 格式，HTTP 状态码与错误码一一对应

use api_contract::{
    ApiResponse, ChecklistDto, ChecklistItemDto, CoordinatesDto, EvidenceImageDto,
    LocationCheckDto, LocationCountDto, LocationDto, MetricsSnapshotDto, ReportDto, SessionDto,
};
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::{
    ChecklistItem, Coordinates, EvidenceImage, LocationCheck, PatrolLocation, PatrolSession,
};
use fms_patrol::{ActiveChecklistState, PatrolError, PatrolReport, progress_percentage};
use fms_storage::LocationCheckRecord;
use fms_telemetry::MetricsSnapshot;
use tracing::warn;

/// 认证错误响应
pub fn auth_error(status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()>::error(
            "AUTH.UNAUTHORIZED",
            "unauthorized",
        )),
    )
        .into_response()
}

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 请求体解析失败响应（格式错误、缺少 content-type、超出大小上限）
///
/// 沿用拒绝本身的状态码（400/413/415/422），错误体统一为 ApiResponse
pub fn json_rejection_error(rejection: JsonRejection) -> Response {
    let status = rejection.status();
    let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "REQUEST.TOO_LARGE"
    } else {
        "INVALID.REQUEST"
    };
    (
        status,
        Json(ApiResponse::<()>::error(code, rejection.body_text())),
    )
        .into_response()
}

/// 资源未找到错误响应
pub fn not_found_error() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("RESOURCE.NOT_FOUND", "not found")),
    )
        .into_response()
}

/// 巡检错误对应的状态码与错误码
pub fn patrol_error_status(err: &PatrolError) -> (StatusCode, &'static str) {
    match err {
        PatrolError::UnknownLocation { .. } => (StatusCode::NOT_FOUND, "PATROL.UNKNOWN_LOCATION"),
        PatrolError::DepartmentMismatch { .. } => {
            (StatusCode::CONFLICT, "PATROL.DEPARTMENT_MISMATCH")
        }
        PatrolError::IncompleteChecklist { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "PATROL.INCOMPLETE_CHECKLIST",
        ),
        PatrolError::SessionNotActive { .. } => (StatusCode::CONFLICT, "PATROL.SESSION_NOT_ACTIVE"),
        PatrolError::NoLocationsForDepartment(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "PATROL.NO_LOCATIONS")
        }
        PatrolError::SessionMismatch { .. } => (StatusCode::CONFLICT, "PATROL.SESSION_MISMATCH"),
        PatrolError::LocationAlreadyChecked { .. } => {
            (StatusCode::CONFLICT, "PATROL.LOCATION_ALREADY_CHECKED")
        }
        PatrolError::NoActiveChecklist { .. } => {
            (StatusCode::CONFLICT, "PATROL.NO_ACTIVE_CHECKLIST")
        }
        PatrolError::SessionAlreadyActive { .. } => {
            (StatusCode::CONFLICT, "PATROL.SESSION_ALREADY_ACTIVE")
        }
        PatrolError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL.ERROR"),
    }
}

/// 巡检错误响应
pub fn patrol_error(err: PatrolError) -> Response {
    let (status, code) = patrol_error_status(&err);
    if status.is_server_error() {
        warn!(target: "fms.api", error = %err, "patrol_request_failed");
    }
    (
        status,
        Json(ApiResponse::<()>::error(code, err.to_string())),
    )
        .into_response()
}

/// PatrolLocation 转 LocationDto
pub fn location_to_dto(location: &PatrolLocation) -> LocationDto {
    LocationDto {
        location_id: location.location_id.clone(),
        code: location.code.clone(),
        name: location.name.clone(),
        department: location.department.to_string(),
        required_checks: location.required_checks.clone(),
    }
}

/// PatrolSession 转 SessionDto（附带进度）
pub fn session_to_dto(session: &PatrolSession) -> SessionDto {
    SessionDto {
        session_id: session.session_id.clone(),
        operator_id: session.operator_id.clone(),
        department: session.department.to_string(),
        status: session.status.as_str().to_string(),
        started_at_ms: session.started_at_ms,
        ended_at_ms: session.ended_at_ms,
        total_locations: session.total_locations,
        completed_locations: session.completed_locations,
        progress_percentage: progress_percentage(session),
    }
}

/// ActiveChecklistState 转 ChecklistDto
pub fn checklist_to_dto(state: &ActiveChecklistState) -> ChecklistDto {
    ChecklistDto {
        location: location_to_dto(state.location()),
        items: items_to_dto(state.checklist()),
        captured_images: images_to_dto(state.captured_images()),
        notes: state.notes().map(str::to_string),
        pending_checks: state.pending_checks(),
        ready_to_submit: state.is_ready_to_submit(),
    }
}

/// LocationCheck 转 LocationCheckDto
pub fn check_to_dto(check: LocationCheck) -> LocationCheckDto {
    LocationCheckDto {
        check_id: check.check_id,
        session_id: check.session_id,
        location_id: check.location_id,
        location_code: check.location_code,
        department: check.department.to_string(),
        checked_at_ms: check.checked_at_ms,
        checklist_completed: check.checklist_completed,
        checklist: items_to_dto(&check.checklist),
        evidence_images: images_to_dto(&check.evidence_images),
        notes: check.notes,
        coordinates: check.coordinates.map(coordinates_to_dto),
    }
}

/// LocationCheckRecord 转 LocationCheckDto
pub fn check_record_to_dto(record: LocationCheckRecord) -> LocationCheckDto {
    LocationCheckDto {
        check_id: record.check_id,
        session_id: record.session_id,
        location_id: record.location_id,
        location_code: record.location_code,
        department: record.department.to_string(),
        checked_at_ms: record.checked_at_ms,
        checklist_completed: record.checklist_completed,
        checklist: items_to_dto(&record.checklist),
        evidence_images: images_to_dto(&record.evidence_images),
        notes: record.notes,
        coordinates: record.coordinates.map(coordinates_to_dto),
    }
}

/// PatrolReport 转 ReportDto
pub fn report_to_dto(report: PatrolReport) -> ReportDto {
    ReportDto {
        department: report.department.map(|department| department.to_string()),
        sessions_completed: report.sessions_completed,
        checks_recorded: report.checks_recorded,
        evidence_images: report.evidence_images,
        average_duration_ms: report.average_duration_ms,
        checks_with_coordinates_percentage: report.checks_with_coordinates_percentage,
        checks_per_location: report
            .checks_per_location
            .into_iter()
            .map(|item| LocationCountDto {
                location_code: item.location_code,
                count: item.count,
            })
            .collect(),
    }
}

/// MetricsSnapshot 转 MetricsSnapshotDto
pub fn metrics_to_dto(snapshot: MetricsSnapshot) -> MetricsSnapshotDto {
    MetricsSnapshotDto {
        sessions_started: snapshot.sessions_started,
        sessions_completed: snapshot.sessions_completed,
        scans_accepted: snapshot.scans_accepted,
        scans_rejected: snapshot.scans_rejected,
        checks_recorded: snapshot.checks_recorded,
        submissions_blocked: snapshot.submissions_blocked,
        evidence_accepted: snapshot.evidence_accepted,
        evidence_skipped: snapshot.evidence_skipped,
        geolocation_unavailable: snapshot.geolocation_unavailable,
        persist_failure: snapshot.persist_failure,
    }
}

fn items_to_dto(items: &[ChecklistItem]) -> Vec<ChecklistItemDto> {
    items
        .iter()
        .map(|item| ChecklistItemDto {
            name: item.name.clone(),
            done: item.done,
        })
        .collect()
}

fn images_to_dto(images: &[EvidenceImage]) -> Vec<EvidenceImageDto> {
    images
        .iter()
        .map(|image| EvidenceImageDto {
            content_type: image.content_type.clone(),
            uri: image.uri.clone(),
        })
        .collect()
}

fn coordinates_to_dto(coordinates: Coordinates) -> CoordinatesDto {
    CoordinatesDto {
        lat: coordinates.lat,
        lng: coordinates.lng,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Department;

    #[test]
    fn patrol_errors_map_to_status_codes() {
        let cases = [
            (
                PatrolError::UnknownLocation {
                    code: "X".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                PatrolError::IncompleteChecklist {
                    pending_checks: Vec::new(),
                    missing_evidence: true,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                PatrolError::NoLocationsForDepartment(Department::Maintenance),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                PatrolError::SessionAlreadyActive {
                    session_id: "s-1".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                PatrolError::Storage("down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(patrol_error_status(&err).0, status, "{err}");
            assert_eq!(patrol_error(err).status(), status);
        }
    }

    #[test]
    fn session_dto_carries_progress() {
        let session = PatrolSession {
            session_id: "s-1".to_string(),
            tenant_id: "tenant-1".to_string(),
            operator_id: "op1".to_string(),
            department: Department::Security,
            started_at_ms: 0,
            ended_at_ms: None,
            total_locations: 4,
            completed_locations: 1,
            status: domain::SessionStatus::Active,
            checked_location_ids: vec!["loc-ent-001".to_string()],
        };
        let dto = session_to_dto(&session);
        assert_eq!(dto.progress_percentage, 25.0);
        assert_eq!(dto.department, "security");
        assert_eq!(dto.status, "active");
    }
}
