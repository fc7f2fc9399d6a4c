//! 稳定的 DTO 与 API 响应契约。
//!
//! 所有字段使用 camelCase；部门、状态等枚举以小写字符串传输。

use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 开始巡检请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPatrolRequest {
    pub department: String,
}

/// 扫码请求体：扫码得到的原始文本。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[serde(alias = "rawCode")]
    pub code: String,
}

/// 设置检查项请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCheckRequest {
    #[serde(alias = "checkName")]
    pub name: String,
    pub done: bool,
}

/// 设置备注请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetNotesRequest {
    #[serde(default)]
    pub notes: String,
}

/// 取证文件：`data` 为 data URI、base64 或 https 引用。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceFileDto {
    pub file_name: Option<String>,
    #[serde(alias = "type", alias = "mimeType")]
    pub content_type: String,
    pub data: String,
}

/// 附加取证请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachEvidenceRequest {
    #[serde(default)]
    pub files: Vec<EvidenceFileDto>,
}

/// 坐标。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinatesDto {
    pub lat: f64,
    pub lng: f64,
}

/// 提交点位检查请求体（坐标由客户端尽力上报）。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCheckRequest {
    #[serde(default)]
    pub coordinates: Option<CoordinatesDto>,
}

/// 点位返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDto {
    pub location_id: String,
    pub code: String,
    pub name: String,
    pub department: String,
    pub required_checks: Vec<String>,
}

/// 巡检会话返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub session_id: String,
    pub operator_id: String,
    pub department: String,
    pub status: String,
    pub started_at_ms: i64,
    pub ended_at_ms: Option<i64>,
    pub total_locations: u32,
    pub completed_locations: u32,
    pub progress_percentage: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItemDto {
    pub name: String,
    pub done: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceImageDto {
    pub content_type: String,
    pub uri: String,
}

/// 当前点位清单返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistDto {
    pub location: LocationDto,
    pub items: Vec<ChecklistItemDto>,
    pub captured_images: Vec<EvidenceImageDto>,
    pub notes: Option<String>,
    pub pending_checks: Vec<String>,
    pub ready_to_submit: bool,
}

/// 会话详情（会话 + 当前清单）。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetailDto {
    pub session: SessionDto,
    pub checklist: Option<ChecklistDto>,
}

/// 附加取证结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceOutcomeDto {
    pub accepted: usize,
    pub skipped: usize,
    pub checklist: ChecklistDto,
}

/// 丢弃清单结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscardChecklistDto {
    pub discarded: bool,
}

/// 点位检查记录返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCheckDto {
    pub check_id: String,
    pub session_id: String,
    pub location_id: String,
    pub location_code: String,
    pub department: String,
    pub checked_at_ms: i64,
    pub checklist_completed: bool,
    pub checklist: Vec<ChecklistItemDto>,
    pub evidence_images: Vec<EvidenceImageDto>,
    pub notes: Option<String>,
    pub coordinates: Option<CoordinatesDto>,
}

/// 提交结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCheckResponse {
    pub check: LocationCheckDto,
    pub session: SessionDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCountDto {
    pub location_code: String,
    pub count: u64,
}

/// 巡检报表返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDto {
    pub department: Option<String>,
    pub sessions_completed: u64,
    pub checks_recorded: u64,
    pub evidence_images: u64,
    pub average_duration_ms: i64,
    pub checks_with_coordinates_percentage: f64,
    pub checks_per_location: Vec<LocationCountDto>,
}

/// 指标快照返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
    pub sessions_started: u64,
    pub sessions_completed: u64,
    pub scans_accepted: u64,
    pub scans_rejected: u64,
    pub checks_recorded: u64,
    pub submissions_blocked: u64,
    pub evidence_accepted: u64,
    pub evidence_skipped: u64,
    pub geolocation_unavailable: u64,
    pub persist_failure: u64,
}
