//! 巡检领域模型。
//!
//! - PatrolLocation：巡检点位（部署时定义，会话期间不可变）
//! - PatrolSession：一次巡检会话（单操作员、单部门）
//! - LocationCheck：一次点位检查记录（创建后不可变）

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 部门（封闭集合）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Security,
    Housekeeping,
    Maintenance,
}

impl Department {
    pub const ALL: [Department; 3] = [
        Department::Security,
        Department::Housekeeping,
        Department::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Security => "security",
            Department::Housekeeping => "housekeeping",
            Department::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 部门解析错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown department: {0}")]
pub struct ParseDepartmentError(pub String);

impl FromStr for Department {
    type Err = ParseDepartmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "security" => Ok(Department::Security),
            "housekeeping" => Ok(Department::Housekeeping),
            "maintenance" => Ok(Department::Maintenance),
            _ => Err(ParseDepartmentError(value.to_string())),
        }
    }
}

/// 巡检点位。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatrolLocation {
    pub location_id: String,
    /// 二维码中编码的字符串，全局唯一。
    pub code: String,
    pub name: String,
    pub department: Department,
    pub required_checks: Vec<String>,
}

/// 会话状态。`Completed` 为终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        }
    }
}

/// 巡检会话。
///
/// 不变式：`status == Completed` 当且仅当 `completed_locations == total_locations`
/// 且 `ended_at_ms` 已设置。
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolSession {
    pub session_id: String,
    pub tenant_id: String,
    pub operator_id: String,
    pub department: Department,
    pub started_at_ms: i64,
    pub ended_at_ms: Option<i64>,
    pub total_locations: u32,
    pub completed_locations: u32,
    pub status: SessionStatus,
    /// 已记录的点位 ID（按记录顺序，可能重复）。
    pub checked_location_ids: Vec<String>,
}

impl PatrolSession {
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// 巡检时长（仅已完成会话）。
    pub fn duration_ms(&self) -> Option<i64> {
        self.ended_at_ms
            .map(|ended| ended.saturating_sub(self.started_at_ms).max(0))
    }
}

/// 坐标（尽力获取，可能缺失）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// 经纬度是否在合法范围内。
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// 检查项及其完成状态。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub name: String,
    pub done: bool,
}

/// 取证图片：data URI 或外部引用。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceImage {
    pub content_type: String,
    pub uri: String,
}

/// 点位检查记录。
#[derive(Debug, Clone, PartialEq)]
pub struct LocationCheck {
    pub check_id: String,
    pub session_id: String,
    pub location_id: String,
    pub location_code: String,
    pub department: Department,
    pub checked_at_ms: i64,
    pub checklist_completed: bool,
    pub checklist: Vec<ChecklistItem>,
    pub evidence_images: Vec<EvidenceImage>,
    pub notes: Option<String>,
    pub coordinates: Option<Coordinates>,
}
