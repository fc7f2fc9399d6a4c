//! 数据模型
//!
//! - LocationCheckRecord：点位检查记录（创建后不可变）
//! - PatrolSessionRecord：已完成的巡检会话

use domain::{
    ChecklistItem, Coordinates, Department, EvidenceImage, LocationCheck, PatrolSession,
    SessionStatus,
};

/// 点位检查记录。
#[derive(Debug, Clone, PartialEq)]
pub struct LocationCheckRecord {
    pub check_id: String,
    pub tenant_id: String,
    pub session_id: String,
    pub operator_id: String,
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

impl LocationCheckRecord {
    /// 由领域检查记录构造存储记录。
    pub fn from_check(
        tenant_id: impl Into<String>,
        operator_id: impl Into<String>,
        check: &LocationCheck,
    ) -> Self {
        Self {
            check_id: check.check_id.clone(),
            tenant_id: tenant_id.into(),
            session_id: check.session_id.clone(),
            operator_id: operator_id.into(),
            location_id: check.location_id.clone(),
            location_code: check.location_code.clone(),
            department: check.department,
            checked_at_ms: check.checked_at_ms,
            checklist_completed: check.checklist_completed,
            checklist: check.checklist.clone(),
            evidence_images: check.evidence_images.clone(),
            notes: check.notes.clone(),
            coordinates: check.coordinates,
        }
    }
}

/// 巡检会话记录。
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolSessionRecord {
    pub session_id: String,
    pub tenant_id: String,
    pub operator_id: String,
    pub department: Department,
    pub started_at_ms: i64,
    pub ended_at_ms: Option<i64>,
    pub total_locations: u32,
    pub completed_locations: u32,
    pub status: SessionStatus,
}

impl From<&PatrolSession> for PatrolSessionRecord {
    fn from(session: &PatrolSession) -> Self {
        Self {
            session_id: session.session_id.clone(),
            tenant_id: session.tenant_id.clone(),
            operator_id: session.operator_id.clone(),
            department: session.department,
            started_at_ms: session.started_at_ms,
            ended_at_ms: session.ended_at_ms,
            total_locations: session.total_locations,
            completed_locations: session.completed_locations,
            status: session.status,
        }
    }
}

impl PatrolSessionRecord {
    /// 巡检时长（仅已完成会话）。
    pub fn duration_ms(&self) -> Option<i64> {
        self.ended_at_ms
            .map(|ended| ended.saturating_sub(self.started_at_ms).max(0))
    }
}
