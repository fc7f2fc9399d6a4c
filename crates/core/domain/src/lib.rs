pub mod patrol;

pub use patrol::{
    ChecklistItem, Coordinates, Department, EvidenceImage, LocationCheck, ParseDepartmentError,
    PatrolLocation, PatrolSession, SessionStatus,
};

/// 租户上下文：所有模块共享的执行上下文。
///
/// 身份由上游网关提供，本服务只负责按租户隔离数据。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: String,
    pub operator_id: String,
}

impl TenantContext {
    /// 构造显式身份的租户上下文。
    pub fn new(tenant_id: impl Into<String>, operator_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            operator_id: operator_id.into(),
        }
    }

    /// 系统内部操作使用的上下文（如报表汇总）。
    pub fn system(tenant_id: impl Into<String>) -> Self {
        Self::new(tenant_id, "system")
    }
}

impl Default for TenantContext {
    /// 空上下文（仅用于测试或占位）。
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            operator_id: String::new(),
        }
    }
}
