//! 巡检会话状态机。
//!
//! ```text
//! (none) --start--> [active] --record_check--> [active] --record_check(最后一个)--> [completed]
//! ```
//!
//! `completed` 为终态；没有单独的"结束"命令，完成总是第 N 次 `record_check` 的副作用。

use crate::error::PatrolError;
use crate::registry::LocationRegistry;
use domain::{Department, LocationCheck, PatrolSession, SessionStatus};
use std::sync::Arc;

/// 同一会话内重复检查同一点位时的计数策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatScanPolicy {
    /// 每次成功提交都计入进度（即使点位已检查过）。
    #[default]
    CountEveryCheck,
    /// 每个点位只计一次，重复提交返回 `LocationAlreadyChecked`。
    CountEachLocationOnce,
}

/// `record_check` 的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Progressed,
    Completed,
}

/// 会话管理器。
#[derive(Debug, Clone)]
pub struct SessionManager {
    registry: Arc<LocationRegistry>,
    policy: RepeatScanPolicy,
}

impl SessionManager {
    pub fn new(registry: Arc<LocationRegistry>, policy: RepeatScanPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn registry(&self) -> &LocationRegistry {
        &self.registry
    }

    pub fn policy(&self) -> RepeatScanPolicy {
        self.policy
    }

    /// 开始巡检：总点位数取自目录中该部门的点位数量，为 0 时拒绝。
    pub fn start(
        &self,
        tenant_id: &str,
        operator_id: &str,
        department: Department,
        now_ms: i64,
    ) -> Result<PatrolSession, PatrolError> {
        let total = self.registry.list_by_department(department).len();
        if total == 0 {
            return Err(PatrolError::NoLocationsForDepartment(department));
        }
        Ok(PatrolSession {
            session_id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            operator_id: operator_id.to_string(),
            department,
            started_at_ms: now_ms,
            ended_at_ms: None,
            total_locations: u32::try_from(total).unwrap_or(u32::MAX),
            completed_locations: 0,
            status: SessionStatus::Active,
            checked_location_ids: Vec::new(),
        })
    }

    /// 记录一次点位检查。
    ///
    /// 校验全部通过后才修改会话：进度 +1，达到总数时同步置为 completed。
    pub fn record_check(
        &self,
        session: &mut PatrolSession,
        check: &LocationCheck,
        now_ms: i64,
    ) -> Result<RecordOutcome, PatrolError> {
        if !session.is_active() {
            return Err(PatrolError::SessionNotActive {
                session_id: session.session_id.clone(),
            });
        }
        if check.session_id != session.session_id {
            return Err(PatrolError::SessionMismatch {
                session_id: session.session_id.clone(),
                check_session_id: check.session_id.clone(),
            });
        }
        if check.department != session.department {
            return Err(PatrolError::DepartmentMismatch {
                expected: session.department,
                actual: check.department,
            });
        }
        let location = self
            .registry
            .find_by_id(&check.location_id)
            .filter(|location| location.code == check.location_code)
            .ok_or_else(|| PatrolError::UnknownLocation {
                code: check.location_code.clone(),
            })?;
        if location.department != session.department {
            return Err(PatrolError::DepartmentMismatch {
                expected: session.department,
                actual: location.department,
            });
        }

        // 外部构造的记录同样要满足提交门槛
        let pending_checks: Vec<String> = location
            .required_checks
            .iter()
            .filter(|name| {
                !check
                    .checklist
                    .iter()
                    .any(|item| &item.name == *name && item.done)
            })
            .cloned()
            .collect();
        let missing_evidence = check.evidence_images.is_empty();
        if !check.checklist_completed || !pending_checks.is_empty() || missing_evidence {
            return Err(PatrolError::IncompleteChecklist {
                pending_checks,
                missing_evidence,
            });
        }

        if self.policy == RepeatScanPolicy::CountEachLocationOnce
            && session
                .checked_location_ids
                .iter()
                .any(|id| id == &location.location_id)
        {
            return Err(PatrolError::LocationAlreadyChecked {
                location_code: location.code.clone(),
            });
        }

        session.completed_locations = session.completed_locations.saturating_add(1);
        session
            .checked_location_ids
            .push(location.location_id.clone());
        if session.completed_locations >= session.total_locations {
            session.status = SessionStatus::Completed;
            session.ended_at_ms = Some(now_ms);
            return Ok(RecordOutcome::Completed);
        }
        Ok(RecordOutcome::Progressed)
    }
}

/// 进度百分比，范围 [0, 100]；总数为 0 时返回 0。
pub fn progress_percentage(session: &PatrolSession) -> f64 {
    percentage(
        u64::from(session.completed_locations),
        u64::from(session.total_locations),
    )
}

pub(crate) fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_guards_zero_total() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 2), 50.0);
        assert_eq!(percentage(3, 2), 100.0);
    }

    #[test]
    fn start_rejects_department_without_locations() {
        let catalog = LocationRegistry::default_catalog();
        let security_only: Vec<_> = catalog
            .locations()
            .iter()
            .filter(|location| location.department == Department::Security)
            .cloned()
            .collect();
        let registry = Arc::new(LocationRegistry::new(security_only).expect("registry"));
        let manager = SessionManager::new(registry, RepeatScanPolicy::default());
        let err = manager
            .start("tenant-1", "op-1", Department::Maintenance, 0)
            .expect_err("empty department");
        assert_eq!(
            err,
            PatrolError::NoLocationsForDepartment(Department::Maintenance)
        );
    }
}
