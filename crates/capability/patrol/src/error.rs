//! 巡检流程错误类型。
//!
//! 所有错误都是可恢复的输入校验拒绝：不会修改会话状态，也不会持久化半成品记录。

use domain::Department;

/// 巡检流程错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatrolError {
    #[error("unknown location: {code}")]
    UnknownLocation { code: String },
    #[error("location belongs to {actual}, patrol requires {expected}")]
    DepartmentMismatch {
        expected: Department,
        actual: Department,
    },
    #[error("checklist incomplete: {}", describe_incomplete(.pending_checks, .missing_evidence))]
    IncompleteChecklist {
        pending_checks: Vec<String>,
        missing_evidence: bool,
    },
    #[error("patrol session not active: {session_id}")]
    SessionNotActive { session_id: String },
    #[error("no patrol locations for department {0}")]
    NoLocationsForDepartment(Department),
    #[error("location check belongs to session {check_session_id}, not {session_id}")]
    SessionMismatch {
        session_id: String,
        check_session_id: String,
    },
    #[error("location already checked in this session: {location_code}")]
    LocationAlreadyChecked { location_code: String },
    #[error("no location scanned for session {session_id}")]
    NoActiveChecklist { session_id: String },
    #[error("operator already has an active patrol session: {session_id}")]
    SessionAlreadyActive { session_id: String },
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<fms_storage::StorageError> for PatrolError {
    fn from(err: fms_storage::StorageError) -> Self {
        PatrolError::Storage(err.to_string())
    }
}

fn describe_incomplete(pending_checks: &[String], missing_evidence: &bool) -> String {
    let mut parts = Vec::new();
    if !pending_checks.is_empty() {
        parts.push(format!("pending checks [{}]", pending_checks.join(", ")));
    }
    if *missing_evidence {
        parts.push("at least one image required".to_string());
    }
    if parts.is_empty() {
        parts.push("checklist not marked complete".to_string());
    }
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_message_lists_unmet_conditions() {
        let err = PatrolError::IncompleteChecklist {
            pending_checks: vec!["CCTV operational".to_string()],
            missing_evidence: true,
        };
        assert_eq!(
            err.to_string(),
            "checklist incomplete: pending checks [CCTV operational]; at least one image required"
        );
    }

    #[test]
    fn department_mismatch_names_required_department() {
        let err = PatrolError::DepartmentMismatch {
            expected: Department::Security,
            actual: Department::Housekeeping,
        };
        assert_eq!(
            err.to_string(),
            "location belongs to housekeeping, patrol requires security"
        );
    }
}
