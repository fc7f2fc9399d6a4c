//! 巡检报表聚合。

use crate::session::percentage;
use domain::Department;
use fms_storage::{LocationCheckRecord, PatrolSessionRecord};
use serde::Serialize;
use std::collections::BTreeMap;

/// 单个点位的检查次数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCount {
    pub location_code: String,
    pub count: u64,
}

/// 巡检报表。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatrolReport {
    pub department: Option<Department>,
    pub sessions_completed: u64,
    pub checks_recorded: u64,
    pub evidence_images: u64,
    /// 无已完成会话时为 0
    pub average_duration_ms: i64,
    /// 无检查记录时为 0
    pub checks_with_coordinates_percentage: f64,
    /// 按点位编码排序
    pub checks_per_location: Vec<LocationCount>,
}

/// 由已持久化的会话与检查记录生成报表。
///
/// 传入记录会再按部门过滤一次，调用方可直接传未过滤的列表。
pub fn build_report(
    department: Option<Department>,
    sessions: &[PatrolSessionRecord],
    checks: &[LocationCheckRecord],
) -> PatrolReport {
    let matches = |value: Department| department.is_none_or(|wanted| wanted == value);

    let durations: Vec<i64> = sessions
        .iter()
        .filter(|session| matches(session.department))
        .filter_map(PatrolSessionRecord::duration_ms)
        .collect();
    let sessions_completed = durations.len() as u64;
    let average_duration_ms = if durations.is_empty() {
        0
    } else {
        let total: i128 = durations.iter().map(|value| i128::from(*value)).sum();
        (total / durations.len() as i128) as i64
    };

    let mut checks_recorded = 0u64;
    let mut evidence_images = 0u64;
    let mut with_coordinates = 0u64;
    let mut per_location: BTreeMap<&str, u64> = BTreeMap::new();
    for check in checks.iter().filter(|check| matches(check.department)) {
        checks_recorded += 1;
        evidence_images += check.evidence_images.len() as u64;
        if check.coordinates.is_some() {
            with_coordinates += 1;
        }
        *per_location.entry(check.location_code.as_str()).or_default() += 1;
    }

    PatrolReport {
        department,
        sessions_completed,
        checks_recorded,
        evidence_images,
        average_duration_ms,
        checks_with_coordinates_percentage: percentage(with_coordinates, checks_recorded),
        checks_per_location: per_location
            .into_iter()
            .map(|(location_code, count)| LocationCount {
                location_code: location_code.to_string(),
                count,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Coordinates, EvidenceImage, SessionStatus};

    fn session(id: &str, department: Department, started: i64, ended: i64) -> PatrolSessionRecord {
        PatrolSessionRecord {
            session_id: id.to_string(),
            tenant_id: "tenant-1".to_string(),
            operator_id: "op-1".to_string(),
            department,
            started_at_ms: started,
            ended_at_ms: Some(ended),
            total_locations: 2,
            completed_locations: 2,
            status: SessionStatus::Completed,
        }
    }

    fn check(code: &str, department: Department, images: usize, located: bool) -> LocationCheckRecord {
        LocationCheckRecord {
            check_id: format!("chk-{code}-{images}"),
            tenant_id: "tenant-1".to_string(),
            session_id: "s-1".to_string(),
            operator_id: "op-1".to_string(),
            location_id: format!("loc-{code}"),
            location_code: code.to_string(),
            department,
            checked_at_ms: 0,
            checklist_completed: true,
            checklist: Vec::new(),
            evidence_images: vec![
                EvidenceImage {
                    content_type: "image/jpeg".to_string(),
                    uri: "https://cdn.example.com/p.jpg".to_string(),
                };
                images
            ],
            notes: None,
            coordinates: located.then_some(Coordinates { lat: 1.0, lng: 2.0 }),
        }
    }

    #[test]
    fn empty_input_has_zero_averages() {
        let report = build_report(None, &[], &[]);
        assert_eq!(report.sessions_completed, 0);
        assert_eq!(report.average_duration_ms, 0);
        assert_eq!(report.checks_with_coordinates_percentage, 0.0);
        assert!(report.checks_per_location.is_empty());
    }

    #[test]
    fn aggregates_by_department() {
        let sessions = vec![
            session("s-1", Department::Security, 0, 1_000),
            session("s-2", Department::Security, 0, 3_000),
            session("s-3", Department::Housekeeping, 0, 9_000),
        ];
        let checks = vec![
            check("PRK-B01", Department::Security, 1, true),
            check("ENT-001", Department::Security, 2, false),
            check("ENT-001", Department::Security, 1, true),
            check("ENT-001", Department::Security, 1, false),
            check("LOB-001", Department::Housekeeping, 3, true),
        ];
        let report = build_report(Some(Department::Security), &sessions, &checks);
        assert_eq!(report.sessions_completed, 2);
        assert_eq!(report.average_duration_ms, 2_000);
        assert_eq!(report.checks_recorded, 4);
        assert_eq!(report.evidence_images, 5);
        assert_eq!(report.checks_with_coordinates_percentage, 50.0);
        assert_eq!(
            report.checks_per_location,
            vec![
                LocationCount {
                    location_code: "ENT-001".to_string(),
                    count: 3,
                },
                LocationCount {
                    location_code: "PRK-B01".to_string(),
                    count: 1,
                },
            ]
        );
    }
}
