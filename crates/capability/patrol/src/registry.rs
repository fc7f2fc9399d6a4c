//! 巡检点位目录。
//!
//! 目录是启动时注入的种子数据（内置目录或 JSON 文件），会话期间不可变。

use domain::{Department, PatrolLocation};
use std::collections::HashSet;

/// 点位目录加载/校验错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid catalog: {0}")]
    Parse(String),
    #[error("location id and code must not be blank")]
    BlankIdentity,
    #[error("duplicate location id: {0}")]
    DuplicateId(String),
    #[error("duplicate location code: {0}")]
    DuplicateCode(String),
    #[error("location {0} has no required checks")]
    NoRequiredChecks(String),
    #[error("location {0} has a blank check name")]
    BlankCheck(String),
    #[error("location {code} lists check twice: {check}")]
    DuplicateCheck { code: String, check: String },
}

/// 巡检点位目录。
#[derive(Debug, Clone)]
pub struct LocationRegistry {
    locations: Vec<PatrolLocation>,
}

impl LocationRegistry {
    /// 校验并构造目录。
    ///
    /// 点位 id、编码与检查项名称去除首尾空白后再校验；扫码与勾选检查项都按去空白后的值精确匹配。
    pub fn new(locations: Vec<PatrolLocation>) -> Result<Self, RegistryError> {
        let locations: Vec<PatrolLocation> = locations.into_iter().map(normalize).collect();
        let mut ids = HashSet::new();
        let mut codes = HashSet::new();
        for location in &locations {
            if location.location_id.is_empty() || location.code.is_empty() {
                return Err(RegistryError::BlankIdentity);
            }
            if !ids.insert(location.location_id.as_str()) {
                return Err(RegistryError::DuplicateId(location.location_id.clone()));
            }
            if !codes.insert(location.code.as_str()) {
                return Err(RegistryError::DuplicateCode(location.code.clone()));
            }
            if location.required_checks.is_empty() {
                return Err(RegistryError::NoRequiredChecks(location.code.clone()));
            }
            let mut checks = HashSet::new();
            for check in &location.required_checks {
                if check.is_empty() {
                    return Err(RegistryError::BlankCheck(location.code.clone()));
                }
                if !checks.insert(check.as_str()) {
                    return Err(RegistryError::DuplicateCheck {
                        code: location.code.clone(),
                        check: check.clone(),
                    });
                }
            }
        }
        Ok(Self { locations })
    }

    /// 从 JSON 数组加载目录（camelCase 字段）。
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let locations: Vec<PatrolLocation> =
            serde_json::from_str(json).map_err(|err| RegistryError::Parse(err.to_string()))?;
        Self::new(locations)
    }

    /// 内置目录。
    pub fn default_catalog() -> Self {
        Self {
            locations: vec![
                seed(
                    "loc-ent-001",
                    "ENT-001",
                    "Main Entrance",
                    Department::Security,
                    &[
                        "Doors locked/secured",
                        "CCTV operational",
                        "Lighting functional",
                        "No suspicious activity",
                    ],
                ),
                seed(
                    "loc-prk-b01",
                    "PRK-B01",
                    "Basement Parking B1",
                    Department::Security,
                    &[
                        "Fire exits clear",
                        "Lighting functional",
                        "No unauthorized vehicles",
                    ],
                ),
                seed(
                    "loc-lob-001",
                    "LOB-001",
                    "Main Lobby",
                    Department::Housekeeping,
                    &["Floor clean", "Trash bins emptied", "Restrooms stocked"],
                ),
                seed(
                    "loc-mec-001",
                    "MEC-001",
                    "Mechanical Room",
                    Department::Maintenance,
                    &[
                        "HVAC running normally",
                        "No leaks detected",
                        "Electrical panels secured",
                    ],
                ),
            ],
        }
    }

    /// 按二维码精确查找。
    pub fn find_by_code(&self, code: &str) -> Option<&PatrolLocation> {
        self.locations.iter().find(|location| location.code == code)
    }

    pub fn find_by_id(&self, location_id: &str) -> Option<&PatrolLocation> {
        self.locations
            .iter()
            .find(|location| location.location_id == location_id)
    }

    /// 按部门列出点位（目录顺序）。
    pub fn list_by_department(&self, department: Department) -> Vec<&PatrolLocation> {
        self.locations
            .iter()
            .filter(|location| location.department == department)
            .collect()
    }

    pub fn locations(&self) -> &[PatrolLocation] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

fn seed(
    location_id: &str,
    code: &str,
    name: &str,
    department: Department,
    checks: &[&str],
) -> PatrolLocation {
    PatrolLocation {
        location_id: location_id.to_string(),
        code: code.to_string(),
        name: name.to_string(),
        department,
        required_checks: checks.iter().map(|check| check.to_string()).collect(),
    }
}

fn normalize(mut location: PatrolLocation) -> PatrolLocation {
    location.location_id = location.location_id.trim().to_string();
    location.code = location.code.trim().to_string();
    location.name = location.name.trim().to_string();
    for check in &mut location.required_checks {
        *check = check.trim().to_string();
    }
    location
}
