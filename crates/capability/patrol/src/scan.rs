//! 扫码解析：把扫描得到的文本解析为点位。
//!
//! 扫码硬件/视频流的生命周期在外部，这里只消费"已解码文本"事件。
//! 任意文本（包括乱码）都不会导致 panic，无法匹配时返回 `UnknownLocation`。

use crate::error::PatrolError;
use crate::registry::LocationRegistry;
use domain::{Department, PatrolLocation};
use std::sync::Arc;

/// 扫码解析器。
#[derive(Debug, Clone)]
pub struct ScanDecoder {
    registry: Arc<LocationRegistry>,
}

impl ScanDecoder {
    pub fn new(registry: Arc<LocationRegistry>) -> Self {
        Self { registry }
    }

    /// 解析扫码文本，并校验点位属于本次巡检的部门。
    pub fn resolve(
        &self,
        raw_code: &str,
        expected_department: Department,
    ) -> Result<&PatrolLocation, PatrolError> {
        resolve(&self.registry, raw_code, expected_department)
    }
}

/// 解析扫码文本（扫码枪常带 CR/LF 等尾随字符，先去除）。
pub fn resolve<'a>(
    registry: &'a LocationRegistry,
    raw_code: &str,
    expected_department: Department,
) -> Result<&'a PatrolLocation, PatrolError> {
    let code = normalize_code(raw_code);
    let location = registry
        .find_by_code(code)
        .ok_or_else(|| PatrolError::UnknownLocation {
            code: code.to_string(),
        })?;
    if location.department != expected_department {
        return Err(PatrolError::DepartmentMismatch {
            expected: expected_department,
            actual: location.department,
        });
    }
    Ok(location)
}

fn normalize_code(raw_code: &str) -> &str {
    raw_code.trim_matches(|c: char| c.is_whitespace() || c.is_control())
}
