//! 输入验证辅助函数
//!
//! - normalize_required：验证必填字段，去除空格并检查非空
//! - parse_department：解析部门（大小写不敏感）
//! - parse_department_filter：可选的部门过滤参数，空值视为不过滤
//!
//! 失败返回 bad_request_error 响应

use crate::utils::response::bad_request_error;
use axum::response::Response;
use domain::Department;

/// 验证必填字段，去除空格并检查非空
pub fn normalize_required(value: String, field: &str) -> Result<String, Response> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bad_request_error(format!("{field} required")));
    }
    Ok(trimmed.to_string())
}

/// 解析部门
pub fn parse_department(value: &str) -> Result<Department, Response> {
    value
        .parse::<Department>()
        .map_err(|err| bad_request_error(err.to_string()))
}

/// 解析可选的部门过滤参数
pub fn parse_department_filter(value: Option<&str>) -> Result<Option<Department>, Response> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => parse_department(value).map(Some),
        _ => Ok(None),
    }
}
