//! 请求上下文中间件与身份提取
//!
//! - request_context：注入 request_id/trace_id
//! - require_operator_context：从网关注入的请求头提取租户与操作员
//!
//! 身份由上游网关校验后以请求头传入：
//! - `x-tenant-id`：租户 ID
//! - `x-operator-id`：操作员 ID

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use domain::TenantContext;
use fms_telemetry::new_request_ids;
use tracing::{Instrument, info_span};

use crate::utils::response::auth_error;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const OPERATOR_HEADER: &str = "x-operator-id";

/// 请求上下文中间件：注入 request_id/trace_id
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}

/// 提取租户上下文；缺失或为空时返回 401
pub fn require_operator_context(headers: &HeaderMap) -> Result<TenantContext, Response> {
    let tenant_id = header_value(headers, TENANT_HEADER);
    let operator_id = header_value(headers, OPERATOR_HEADER);
    match (tenant_id, operator_id) {
        (Some(tenant_id), Some(operator_id)) => Ok(TenantContext::new(tenant_id, operator_id)),
        _ => Err(auth_error(StatusCode::UNAUTHORIZED)),
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    if value.is_empty() { None } else { Some(value) }
}
