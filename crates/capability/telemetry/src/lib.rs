//! 追踪、请求 ID 生成与巡检计数指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 指标快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub sessions_started: u64,
    pub sessions_completed: u64,
    pub scans_accepted: u64,
    pub scans_rejected: u64,
    pub checks_recorded: u64,
    pub submissions_blocked: u64,
    pub evidence_accepted: u64,
    pub evidence_skipped: u64,
    pub geolocation_unavailable: u64,
    pub persist_failure: u64,
}

/// 进程级计数指标。
pub struct TelemetryMetrics {
    sessions_started: AtomicU64,
    sessions_completed: AtomicU64,
    scans_accepted: AtomicU64,
    scans_rejected: AtomicU64,
    checks_recorded: AtomicU64,
    submissions_blocked: AtomicU64,
    evidence_accepted: AtomicU64,
    evidence_skipped: AtomicU64,
    geolocation_unavailable: AtomicU64,
    persist_failure: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            sessions_started: AtomicU64::new(0),
            sessions_completed: AtomicU64::new(0),
            scans_accepted: AtomicU64::new(0),
            scans_rejected: AtomicU64::new(0),
            checks_recorded: AtomicU64::new(0),
            submissions_blocked: AtomicU64::new(0),
            evidence_accepted: AtomicU64::new(0),
            evidence_skipped: AtomicU64::new(0),
            geolocation_unavailable: AtomicU64::new(0),
            persist_failure: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            sessions_completed: self.sessions_completed.load(Ordering::Relaxed),
            scans_accepted: self.scans_accepted.load(Ordering::Relaxed),
            scans_rejected: self.scans_rejected.load(Ordering::Relaxed),
            checks_recorded: self.checks_recorded.load(Ordering::Relaxed),
            submissions_blocked: self.submissions_blocked.load(Ordering::Relaxed),
            evidence_accepted: self.evidence_accepted.load(Ordering::Relaxed),
            evidence_skipped: self.evidence_skipped.load(Ordering::Relaxed),
            geolocation_unavailable: self.geolocation_unavailable.load(Ordering::Relaxed),
            persist_failure: self.persist_failure.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录巡检会话开始次数。
pub fn record_session_started() {
    metrics().sessions_started.fetch_add(1, Ordering::Relaxed);
}

/// 记录巡检会话自动完成次数。
pub fn record_session_completed() {
    metrics().sessions_completed.fetch_add(1, Ordering::Relaxed);
}

/// 记录扫码成功次数。
pub fn record_scan_accepted() {
    metrics().scans_accepted.fetch_add(1, Ordering::Relaxed);
}

/// 记录扫码拒绝次数（未知点位或部门不符）。
pub fn record_scan_rejected() {
    metrics().scans_rejected.fetch_add(1, Ordering::Relaxed);
}

/// 记录点位检查写入次数。
pub fn record_check_recorded() {
    metrics().checks_recorded.fetch_add(1, Ordering::Relaxed);
}

/// 记录提交被拦截次数（清单未完成或缺少图片）。
pub fn record_submission_blocked() {
    metrics().submissions_blocked.fetch_add(1, Ordering::Relaxed);
}

/// 记录接收的取证图片数量。
pub fn record_evidence_accepted(count: u64) {
    metrics()
        .evidence_accepted
        .fetch_add(count, Ordering::Relaxed);
}

/// 记录被跳过的取证文件数量。
pub fn record_evidence_skipped(count: u64) {
    metrics().evidence_skipped.fetch_add(count, Ordering::Relaxed);
}

/// 记录定位不可用次数（拒绝、超时或无效坐标）。
pub fn record_geolocation_unavailable() {
    metrics()
        .geolocation_unavailable
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录持久化失败次数。
pub fn record_persist_failure() {
    metrics().persist_failure.fetch_add(1, Ordering::Relaxed);
}
