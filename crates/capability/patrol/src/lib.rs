//! # FMS Patrol 模块
//!
//! 二维码巡检流程：扫码 -> 检查清单 -> 取证拍照 -> 点位提交 -> 会话自动完成。
//!
//! - `registry`：点位目录（启动时注入，只读）
//! - `scan`：扫码文本解析 + 部门校验
//! - `checklist`：当前点位的临时清单状态与提交门槛
//! - `session`：会话状态机与进度
//! - `evidence`：取证图片采集
//! - `geolocation`：限时定位
//! - `report`：报表聚合
//! - `service`：面向接口层的编排服务（按会话串行化提交，写入 `PatrolStore`）

pub mod checklist;
pub mod error;
pub mod evidence;
pub mod geolocation;
pub mod registry;
pub mod report;
pub mod scan;
pub mod service;
pub mod session;

pub use checklist::ActiveChecklistState;
pub use error::PatrolError;
pub use evidence::{EvidenceCapture, EvidenceError, RawContent, RawFile};
pub use geolocation::{
    GeolocationError, GeolocationProvider, NoGeolocation, ReportedPosition, locate_with_timeout,
};
pub use registry::{LocationRegistry, RegistryError};
pub use report::{LocationCount, PatrolReport, build_report};
pub use scan::ScanDecoder;
pub use service::{
    EvidenceOutcome, PatrolService, PatrolServiceConfig, PatrolSnapshot, SubmitOutcome,
};
pub use session::{RecordOutcome, RepeatScanPolicy, SessionManager, progress_percentage};
