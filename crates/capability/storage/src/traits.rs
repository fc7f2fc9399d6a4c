//! 存储接口 Trait 定义
//!
//! PatrolStore 是巡检流程的持久化出口：
//! - 每次成功记录点位检查后写入一条 LocationCheckRecord
//! - 会话自动完成时写入一条 PatrolSessionRecord
//!
//! 设计原则：
//! - 所有接口显式接收 TenantContext
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发

use crate::error::StorageError;
use crate::models::{LocationCheckRecord, PatrolSessionRecord};
use async_trait::async_trait;
use domain::{Department, TenantContext};

/// 巡检记录存储接口
#[async_trait]
pub trait PatrolStore: Send + Sync {
    /// 写入点位检查记录（check_id 重复时报错）
    async fn create_location_check(
        &self,
        ctx: &TenantContext,
        record: LocationCheckRecord,
    ) -> Result<LocationCheckRecord, StorageError>;

    /// 写入已完成的巡检会话（同一会话只写一次）
    async fn save_completed_session(
        &self,
        ctx: &TenantContext,
        record: PatrolSessionRecord,
    ) -> Result<PatrolSessionRecord, StorageError>;

    /// 列出指定会话的点位检查记录（按检查时间升序）
    async fn list_location_checks(
        &self,
        ctx: &TenantContext,
        session_id: &str,
    ) -> Result<Vec<LocationCheckRecord>, StorageError>;

    /// 列出当前租户的点位检查记录，可按部门过滤（按检查时间升序）
    async fn list_department_checks(
        &self,
        ctx: &TenantContext,
        department: Option<Department>,
    ) -> Result<Vec<LocationCheckRecord>, StorageError>;

    /// 列出当前租户已完成的会话，可按部门过滤（按开始时间升序）
    async fn list_completed_sessions(
        &self,
        ctx: &TenantContext,
        department: Option<Department>,
    ) -> Result<Vec<PatrolSessionRecord>, StorageError>;
}
