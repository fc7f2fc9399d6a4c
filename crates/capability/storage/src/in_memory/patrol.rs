//! 巡检记录内存存储实现
//!
//! 使用 RwLock 提供线程安全的内存存储。

use crate::error::StorageError;
use crate::models::{LocationCheckRecord, PatrolSessionRecord};
use crate::traits::PatrolStore;
use crate::validation::{ensure_record_tenant, ensure_tenant};
use domain::{Department, TenantContext};
use std::collections::HashMap;
use std::sync::RwLock;

/// 巡检记录内存存储
pub struct InMemoryPatrolStore {
    checks: RwLock<Vec<LocationCheckRecord>>,
    sessions: RwLock<HashMap<String, PatrolSessionRecord>>,
}

impl InMemoryPatrolStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self {
            checks: RwLock::new(Vec::new()),
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPatrolStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PatrolStore for InMemoryPatrolStore {
    async fn create_location_check(
        &self,
        ctx: &TenantContext,
        record: LocationCheckRecord,
    ) -> Result<LocationCheckRecord, StorageError> {
        ensure_record_tenant(ctx, &record.tenant_id)?;
        let mut checks = self
            .checks
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if checks.iter().any(|item| item.check_id == record.check_id) {
            return Err(StorageError::new("location check exists"));
        }
        checks.push(record.clone());
        Ok(record)
    }

    async fn save_completed_session(
        &self,
        ctx: &TenantContext,
        record: PatrolSessionRecord,
    ) -> Result<PatrolSessionRecord, StorageError> {
        ensure_record_tenant(ctx, &record.tenant_id)?;
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if sessions.contains_key(&record.session_id) {
            return Err(StorageError::new("patrol session exists"));
        }
        sessions.insert(record.session_id.clone(), record.clone());
        Ok(record)
    }

    async fn list_location_checks(
        &self,
        ctx: &TenantContext,
        session_id: &str,
    ) -> Result<Vec<LocationCheckRecord>, StorageError> {
        ensure_tenant(ctx)?;
        let checks = self
            .checks
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<LocationCheckRecord> = checks
            .iter()
            .filter(|item| item.tenant_id == ctx.tenant_id && item.session_id == session_id)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.checked_at_ms);
        Ok(items)
    }

    async fn list_department_checks(
        &self,
        ctx: &TenantContext,
        department: Option<Department>,
    ) -> Result<Vec<LocationCheckRecord>, StorageError> {
        ensure_tenant(ctx)?;
        let checks = self
            .checks
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<LocationCheckRecord> = checks
            .iter()
            .filter(|item| item.tenant_id == ctx.tenant_id)
            .filter(|item| department.is_none_or(|dept| item.department == dept))
            .cloned()
            .collect();
        items.sort_by_key(|item| item.checked_at_ms);
        Ok(items)
    }

    async fn list_completed_sessions(
        &self,
        ctx: &TenantContext,
        department: Option<Department>,
    ) -> Result<Vec<PatrolSessionRecord>, StorageError> {
        ensure_tenant(ctx)?;
        let sessions = self
            .sessions
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<PatrolSessionRecord> = sessions
            .values()
            .filter(|item| item.tenant_id == ctx.tenant_id)
            .filter(|item| department.is_none_or(|dept| item.department == dept))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.started_at_ms
                .cmp(&b.started_at_ms)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(items)
    }
}
