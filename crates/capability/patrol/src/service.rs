//! 巡检服务：会话编排 + 清单状态 + 持久化。
//!
//! 每个进行中的巡检由独立的 `tokio::sync::Mutex` 保护，同一会话的提交串行执行。
//! 锁顺序：持有索引锁时不获取巡检锁；提交完成时可在巡检锁内获取索引写锁。
//! 已完成的会话只保留最近 `completed_retention` 个，更早的从内存淘汰（记录已持久化）。

use crate::checklist::ActiveChecklistState;
use crate::error::PatrolError;
use crate::evidence::{EvidenceCapture, RawFile};
use crate::geolocation::{GeolocationProvider, locate_with_timeout};
use crate::registry::LocationRegistry;
use crate::report::{PatrolReport, build_report};
use crate::scan::ScanDecoder;
use crate::session::{RecordOutcome, RepeatScanPolicy, SessionManager, progress_percentage};
use domain::{Department, LocationCheck, PatrolLocation, PatrolSession, TenantContext};
use fms_storage::{LocationCheckRecord, PatrolSessionRecord, PatrolStore};
use fms_telemetry::{
    record_check_recorded, record_persist_failure, record_scan_accepted, record_scan_rejected,
    record_session_completed, record_session_started, record_submission_blocked,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{info, warn};

/// 巡检服务配置。
#[derive(Debug, Clone)]
pub struct PatrolServiceConfig {
    pub repeat_scan_policy: RepeatScanPolicy,
    /// 提交时等待定位的上限。
    pub geolocation_timeout: Duration,
    /// 单张图片的字节上限。
    pub evidence_max_bytes: u64,
    /// 内存中保留的已完成会话数。
    pub completed_retention: usize,
}

impl Default for PatrolServiceConfig {
    fn default() -> Self {
        Self {
            repeat_scan_policy: RepeatScanPolicy::default(),
            geolocation_timeout: Duration::from_millis(3_000),
            evidence_max_bytes: 5 * 1024 * 1024,
            completed_retention: 1_024,
        }
    }
}

/// 会话快照（含进度与当前清单）。
#[derive(Debug, Clone)]
pub struct PatrolSnapshot {
    pub session: PatrolSession,
    pub checklist: Option<ActiveChecklistState>,
    pub progress_percentage: f64,
}

/// 取证附加结果。
#[derive(Debug, Clone)]
pub struct EvidenceOutcome {
    pub accepted: usize,
    pub skipped: usize,
    pub checklist: ActiveChecklistState,
}

/// 提交结果。
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub check: LocationCheck,
    pub session: PatrolSession,
}

struct ActivePatrol {
    session: PatrolSession,
    checklist: Option<ActiveChecklistState>,
}

#[derive(Default)]
struct PatrolIndex {
    patrols: HashMap<String, Arc<Mutex<ActivePatrol>>>,
    /// (tenant_id, operator_id) -> 进行中的 session_id
    active_by_operator: HashMap<(String, String), String>,
    /// 按完成顺序排列的 session_id
    completed: VecDeque<String>,
}

/// 巡检服务。
pub struct PatrolService {
    manager: SessionManager,
    decoder: ScanDecoder,
    evidence: EvidenceCapture,
    store: Arc<dyn PatrolStore>,
    geolocation_timeout: Duration,
    completed_retention: usize,
    index: RwLock<PatrolIndex>,
}

impl PatrolService {
    pub fn new(registry: Arc<LocationRegistry>, store: Arc<dyn PatrolStore>) -> Self {
        Self::new_with_config(registry, store, PatrolServiceConfig::default())
    }

    pub fn new_with_config(
        registry: Arc<LocationRegistry>,
        store: Arc<dyn PatrolStore>,
        config: PatrolServiceConfig,
    ) -> Self {
        Self {
            manager: SessionManager::new(registry.clone(), config.repeat_scan_policy),
            decoder: ScanDecoder::new(registry),
            evidence: EvidenceCapture::new(config.evidence_max_bytes),
            store,
            geolocation_timeout: config.geolocation_timeout,
            completed_retention: config.completed_retention,
            index: RwLock::new(PatrolIndex::default()),
        }
    }

    pub fn registry(&self) -> &LocationRegistry {
        self.manager.registry()
    }

    /// 点位目录（可按部门过滤，目录顺序）。
    pub fn locations(&self, department: Option<Department>) -> Vec<PatrolLocation> {
        match department {
            Some(department) => self
                .registry()
                .list_by_department(department)
                .into_iter()
                .cloned()
                .collect(),
            None => self.registry().locations().to_vec(),
        }
    }

    /// 开始巡检。同一租户下每个操作员最多一个进行中的会话。
    pub async fn start_patrol(
        &self,
        ctx: &TenantContext,
        department: Department,
        now_ms: i64,
    ) -> Result<PatrolSession, PatrolError> {
        let key = (ctx.tenant_id.clone(), ctx.operator_id.clone());
        let mut index = self.index.write().await;
        if let Some(session_id) = index.active_by_operator.get(&key) {
            return Err(PatrolError::SessionAlreadyActive {
                session_id: session_id.clone(),
            });
        }
        let session = self
            .manager
            .start(&ctx.tenant_id, &ctx.operator_id, department, now_ms)?;
        index
            .active_by_operator
            .insert(key, session.session_id.clone());
        index.patrols.insert(
            session.session_id.clone(),
            Arc::new(Mutex::new(ActivePatrol {
                session: session.clone(),
                checklist: None,
            })),
        );
        drop(index);

        record_session_started();
        info!(
            target: "fms.patrol",
            tenant_id = %ctx.tenant_id,
            operator_id = %ctx.operator_id,
            session_id = %session.session_id,
            department = %department,
            total_locations = session.total_locations,
            "patrol_session_started"
        );
        Ok(session)
    }

    /// 读取会话快照；未知会话或不属于当前操作员时返回 `None`。
    pub async fn session(&self, ctx: &TenantContext, session_id: &str) -> Option<PatrolSnapshot> {
        let patrol = self.owned_patrol(ctx, session_id).await.ok()?;
        Some(PatrolSnapshot {
            progress_percentage: progress_percentage(&patrol.session),
            session: patrol.session.clone(),
            checklist: patrol.checklist.clone(),
        })
    }

    /// 扫码：解析点位并初始化新清单（丢弃未提交的旧清单）。
    pub async fn scan(
        &self,
        ctx: &TenantContext,
        session_id: &str,
        raw_code: &str,
    ) -> Result<ActiveChecklistState, PatrolError> {
        let mut patrol = self.active_patrol(ctx, session_id).await?;
        let location = match self.decoder.resolve(raw_code, patrol.session.department) {
            Ok(location) => location,
            Err(err) => {
                record_scan_rejected();
                info!(
                    target: "fms.patrol",
                    tenant_id = %ctx.tenant_id,
                    session_id = %session_id,
                    error = %err,
                    "scan_rejected"
                );
                return Err(err);
            }
        };
        let state = ActiveChecklistState::initialize(location);
        let replaced = patrol.checklist.replace(state.clone()).is_some();
        record_scan_accepted();
        info!(
            target: "fms.patrol",
            tenant_id = %ctx.tenant_id,
            session_id = %session_id,
            location_code = %location.code,
            replaced_unsaved = replaced,
            "location_scanned"
        );
        Ok(state)
    }

    /// 设置检查项；不在清单内的名称忽略。
    pub async fn set_check(
        &self,
        ctx: &TenantContext,
        session_id: &str,
        check_name: &str,
        done: bool,
    ) -> Result<ActiveChecklistState, PatrolError> {
        let mut patrol = self.active_patrol(ctx, session_id).await?;
        let checklist = checklist_mut(&mut patrol)?;
        checklist.set_check_value(check_name, done);
        Ok(checklist.clone())
    }

    pub async fn set_notes(
        &self,
        ctx: &TenantContext,
        session_id: &str,
        notes: &str,
    ) -> Result<ActiveChecklistState, PatrolError> {
        let mut patrol = self.active_patrol(ctx, session_id).await?;
        let checklist = checklist_mut(&mut patrol)?;
        checklist.set_notes(notes);
        Ok(checklist.clone())
    }

    /// 采集并附加取证图片。坏文件逐个跳过，不影响整批。
    pub async fn attach_evidence(
        &self,
        ctx: &TenantContext,
        session_id: &str,
        files: Vec<RawFile>,
    ) -> Result<EvidenceOutcome, PatrolError> {
        let mut patrol = self.active_patrol(ctx, session_id).await?;
        let checklist = checklist_mut(&mut patrol)?;
        let submitted = files.len();
        let images = self.evidence.capture(files);
        let accepted = checklist.add_images(images);
        Ok(EvidenceOutcome {
            accepted,
            skipped: submitted - accepted,
            checklist: checklist.clone(),
        })
    }

    /// 丢弃当前清单；返回是否存在被丢弃的清单。
    pub async fn discard_checklist(
        &self,
        ctx: &TenantContext,
        session_id: &str,
    ) -> Result<bool, PatrolError> {
        let mut patrol = self.active_patrol(ctx, session_id).await?;
        Ok(patrol.checklist.take().is_some())
    }

    /// 提交当前点位检查。
    ///
    /// 流程：定位（限时）-> 生成检查记录 -> 在会话副本上记录 -> 持久化检查
    /// -> 会话完成时持久化会话 -> 提交副本并清空清单。
    /// 检查记录写入失败时内存中的会话保持不变。
    pub async fn submit(
        &self,
        ctx: &TenantContext,
        session_id: &str,
        geolocation: &dyn GeolocationProvider,
        now_ms: i64,
    ) -> Result<SubmitOutcome, PatrolError> {
        let mut patrol = self.active_patrol(ctx, session_id).await?;
        let checklist = patrol
            .checklist
            .as_ref()
            .ok_or_else(|| PatrolError::NoActiveChecklist {
                session_id: session_id.to_string(),
            })?;
        if !checklist.is_ready_to_submit() {
            record_submission_blocked();
            let err = PatrolError::IncompleteChecklist {
                pending_checks: checklist.pending_checks(),
                missing_evidence: checklist.captured_images().is_empty(),
            };
            info!(
                target: "fms.patrol",
                tenant_id = %ctx.tenant_id,
                session_id = %session_id,
                location_code = %checklist.location().code,
                error = %err,
                "submission_blocked"
            );
            return Err(err);
        }

        let coordinates = locate_with_timeout(geolocation, self.geolocation_timeout).await;
        let check = checklist.build_location_check(session_id, now_ms, coordinates)?;
        let mut session = patrol.session.clone();
        let outcome = self.manager.record_check(&mut session, &check, now_ms)?;

        let record = LocationCheckRecord::from_check(&ctx.tenant_id, &ctx.operator_id, &check);
        if let Err(err) = self.store.create_location_check(ctx, record).await {
            record_persist_failure();
            warn!(
                target: "fms.patrol",
                tenant_id = %ctx.tenant_id,
                session_id = %session_id,
                check_id = %check.check_id,
                error = %err,
                "location_check_persist_failed"
            );
            return Err(err.into());
        }
        record_check_recorded();
        info!(
            target: "fms.patrol",
            tenant_id = %ctx.tenant_id,
            session_id = %session_id,
            check_id = %check.check_id,
            location_code = %check.location_code,
            completed_locations = session.completed_locations,
            total_locations = session.total_locations,
            has_coordinates = check.coordinates.is_some(),
            "location_check_recorded"
        );

        if outcome == RecordOutcome::Completed {
            // 检查记录已写入，会话写入失败只记录告警，不回滚
            if let Err(err) = self
                .store
                .save_completed_session(ctx, PatrolSessionRecord::from(&session))
                .await
            {
                record_persist_failure();
                warn!(
                    target: "fms.patrol",
                    tenant_id = %ctx.tenant_id,
                    session_id = %session_id,
                    error = %err,
                    "patrol_session_persist_failed"
                );
            }
            let key = (session.tenant_id.clone(), session.operator_id.clone());
            let mut index = self.index.write().await;
            if index.active_by_operator.get(&key) == Some(&session.session_id) {
                index.active_by_operator.remove(&key);
            }
            index.completed.push_back(session.session_id.clone());
            let mut evicted = 0usize;
            while index.completed.len() > self.completed_retention {
                if let Some(expired) = index.completed.pop_front() {
                    index.patrols.remove(&expired);
                    evicted += 1;
                }
            }
            drop(index);
            record_session_completed();
            info!(
                target: "fms.patrol",
                tenant_id = %ctx.tenant_id,
                session_id = %session_id,
                duration_ms = session.duration_ms().unwrap_or_default(),
                evicted,
                "patrol_session_completed"
            );
        }

        patrol.session = session.clone();
        patrol.checklist = None;
        Ok(SubmitOutcome { check, session })
    }

    /// 已持久化的点位检查记录。
    pub async fn location_checks(
        &self,
        ctx: &TenantContext,
        session_id: &str,
    ) -> Result<Vec<LocationCheckRecord>, PatrolError> {
        Ok(self.store.list_location_checks(ctx, session_id).await?)
    }

    pub async fn report(
        &self,
        ctx: &TenantContext,
        department: Option<Department>,
    ) -> Result<PatrolReport, PatrolError> {
        let sessions = self.store.list_completed_sessions(ctx, department).await?;
        let checks = self.store.list_department_checks(ctx, department).await?;
        Ok(build_report(department, &sessions, &checks))
    }

    async fn owned_patrol(
        &self,
        ctx: &TenantContext,
        session_id: &str,
    ) -> Result<OwnedMutexGuard<ActivePatrol>, PatrolError> {
        let not_active = || PatrolError::SessionNotActive {
            session_id: session_id.to_string(),
        };
        let patrol = {
            let index = self.index.read().await;
            index.patrols.get(session_id).cloned()
        }
        .ok_or_else(not_active)?;
        let patrol = patrol.lock_owned().await;
        if patrol.session.tenant_id != ctx.tenant_id
            || patrol.session.operator_id != ctx.operator_id
        {
            return Err(not_active());
        }
        Ok(patrol)
    }

    async fn active_patrol(
        &self,
        ctx: &TenantContext,
        session_id: &str,
    ) -> Result<OwnedMutexGuard<ActivePatrol>, PatrolError> {
        let patrol = self.owned_patrol(ctx, session_id).await?;
        if !patrol.session.is_active() {
            return Err(PatrolError::SessionNotActive {
                session_id: session_id.to_string(),
            });
        }
        Ok(patrol)
    }
}

fn checklist_mut(patrol: &mut ActivePatrol) -> Result<&mut ActiveChecklistState, PatrolError> {
    let session_id = &patrol.session.session_id;
    patrol
        .checklist
        .as_mut()
        .ok_or_else(|| PatrolError::NoActiveChecklist {
            session_id: session_id.clone(),
        })
}
