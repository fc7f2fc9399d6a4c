//! Postgres 巡检记录实现

use crate::error::StorageError;
use crate::models::{LocationCheckRecord, PatrolSessionRecord};
use crate::traits::PatrolStore;
use crate::validation::{ensure_record_tenant, ensure_tenant};
use domain::{ChecklistItem, Coordinates, Department, EvidenceImage, SessionStatus, TenantContext};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const CHECK_COLUMNS: &str = "check_id, tenant_id, session_id, operator_id, location_id, \
     location_code, department, \
     (extract(epoch from checked_at) * 1000)::bigint as checked_at_ms, \
     checklist_completed, checklist::text as checklist, \
     evidence_images::text as evidence_images, notes, lat, lng";

const SESSION_COLUMNS: &str = "session_id, tenant_id, operator_id, department, \
     (extract(epoch from started_at) * 1000)::bigint as started_at_ms, \
     (extract(epoch from ended_at) * 1000)::bigint as ended_at_ms, \
     total_locations, completed_locations, status";

pub struct PgPatrolStore {
    pub pool: PgPool,
}

impl PgPatrolStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 建立连接池并创建存储
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = crate::connection::connect_pool(database_url).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait::async_trait]
impl PatrolStore for PgPatrolStore {
    async fn create_location_check(
        &self,
        ctx: &TenantContext,
        record: LocationCheckRecord,
    ) -> Result<LocationCheckRecord, StorageError> {
        ensure_record_tenant(ctx, &record.tenant_id)?;
        let checklist = serde_json::to_string(&record.checklist)?;
        let evidence = serde_json::to_string(&record.evidence_images)?;
        sqlx::query(
            "insert into patrol_location_checks \
             (check_id, tenant_id, session_id, operator_id, location_id, location_code, \
              department, checked_at, checklist_completed, checklist, evidence_images, \
              notes, lat, lng) \
             values ($1, $2, $3, $4, $5, $6, $7, to_timestamp($8 / 1000.0), $9, \
                     $10::jsonb, $11::jsonb, $12, $13, $14)",
        )
        .bind(&record.check_id)
        .bind(&record.tenant_id)
        .bind(&record.session_id)
        .bind(&record.operator_id)
        .bind(&record.location_id)
        .bind(&record.location_code)
        .bind(record.department.as_str())
        .bind(record.checked_at_ms as f64)
        .bind(record.checklist_completed)
        .bind(checklist)
        .bind(evidence)
        .bind(&record.notes)
        .bind(record.coordinates.map(|c| c.lat))
        .bind(record.coordinates.map(|c| c.lng))
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn save_completed_session(
        &self,
        ctx: &TenantContext,
        record: PatrolSessionRecord,
    ) -> Result<PatrolSessionRecord, StorageError> {
        ensure_record_tenant(ctx, &record.tenant_id)?;
        let result = sqlx::query(
            "insert into patrol_sessions \
             (session_id, tenant_id, operator_id, department, started_at, ended_at, \
              total_locations, completed_locations, status) \
             values ($1, $2, $3, $4, to_timestamp($5 / 1000.0), to_timestamp($6 / 1000.0), \
                     $7, $8, $9) \
             on conflict (session_id) do nothing",
        )
        .bind(&record.session_id)
        .bind(&record.tenant_id)
        .bind(&record.operator_id)
        .bind(record.department.as_str())
        .bind(record.started_at_ms as f64)
        .bind(record.ended_at_ms.map(|value| value as f64))
        .bind(to_i32(record.total_locations)?)
        .bind(to_i32(record.completed_locations)?)
        .bind(record.status.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::new("patrol session exists"));
        }
        Ok(record)
    }

    async fn list_location_checks(
        &self,
        ctx: &TenantContext,
        session_id: &str,
    ) -> Result<Vec<LocationCheckRecord>, StorageError> {
        ensure_tenant(ctx)?;
        let sql = format!(
            "select {CHECK_COLUMNS} from patrol_location_checks \
             where tenant_id = $1 and session_id = $2 \
             order by checked_at asc, check_id asc"
        );
        let rows = sqlx::query(&sql)
            .bind(&ctx.tenant_id)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(check_from_row).collect()
    }

    async fn list_department_checks(
        &self,
        ctx: &TenantContext,
        department: Option<Department>,
    ) -> Result<Vec<LocationCheckRecord>, StorageError> {
        ensure_tenant(ctx)?;
        let sql = format!(
            "select {CHECK_COLUMNS} from patrol_location_checks \
             where tenant_id = $1 and ($2::text is null or department = $2) \
             order by checked_at asc, check_id asc"
        );
        let rows = sqlx::query(&sql)
            .bind(&ctx.tenant_id)
            .bind(department.map(|dept| dept.as_str()))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(check_from_row).collect()
    }

    async fn list_completed_sessions(
        &self,
        ctx: &TenantContext,
        department: Option<Department>,
    ) -> Result<Vec<PatrolSessionRecord>, StorageError> {
        ensure_tenant(ctx)?;
        let sql = format!(
            "select {SESSION_COLUMNS} from patrol_sessions \
             where tenant_id = $1 and ($2::text is null or department = $2) \
             order by started_at asc, session_id asc"
        );
        let rows = sqlx::query(&sql)
            .bind(&ctx.tenant_id)
            .bind(department.map(|dept| dept.as_str()))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(session_from_row).collect()
    }
}

fn check_from_row(row: &PgRow) -> Result<LocationCheckRecord, StorageError> {
    let checklist: String = row.try_get("checklist")?;
    let evidence: String = row.try_get("evidence_images")?;
    let lat: Option<f64> = row.try_get("lat")?;
    let lng: Option<f64> = row.try_get("lng")?;
    let checklist: Vec<ChecklistItem> = serde_json::from_str(&checklist)?;
    let evidence_images: Vec<EvidenceImage> = serde_json::from_str(&evidence)?;
    Ok(LocationCheckRecord {
        check_id: row.try_get("check_id")?,
        tenant_id: row.try_get("tenant_id")?,
        session_id: row.try_get("session_id")?,
        operator_id: row.try_get("operator_id")?,
        location_id: row.try_get("location_id")?,
        location_code: row.try_get("location_code")?,
        department: parse_department(row)?,
        checked_at_ms: row.try_get("checked_at_ms")?,
        checklist_completed: row.try_get("checklist_completed")?,
        checklist,
        evidence_images,
        notes: row.try_get("notes")?,
        coordinates: match (lat, lng) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        },
    })
}

fn session_from_row(row: &PgRow) -> Result<PatrolSessionRecord, StorageError> {
    let status: String = row.try_get("status")?;
    let status = match status.as_str() {
        "active" => SessionStatus::Active,
        "completed" => SessionStatus::Completed,
        other => return Err(StorageError::new(format!("invalid session status: {other}"))),
    };
    let total_locations: i32 = row.try_get("total_locations")?;
    let completed_locations: i32 = row.try_get("completed_locations")?;
    Ok(PatrolSessionRecord {
        session_id: row.try_get("session_id")?,
        tenant_id: row.try_get("tenant_id")?,
        operator_id: row.try_get("operator_id")?,
        department: parse_department(row)?,
        started_at_ms: row.try_get("started_at_ms")?,
        ended_at_ms: row.try_get("ended_at_ms")?,
        total_locations: from_i32(total_locations)?,
        completed_locations: from_i32(completed_locations)?,
        status,
    })
}

fn parse_department(row: &PgRow) -> Result<Department, StorageError> {
    let value: String = row.try_get("department")?;
    value
        .parse::<Department>()
        .map_err(|err| StorageError::new(err.to_string()))
}

fn to_i32(value: u32) -> Result<i32, StorageError> {
    i32::try_from(value).map_err(|_| StorageError::new("location count out of range"))
}

fn from_i32(value: i32) -> Result<u32, StorageError> {
    u32::try_from(value).map_err(|_| StorageError::new("location count out of range"))
}
