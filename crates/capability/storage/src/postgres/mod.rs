//! # PostgreSQL 存储实现模块
//!
//! 生产环境使用的 `PatrolStore` 实现。
//!
//! ## 设计原则
//!
//! 1. **参数化查询**：所有 SQL 查询使用参数绑定
//! 2. **多租户隔离**：所有查询都包含 `tenant_id` 过滤条件
//! 3. **时间存储**：毫秒时间戳以 `timestamptz` 存储，读取时换算回毫秒
//! 4. **结构化列**：检查清单与取证图片以 `jsonb` 存储
//!
//! ## 数据库模式要求
//!
//! - `patrol_sessions`：已完成会话（session_id, tenant_id, operator_id, department, started_at, ended_at, total_locations, completed_locations, status）
//! - `patrol_location_checks`：点位检查（check_id, tenant_id, session_id, operator_id, location_id, location_code, department, checked_at, checklist, evidence_images, notes, lat, lng）
//!
//! 建表脚本见 `crates/capability/storage/migrations/`。
//!
//! ### 索引
//! - `idx_patrol_checks_tenant_session`：(tenant_id, session_id)
//! - `idx_patrol_checks_tenant_department`：(tenant_id, department)
//! - `idx_patrol_sessions_tenant_department`：(tenant_id, department)

pub mod patrol;

pub use patrol::*;
