//! # FMS Storage 模块
//!
//! 巡检流程的持久化抽象层，支持多种存储后端实现。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：`PatrolStore` 异步 Trait
//! 2. **数据模型层** (`models.rs`)：`LocationCheckRecord`、`PatrolSessionRecord`
//! 3. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 4. **验证辅助层** (`validation.rs`)：租户隔离验证
//! 5. **连接管理层** (`connection.rs`)：数据库连接池管理
//! 6. **实现层**：
//!    - `in_memory/`：内存存储实现（用于测试和未配置数据库的部署）
//!    - `postgres/`：PostgreSQL 存储实现（生产环境使用，表结构见 `migrations/`）
//!
//! ## 多租户安全
//!
//! - 所有存储接口都显式接收 `TenantContext`
//! - 写入的记录必须属于当前租户，否则返回 `tenant mismatch`
//! - 所有查询自动添加 `tenant_id` 过滤条件
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use domain::TenantContext;
//! use fms_storage::{InMemoryPatrolStore, PatrolStore};
//!
//! let store = InMemoryPatrolStore::new();
//! let ctx = TenantContext::new("tenant-1", "op-1");
//! let checks = store.list_location_checks(&ctx, "session-1").await?;
//! ```

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod traits;
pub mod validation;

pub use connection::*;
pub use error::*;
pub use models::*;
pub use traits::*;
pub use validation::*;

pub use in_memory::InMemoryPatrolStore;
pub use postgres::PgPatrolStore;
