//! 内存存储实现模块
//!
//! 用于测试和未配置数据库的本地部署；进程退出即丢失。
//!
//! 包含以下实现：
//! - PatrolStore: InMemoryPatrolStore

pub mod patrol;

pub use patrol::*;
