//! Handlers 模块

pub mod health;
pub mod metrics;
pub mod patrol;

pub use health::*;
pub use metrics::*;
pub use patrol::*;
