//! Services module for backoffice-service.

pub mod access;
pub mod activity;
pub mod audit;
pub mod billing;
pub mod database;
pub mod lifecycle;
pub mod metrics;
pub mod scheduling;

pub use access::{PermissionSource, StaticPermissions};
pub use activity::{ActivityLog, MemoryActivityLog};
pub use audit::RequestAudit;
pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
