//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Maintenance: Sweeps expired records out of the embedded store and flushes it

mod maintenance;

pub use maintenance::{run_maintenance, spawn_maintenance_task};
