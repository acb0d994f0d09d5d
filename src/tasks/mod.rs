//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry purge: Physically removes expired rows at configured intervals

mod purge;

pub use purge::spawn_purge_task;
