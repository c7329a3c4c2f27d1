//! HTTP route handlers.

pub mod executions;
pub mod follows;
pub mod system;
