//! Storage capabilities consumed by the coordination core.
//!
//! Two stores are defined here:
//! - [`ExecutionStore`] holds one document per tour execution session and
//!   guarantees at most one active execution per user.
//! - [`FollowGraphStore`] holds directed follow edges with create-if-absent
//!   semantics.
//!
//! Each has an in-memory implementation (tests, local runs) and a
//! PostgreSQL implementation.

pub mod error;
pub mod execution;
pub mod follow_graph;
pub mod memory;
pub mod postgres;

pub use error::{Result, StoreError};
pub use execution::ExecutionStore;
pub use follow_graph::FollowGraphStore;
pub use memory::{InMemoryExecutionStore, InMemoryFollowGraph};
pub use postgres::{PostgresExecutionStore, PostgresFollowGraph, run_migrations};
