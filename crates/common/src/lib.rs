//! Shared identifiers and records used across the workspace.
//!
//! Everything here is plain data. Behaviour that depends on collaborators
//! (stores, catalogs, remote services) lives in the `store`, `domain` and
//! `saga` crates.

pub mod execution;
pub mod follow;
pub mod location;
pub mod types;

pub use execution::{CompletedKeyPoint, ExecutionStatus, TourExecution};
pub use follow::{FollowEdge, Recommendation};
pub use location::{Coordinates, KeyPoint};
pub use types::{ExecutionId, KeyPointId, TourId, UserId};
