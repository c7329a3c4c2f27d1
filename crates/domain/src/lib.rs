//! Domain layer for the tour-guide coordination core.
//!
//! This crate provides:
//! - Haversine distance used for geofencing key points
//! - The tours catalog capability (in-memory and HTTP implementations)
//! - `TourExecutionTracker`, the per-user tour session state machine
//! - `FollowService` for creating and querying follow relationships

pub mod catalog;
pub mod error;
pub mod execution;
pub mod follow;
pub mod geo;

pub use catalog::{DEFAULT_CATALOG_TIMEOUT, HttpToursCatalog, InMemoryToursCatalog, ToursCatalog};
pub use error::DomainError;
pub use execution::{
    DEFAULT_COMPLETION_THRESHOLD_METERS, ProgressOutcome, TourExecutionTracker, TrackerConfig,
};
pub use follow::{DEFAULT_RECOMMENDATION_LIMIT, FollowService, validate_pair};
pub use geo::{EARTH_RADIUS_METERS, haversine_distance};
