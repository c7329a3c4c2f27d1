//! Tour execution tracking: geofenced, strictly ordered key point progress.

mod progress;
mod tracker;

pub use progress::{ProgressOutcome, advance};
pub use tracker::{DEFAULT_COMPLETION_THRESHOLD_METERS, TourExecutionTracker, TrackerConfig};
