//! Tour execution session record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ExecutionId, KeyPointId, TourId, UserId};

/// The status of a tour execution in its lifecycle.
///
/// State transitions:
/// ```text
/// Active ──┬──► Completed
///          └──► Abandoned
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ExecutionStatus {
    /// The user is on the tour; positions are being evaluated.
    #[default]
    Active,

    /// The tour was finished by the user (terminal state).
    Completed,

    /// The tour was given up by the user (terminal state).
    Abandoned,
}

impl ExecutionStatus {
    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Abandoned)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Active => "Active",
            ExecutionStatus::Completed => "Completed",
            ExecutionStatus::Abandoned => "Abandoned",
        }
    }

    /// Parses a status name as produced by [`ExecutionStatus::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Active" => Some(ExecutionStatus::Active),
            "Completed" => Some(ExecutionStatus::Completed),
            "Abandoned" => Some(ExecutionStatus::Abandoned),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A key point the user reached, with the time it was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedKeyPoint {
    pub key_point_id: KeyPointId,
    pub completion_time: DateTime<Utc>,
}

/// One user's attempt at one tour.
///
/// `completed_key_points` is append-only and always a prefix of the tour's
/// ordered key point list. Once `status` is terminal the record is frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourExecution {
    pub id: ExecutionId,
    pub tour_id: TourId,
    pub user_id: UserId,
    pub status: ExecutionStatus,
    pub completed_key_points: Vec<CompletedKeyPoint>,
    pub start_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl TourExecution {
    /// Creates a fresh active execution started at `now`.
    pub fn start(tour_id: TourId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: ExecutionId::new(),
            tour_id,
            user_id,
            status: ExecutionStatus::Active,
            completed_key_points: Vec::new(),
            start_time: now,
            last_activity: now,
            end_time: None,
        }
    }

    /// Returns true while the execution accepts position updates.
    pub fn is_active(&self) -> bool {
        self.status == ExecutionStatus::Active
    }

    /// Index of the next key point the user has to reach.
    pub fn next_key_point_index(&self) -> usize {
        self.completed_key_points.len()
    }
}
