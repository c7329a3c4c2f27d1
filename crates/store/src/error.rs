use common::{ExecutionId, UserId};
use thiserror::Error;

/// Errors that can occur when interacting with a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The user already has an active execution; at most one is allowed.
    #[error("User {user_id} already has an active tour execution")]
    ActiveExecutionExists { user_id: UserId },

    /// No execution exists with the given ID.
    #[error("Tour execution not found: {0}")]
    ExecutionNotFound(ExecutionId),

    /// The stored execution is already in a terminal state and cannot be written.
    #[error("Tour execution {0} is already finished")]
    ExecutionFinished(ExecutionId),

    /// The follow edge to remove does not exist.
    #[error("Follow relationship {follower_id} -> {following_id} not found")]
    FollowEdgeNotFound {
        follower_id: UserId,
        following_id: UserId,
    },

    /// The backing store could not be reached or refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be decoded into its domain type.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
