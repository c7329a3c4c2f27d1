//! Saga pattern implementation for the unfollow workflow.
//!
//! This crate provides a small orchestrator for multi-step operations that
//! span independently failing systems, with compensating actions on failure.
//!
//! The unfollow saga follows these steps:
//! 1. Remove the follow edge from the graph store
//! 2. Remove the follower's likes on the unfollowed author's posts
//!
//! If a step fails, previously completed steps are compensated in reverse
//! order. Compensation is best-effort: its failures are logged and counted
//! but never replace the error of the failed step.

pub mod error;
pub mod orchestrator;
pub mod services;
pub mod state;
pub mod step;
pub mod unfollow;

pub use error::SagaError;
pub use orchestrator::{SagaOrchestrator, SagaRun};
pub use services::{
    DEFAULT_BLOG_TIMEOUT, HttpLikeRemovalClient, InMemoryLikeService, LikeRemovalService,
};
pub use state::SagaState;
pub use step::SagaStep;
pub use unfollow::{RemoveAuthorLikes, RemoveFollowEdge, UnfollowCoordinator};
