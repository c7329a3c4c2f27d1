use std::sync::Arc;

use async_trait::async_trait;
use common::{Recommendation, UserId};

use crate::Result;

/// Directed "follows" graph.
#[async_trait]
pub trait FollowGraphStore: Send + Sync {
    /// Creates the edge `follower -> following`. A no-op if it already exists.
    async fn create_edge(&self, follower_id: &UserId, following_id: &UserId) -> Result<()>;

    /// Removes the edge `follower -> following`.
    ///
    /// Fails with `FollowEdgeNotFound` if there is nothing to remove.
    async fn remove_edge(&self, follower_id: &UserId, following_id: &UserId) -> Result<()>;

    /// Returns true if `follower` follows `following`.
    async fn exists(&self, follower_id: &UserId, following_id: &UserId) -> Result<bool>;

    /// Users following `user_id`, sorted by ID.
    async fn followers(&self, user_id: &UserId) -> Result<Vec<UserId>>;

    /// Users that `user_id` follows, sorted by ID.
    async fn following(&self, user_id: &UserId) -> Result<Vec<UserId>>;

    /// Users followed by the people `user_id` follows, excluding `user_id`
    /// and anyone it already follows.
    ///
    /// Ordered by mutual follower count (highest first), then by ID, and
    /// truncated to `limit`.
    async fn recommendations(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Recommendation>>;
}

#[async_trait]
impl<T: FollowGraphStore + ?Sized> FollowGraphStore for Arc<T> {
    async fn create_edge(&self, follower_id: &UserId, following_id: &UserId) -> Result<()> {
        (**self).create_edge(follower_id, following_id).await
    }

    async fn remove_edge(&self, follower_id: &UserId, following_id: &UserId) -> Result<()> {
        (**self).remove_edge(follower_id, following_id).await
    }

    async fn exists(&self, follower_id: &UserId, following_id: &UserId) -> Result<bool> {
        (**self).exists(follower_id, following_id).await
    }

    async fn followers(&self, user_id: &UserId) -> Result<Vec<UserId>> {
        (**self).followers(user_id).await
    }

    async fn following(&self, user_id: &UserId) -> Result<Vec<UserId>> {
        (**self).following(user_id).await
    }

    async fn recommendations(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        (**self).recommendations(user_id, limit).await
    }
}
