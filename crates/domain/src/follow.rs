//! Follow relationships between users.

use common::{FollowEdge, Recommendation, UserId};
use store::FollowGraphStore;

use crate::error::DomainError;

/// Number of suggestions returned when the caller does not ask for a limit.
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;

/// Creates and queries follow edges.
///
/// Removing an edge goes through the unfollow saga instead, since it also
/// has to clean up likes in the blog service.
pub struct FollowService<G: FollowGraphStore> {
    graph: G,
}

impl<G: FollowGraphStore> FollowService<G> {
    pub fn new(graph: G) -> Self {
        Self { graph }
    }

    /// Makes `follower_id` follow `following_id`.
    #[tracing::instrument(skip(self))]
    pub async fn follow(
        &self,
        follower_id: &UserId,
        following_id: &UserId,
    ) -> Result<FollowEdge, DomainError> {
        validate_pair(follower_id, following_id, "follow")?;

        if self.graph.exists(follower_id, following_id).await? {
            return Err(DomainError::Conflict(
                "already following this user".to_string(),
            ));
        }

        self.graph.create_edge(follower_id, following_id).await?;

        let edge = FollowEdge::new(follower_id.clone(), following_id.clone());
        tracing::info!(%edge, "User followed");
        Ok(edge)
    }

    pub async fn is_following(
        &self,
        follower_id: &UserId,
        following_id: &UserId,
    ) -> Result<bool, DomainError> {
        Ok(self.graph.exists(follower_id, following_id).await?)
    }

    /// Users following `user_id`, sorted by id.
    pub async fn followers(&self, user_id: &UserId) -> Result<Vec<UserId>, DomainError> {
        Ok(self.graph.followers(user_id).await?)
    }

    /// Users `user_id` follows, sorted by id.
    pub async fn following(&self, user_id: &UserId) -> Result<Vec<UserId>, DomainError> {
        Ok(self.graph.following(user_id).await?)
    }

    /// Suggests users followed by the people `user_id` follows.
    ///
    /// A missing or zero `limit` falls back to [`DEFAULT_RECOMMENDATION_LIMIT`].
    #[tracing::instrument(skip(self))]
    pub async fn recommendations(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Recommendation>, DomainError> {
        if user_id.is_blank() {
            return Err(DomainError::Validation("user id is required".to_string()));
        }

        let limit = limit
            .filter(|&limit| limit > 0)
            .unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);
        Ok(self.graph.recommendations(user_id, limit).await?)
    }
}

/// Checks that both ids are present and distinct.
///
/// `action` names the operation in the self-targeting message.
pub fn validate_pair(
    follower_id: &UserId,
    following_id: &UserId,
    action: &str,
) -> Result<(), DomainError> {
    if follower_id.is_blank() || following_id.is_blank() {
        return Err(DomainError::Validation(
            "follower and following ids are required".to_string(),
        ));
    }
    if follower_id == following_id {
        return Err(DomainError::Validation(format!("cannot {action} yourself")));
    }
    Ok(())
}
