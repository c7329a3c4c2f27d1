//! The unfollow saga: drop the follow edge, then the follower's likes.

use async_trait::async_trait;
use common::UserId;
use domain::validate_pair;
use store::{FollowGraphStore, StoreError};

use crate::error::SagaError;
use crate::orchestrator::{SagaOrchestrator, SagaRun};
use crate::services::LikeRemovalService;
use crate::step::SagaStep;

/// The saga type identifier for unfollow.
pub const SAGA_TYPE: &str = "Unfollow";

/// Step name: remove the follow edge from the graph.
pub const STEP_REMOVE_FOLLOW_EDGE: &str = "remove follow edge";

/// Step name: remove the follower's likes on the author's posts.
pub const STEP_REMOVE_AUTHOR_LIKES: &str = "remove likes on unfollowed author's posts";

/// Removes the follow edge; compensation recreates it.
pub struct RemoveFollowEdge<'a, G: FollowGraphStore> {
    graph: &'a G,
    follower_id: &'a UserId,
    following_id: &'a UserId,
}

impl<'a, G: FollowGraphStore> RemoveFollowEdge<'a, G> {
    pub fn new(graph: &'a G, follower_id: &'a UserId, following_id: &'a UserId) -> Self {
        Self {
            graph,
            follower_id,
            following_id,
        }
    }
}

#[async_trait]
impl<G: FollowGraphStore> SagaStep for RemoveFollowEdge<'_, G> {
    fn name(&self) -> &str {
        STEP_REMOVE_FOLLOW_EDGE
    }

    async fn execute(&self) -> Result<(), SagaError> {
        tracing::info!(follower_id = %self.follower_id, following_id = %self.following_id, "Removing follow relationship");
        match self
            .graph
            .remove_edge(self.follower_id, self.following_id)
            .await
        {
            Ok(()) => Ok(()),
            // A concurrent unfollow got there first
            Err(StoreError::FollowEdgeNotFound { .. }) => Err(SagaError::NotFollowing),
            Err(err) => Err(err.into()),
        }
    }

    async fn compensate(&self) -> Result<(), SagaError> {
        tracing::info!(follower_id = %self.follower_id, following_id = %self.following_id, "Restoring follow relationship");
        self.graph
            .create_edge(self.follower_id, self.following_id)
            .await?;
        Ok(())
    }
}

/// Removes the follower's likes on the author's posts.
///
/// Likes cannot be restored, so compensation only logs a warning.
pub struct RemoveAuthorLikes<'a, L: LikeRemovalService> {
    likes: &'a L,
    user_id: &'a UserId,
    author_id: &'a UserId,
}

impl<'a, L: LikeRemovalService> RemoveAuthorLikes<'a, L> {
    pub fn new(likes: &'a L, user_id: &'a UserId, author_id: &'a UserId) -> Self {
        Self {
            likes,
            user_id,
            author_id,
        }
    }
}

#[async_trait]
impl<L: LikeRemovalService> SagaStep for RemoveAuthorLikes<'_, L> {
    fn name(&self) -> &str {
        STEP_REMOVE_AUTHOR_LIKES
    }

    async fn execute(&self) -> Result<(), SagaError> {
        tracing::info!(user_id = %self.user_id, author_id = %self.author_id, "Removing likes from author's posts");
        self.likes.remove_likes(self.user_id, self.author_id).await
    }

    async fn compensate(&self) -> Result<(), SagaError> {
        tracing::warn!(
            user_id = %self.user_id,
            author_id = %self.author_id,
            "Cannot restore likes, removal is not reversible"
        );
        Ok(())
    }
}

/// Entry point for unfollowing a user.
pub struct UnfollowCoordinator<G: FollowGraphStore, L: LikeRemovalService> {
    graph: G,
    likes: L,
    orchestrator: SagaOrchestrator,
}

impl<G: FollowGraphStore, L: LikeRemovalService> UnfollowCoordinator<G, L> {
    /// Creates a new unfollow coordinator.
    pub fn new(graph: G, likes: L) -> Self {
        Self {
            graph,
            likes,
            orchestrator: SagaOrchestrator::new(SAGA_TYPE),
        }
    }

    /// Makes `follower_id` stop following `following_id`.
    ///
    /// Fails with a validation error for missing or identical ids and with
    /// `SagaError::NotFollowing` when there is no edge to remove.
    #[tracing::instrument(skip(self))]
    pub async fn unfollow(
        &self,
        follower_id: &UserId,
        following_id: &UserId,
    ) -> Result<SagaRun, SagaError> {
        validate_pair(follower_id, following_id, "unfollow")?;

        if !self.graph.exists(follower_id, following_id).await? {
            return Err(SagaError::NotFollowing);
        }

        let mut steps: Vec<Box<dyn SagaStep + '_>> = Vec::with_capacity(2);
        steps.push(Box::new(RemoveFollowEdge::new(
            &self.graph,
            follower_id,
            following_id,
        )));
        steps.push(Box::new(RemoveAuthorLikes::new(
            &self.likes,
            follower_id,
            following_id,
        )));

        let run = self
            .orchestrator
            .execute(steps)
            .await
            .map_err(|err| match err {
                SagaError::StepFailed { source, .. }
                    if matches!(*source, SagaError::NotFollowing) =>
                {
                    SagaError::NotFollowing
                }
                other => other,
            })?;
        tracing::info!(%follower_id, %following_id, saga_id = %run.saga_id, "Unfollow completed");
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryLikeService;
    use domain::DomainError;
    use std::sync::Arc;
    use common::Recommendation;
    use store::InMemoryFollowGraph;

    /// Reports every edge as present, as if another request removed it
    /// right after the existence check.
    struct StaleGraph(InMemoryFollowGraph);

    #[async_trait]
    impl FollowGraphStore for StaleGraph {
        async fn create_edge(&self, a: &UserId, b: &UserId) -> store::Result<()> {
            self.0.create_edge(a, b).await
        }

        async fn remove_edge(&self, a: &UserId, b: &UserId) -> store::Result<()> {
            self.0.remove_edge(a, b).await
        }

        async fn exists(&self, _: &UserId, _: &UserId) -> store::Result<bool> {
            Ok(true)
        }

        async fn followers(&self, user_id: &UserId) -> store::Result<Vec<UserId>> {
            self.0.followers(user_id).await
        }

        async fn following(&self, user_id: &UserId) -> store::Result<Vec<UserId>> {
            self.0.following(user_id).await
        }

        async fn recommendations(
            &self,
            user_id: &UserId,
            limit: usize,
        ) -> store::Result<Vec<Recommendation>> {
            self.0.recommendations(user_id, limit).await
        }
    }

    struct Fixture {
        coordinator: UnfollowCoordinator<Arc<InMemoryFollowGraph>, Arc<InMemoryLikeService>>,
        graph: Arc<InMemoryFollowGraph>,
        likes: Arc<InMemoryLikeService>,
        alice: UserId,
        bob: UserId,
    }

    async fn fixture() -> Fixture {
        let graph = Arc::new(InMemoryFollowGraph::new());
        let likes = Arc::new(InMemoryLikeService::new());
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");
        graph.create_edge(&alice, &bob).await.unwrap();
        likes.add_like("alice", "bob");

        Fixture {
            coordinator: UnfollowCoordinator::new(graph.clone(), likes.clone()),
            graph,
            likes,
            alice,
            bob,
        }
    }

    #[tokio::test]
    async fn test_unfollow_removes_edge_and_likes() {
        let f = fixture().await;

        let run = f.coordinator.unfollow(&f.alice, &f.bob).await.unwrap();

        assert_eq!(run.saga_type, SAGA_TYPE);
        assert_eq!(
            run.completed_steps,
            vec![STEP_REMOVE_FOLLOW_EDGE, STEP_REMOVE_AUTHOR_LIKES]
        );
        assert!(!f.graph.exists(&f.alice, &f.bob).await.unwrap());
        assert_eq!(f.likes.like_count(&f.alice, &f.bob), 0);
    }

    #[tokio::test]
    async fn test_like_removal_failure_restores_edge() {
        let f = fixture().await;
        f.likes.set_fail_on_remove(true);

        let err = f.coordinator.unfollow(&f.alice, &f.bob).await.unwrap_err();

        assert_eq!(err.failed_step(), Some(STEP_REMOVE_AUTHOR_LIKES));
        assert!(f.graph.exists(&f.alice, &f.bob).await.unwrap());
        assert_eq!(f.likes.like_count(&f.alice, &f.bob), 1);
    }

    #[tokio::test]
    async fn test_failed_edge_restore_is_reported_not_escalated() {
        let f = fixture().await;
        f.likes.set_fail_on_remove(true);
        f.graph.set_fail_on_create(true);

        let err = f.coordinator.unfollow(&f.alice, &f.bob).await.unwrap_err();

        match err {
            SagaError::StepFailed {
                step,
                source,
                failed_compensations,
                state,
                ..
            } => {
                assert_eq!(step, STEP_REMOVE_AUTHOR_LIKES);
                assert!(matches!(*source, SagaError::LikeService(_)));
                assert_eq!(failed_compensations, vec![STEP_REMOVE_FOLLOW_EDGE]);
                assert_eq!(state, crate::SagaState::CompensationFailed);
            }
            other => panic!("expected StepFailed, got {other:?}"),
        }
        // The edge stays removed: the inconsistency is surfaced, not repaired
        assert!(!f.graph.exists(&f.alice, &f.bob).await.unwrap());
    }

    #[tokio::test]
    async fn test_edge_removal_failure_skips_like_removal() {
        let f = fixture().await;
        f.graph.set_fail_on_remove(true);

        let err = f.coordinator.unfollow(&f.alice, &f.bob).await.unwrap_err();

        match err {
            SagaError::StepFailed { step, source, number, .. } => {
                assert_eq!(step, STEP_REMOVE_FOLLOW_EDGE);
                assert_eq!(number, 1);
                assert!(matches!(*source, SagaError::Store(StoreError::Unavailable(_))));
            }
            other => panic!("expected StepFailed, got {other:?}"),
        }
        assert_eq!(f.likes.remove_calls(), 0);
    }

    #[tokio::test]
    async fn test_not_following() {
        let f = fixture().await;
        let carol = UserId::new("carol");

        let err = f.coordinator.unfollow(&carol, &f.bob).await.unwrap_err();

        assert!(matches!(err, SagaError::NotFollowing));
        assert_eq!(f.likes.remove_calls(), 0);
    }

    #[tokio::test]
    async fn test_edge_removed_concurrently_is_not_following() {
        let likes = Arc::new(InMemoryLikeService::new());
        let coordinator = UnfollowCoordinator::new(
            StaleGraph(InMemoryFollowGraph::new()),
            likes.clone(),
        );

        let err = coordinator
            .unfollow(&UserId::new("alice"), &UserId::new("bob"))
            .await
            .unwrap_err();

        assert!(matches!(err, SagaError::NotFollowing));
        assert_eq!(likes.remove_calls(), 0);
    }

    #[tokio::test]
    async fn test_validation() {
        let f = fixture().await;

        let err = f.coordinator.unfollow(&f.alice, &f.alice).await.unwrap_err();
        assert!(matches!(err, SagaError::Domain(DomainError::Validation(_))));

        let err = f
            .coordinator
            .unfollow(&UserId::new(""), &f.bob)
            .await
            .unwrap_err();
        assert!(matches!(err, SagaError::Domain(DomainError::Validation(_))));
        assert!(f.graph.exists(&f.alice, &f.bob).await.unwrap());
    }
}
