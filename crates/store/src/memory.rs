use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{ExecutionId, Recommendation, TourExecution, UserId};
use tokio::sync::RwLock;

use crate::{ExecutionStore, FollowGraphStore, Result, StoreError};

/// In-memory execution store.
///
/// The active-per-user check and the insert happen under the same write
/// lock, so concurrent `create` calls for one user cannot both succeed.
#[derive(Clone, Default)]
pub struct InMemoryExecutionStore {
    executions: Arc<RwLock<HashMap<ExecutionId, TourExecution>>>,
}

impl InMemoryExecutionStore {
    /// Creates a new empty in-memory execution store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of executions stored.
    pub async fn execution_count(&self) -> usize {
        self.executions.read().await.len()
    }
}

#[async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn get_by_id(&self, id: ExecutionId) -> Result<Option<TourExecution>> {
        Ok(self.executions.read().await.get(&id).cloned())
    }

    async fn get_active_by_user(&self, user_id: &UserId) -> Result<Option<TourExecution>> {
        let executions = self.executions.read().await;
        Ok(executions
            .values()
            .find(|e| e.is_active() && &e.user_id == user_id)
            .cloned())
    }

    async fn create(&self, execution: &TourExecution) -> Result<()> {
        let mut executions = self.executions.write().await;

        // Partial unique index simulation: one active execution per user
        if execution.is_active()
            && executions
                .values()
                .any(|e| e.is_active() && e.user_id == execution.user_id)
        {
            return Err(StoreError::ActiveExecutionExists {
                user_id: execution.user_id.clone(),
            });
        }

        executions.insert(execution.id, execution.clone());
        Ok(())
    }

    async fn update(&self, execution: &TourExecution) -> Result<()> {
        let mut executions = self.executions.write().await;

        match executions.get(&execution.id) {
            None => return Err(StoreError::ExecutionNotFound(execution.id)),
            Some(stored) if stored.status.is_terminal() => {
                return Err(StoreError::ExecutionFinished(execution.id));
            }
            Some(_) => {}
        }

        executions.insert(execution.id, execution.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct FailureSwitches {
    fail_on_create: AtomicBool,
    fail_on_remove: AtomicBool,
}

/// In-memory follow graph with failure injection for saga testing.
#[derive(Clone, Default)]
pub struct InMemoryFollowGraph {
    edges: Arc<RwLock<BTreeSet<(UserId, UserId)>>>,
    switches: Arc<FailureSwitches>,
}

impl InMemoryFollowGraph {
    /// Creates a new empty follow graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the graph to fail every `create_edge` call.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.switches.fail_on_create.store(fail, Ordering::SeqCst);
    }

    /// Configures the graph to fail every `remove_edge` call.
    pub fn set_fail_on_remove(&self, fail: bool) {
        self.switches.fail_on_remove.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of edges in the graph.
    pub async fn edge_count(&self) -> usize {
        self.edges.read().await.len()
    }
}

#[async_trait]
impl FollowGraphStore for InMemoryFollowGraph {
    async fn create_edge(&self, follower_id: &UserId, following_id: &UserId) -> Result<()> {
        if self.switches.fail_on_create.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("graph store rejected write".to_string()));
        }

        self.edges
            .write()
            .await
            .insert((follower_id.clone(), following_id.clone()));
        Ok(())
    }

    async fn remove_edge(&self, follower_id: &UserId, following_id: &UserId) -> Result<()> {
        if self.switches.fail_on_remove.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("graph store rejected write".to_string()));
        }

        let removed = self
            .edges
            .write()
            .await
            .remove(&(follower_id.clone(), following_id.clone()));

        if !removed {
            return Err(StoreError::FollowEdgeNotFound {
                follower_id: follower_id.clone(),
                following_id: following_id.clone(),
            });
        }
        Ok(())
    }

    async fn exists(&self, follower_id: &UserId, following_id: &UserId) -> Result<bool> {
        Ok(self
            .edges
            .read()
            .await
            .contains(&(follower_id.clone(), following_id.clone())))
    }

    async fn followers(&self, user_id: &UserId) -> Result<Vec<UserId>> {
        let edges = self.edges.read().await;
        let mut followers: Vec<UserId> = edges
            .iter()
            .filter(|(_, following)| following == user_id)
            .map(|(follower, _)| follower.clone())
            .collect();
        followers.sort();
        Ok(followers)
    }

    async fn following(&self, user_id: &UserId) -> Result<Vec<UserId>> {
        let edges = self.edges.read().await;
        // BTreeSet order already sorts by (follower, following)
        Ok(edges
            .iter()
            .filter(|(follower, _)| follower == user_id)
            .map(|(_, following)| following.clone())
            .collect())
    }

    async fn recommendations(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let edges = self.edges.read().await;
        let followed: BTreeSet<&UserId> = edges
            .iter()
            .filter(|(follower, _)| follower == user_id)
            .map(|(_, following)| following)
            .collect();

        let mut mutual: HashMap<&UserId, u64> = HashMap::new();
        for (follower, candidate) in edges.iter() {
            if followed.contains(follower)
                && candidate != user_id
                && !followed.contains(candidate)
            {
                *mutual.entry(candidate).or_default() += 1;
            }
        }

        let mut recommendations: Vec<Recommendation> = mutual
            .into_iter()
            .map(|(candidate, count)| Recommendation::new(candidate.clone(), count))
            .collect();
        recommendations.sort_by(|a, b| {
            b.mutual_followers
                .cmp(&a.mutual_followers)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        recommendations.truncate(limit);
        Ok(recommendations)
    }
}
