use async_trait::async_trait;
use common::{
    CompletedKeyPoint, ExecutionId, ExecutionStatus, Recommendation, TourExecution, TourId, UserId,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{ExecutionStore, FollowGraphStore, Result, StoreError};

/// Name of the partial unique index enforcing one active execution per user.
const ACTIVE_EXECUTION_INDEX: &str = "one_active_execution_per_user";

/// Runs the database migrations.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("database migrations applied");
    Ok(())
}

fn decode_status(raw: &str) -> Result<ExecutionStatus> {
    ExecutionStatus::parse(raw)
        .ok_or_else(|| StoreError::Decode(format!("unknown execution status {raw:?}")))
}

/// PostgreSQL-backed execution store.
#[derive(Clone)]
pub struct PostgresExecutionStore {
    pool: PgPool,
}

impl PostgresExecutionStore {
    /// Creates a new PostgreSQL execution store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_execution(row: PgRow) -> Result<TourExecution> {
        let status = decode_status(&row.try_get::<String, _>("status")?)?;
        let key_points: serde_json::Value = row.try_get("completed_key_points")?;
        let completed_key_points: Vec<CompletedKeyPoint> = serde_json::from_value(key_points)?;

        Ok(TourExecution {
            id: ExecutionId::from_uuid(row.try_get::<Uuid, _>("id")?),
            tour_id: TourId::new(row.try_get::<String, _>("tour_id")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            status,
            completed_key_points,
            start_time: row.try_get("start_time")?,
            last_activity: row.try_get("last_activity")?,
            end_time: row.try_get("end_time")?,
        })
    }
}

#[async_trait]
impl ExecutionStore for PostgresExecutionStore {
    async fn get_by_id(&self, id: ExecutionId) -> Result<Option<TourExecution>> {
        let row = sqlx::query(
            r#"
            SELECT id, tour_id, user_id, status, completed_key_points, start_time, last_activity, end_time
            FROM tour_executions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_execution).transpose()
    }

    async fn get_active_by_user(&self, user_id: &UserId) -> Result<Option<TourExecution>> {
        let row = sqlx::query(
            r#"
            SELECT id, tour_id, user_id, status, completed_key_points, start_time, last_activity, end_time
            FROM tour_executions
            WHERE user_id = $1 AND status = 'Active'
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_execution).transpose()
    }

    #[tracing::instrument(skip(self, execution), fields(execution_id = %execution.id))]
    async fn create(&self, execution: &TourExecution) -> Result<()> {
        let key_points = serde_json::to_value(&execution.completed_key_points)?;

        sqlx::query(
            r#"
            INSERT INTO tour_executions (id, tour_id, user_id, status, completed_key_points, start_time, last_activity, end_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(execution.id.as_uuid())
        .bind(execution.tour_id.as_str())
        .bind(execution.user_id.as_str())
        .bind(execution.status.as_str())
        .bind(key_points)
        .bind(execution.start_time)
        .bind(execution.last_activity)
        .bind(execution.end_time)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // The partial unique index decides which concurrent start wins
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(ACTIVE_EXECUTION_INDEX)
            {
                tracing::debug!(user_id = %execution.user_id, "active execution already exists");
                return StoreError::ActiveExecutionExists {
                    user_id: execution.user_id.clone(),
                };
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    #[tracing::instrument(skip(self, execution), fields(execution_id = %execution.id, status = %execution.status))]
    async fn update(&self, execution: &TourExecution) -> Result<()> {
        let key_points = serde_json::to_value(&execution.completed_key_points)?;

        let result = sqlx::query(
            r#"
            UPDATE tour_executions
            SET status = $2, completed_key_points = $3, last_activity = $4, end_time = $5
            WHERE id = $1 AND status = 'Active'
            "#,
        )
        .bind(execution.id.as_uuid())
        .bind(execution.status.as_str())
        .bind(key_points)
        .bind(execution.last_activity)
        .bind(execution.end_time)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tour_executions WHERE id = $1)")
                    .bind(execution.id.as_uuid())
                    .fetch_one(&self.pool)
                    .await?;

            return Err(if exists {
                StoreError::ExecutionFinished(execution.id)
            } else {
                StoreError::ExecutionNotFound(execution.id)
            });
        }

        Ok(())
    }
}

/// PostgreSQL-backed follow graph.
#[derive(Clone)]
pub struct PostgresFollowGraph {
    pool: PgPool,
}

impl PostgresFollowGraph {
    /// Creates a new PostgreSQL follow graph.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn user_ids(&self, sql: &str, user_id: &UserId) -> Result<Vec<UserId>> {
        let ids: Vec<String> = sqlx::query_scalar(sql)
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().map(UserId::new).collect())
    }
}

#[async_trait]
impl FollowGraphStore for PostgresFollowGraph {
    async fn create_edge(&self, follower_id: &UserId, following_id: &UserId) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO follows (follower_id, following_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (follower_id, following_id) DO NOTHING
            "#,
        )
        .bind(follower_id.as_str())
        .bind(following_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_edge(&self, follower_id: &UserId, following_id: &UserId) -> Result<()> {
        let result =
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
                .bind(follower_id.as_str())
                .bind(following_id.as_str())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::FollowEdgeNotFound {
                follower_id: follower_id.clone(),
                following_id: following_id.clone(),
            });
        }
        Ok(())
    }

    async fn exists(&self, follower_id: &UserId, following_id: &UserId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(follower_id.as_str())
        .bind(following_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn followers(&self, user_id: &UserId) -> Result<Vec<UserId>> {
        self.user_ids(
            "SELECT follower_id FROM follows WHERE following_id = $1 ORDER BY follower_id",
            user_id,
        )
        .await
    }

    async fn following(&self, user_id: &UserId) -> Result<Vec<UserId>> {
        self.user_ids(
            "SELECT following_id FROM follows WHERE follower_id = $1 ORDER BY following_id",
            user_id,
        )
        .await
    }

    async fn recommendations(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let rows = sqlx::query(
            r#"
            SELECT theirs.following_id AS user_id, COUNT(*) AS mutual_followers
            FROM follows mine
            JOIN follows theirs ON theirs.follower_id = mine.following_id
            WHERE mine.follower_id = $1
              AND theirs.following_id <> $1
              AND NOT EXISTS (
                  SELECT 1 FROM follows existing
                  WHERE existing.follower_id = $1 AND existing.following_id = theirs.following_id
              )
            GROUP BY theirs.following_id
            ORDER BY mutual_followers DESC, user_id
            LIMIT $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<Recommendation> {
                let mutual: i64 = row.try_get("mutual_followers")?;
                Ok(Recommendation::new(
                    UserId::new(row.try_get::<String, _>("user_id")?),
                    u64::try_from(mutual).unwrap_or_default(),
                ))
            })
            .collect()
    }
}
