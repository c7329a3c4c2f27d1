//! Follow, unfollow and follow graph queries.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::UserId;
use saga::SagaState;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::principal::Principal;

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub following_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    pub limit: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnfollowResponse {
    pub message: &'static str,
    pub saga_id: String,
    pub saga_state: SagaState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub user_id: UserId,
    pub user_ids: Vec<UserId>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsFollowingResponse {
    pub is_following: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub user_id: UserId,
    pub mutual_followers: u64,
    pub reason: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsResponse {
    pub user_id: UserId,
    pub recommendations: Vec<RecommendationResponse>,
    pub count: usize,
}

// -- Handlers --

/// POST /api/follow: the caller follows `followingId`.
#[tracing::instrument(skip(state))]
pub async fn follow(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(req): Json<FollowRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .follows
        .follow(&principal.user_id, &UserId::new(req.following_id))
        .await?;

    Ok(Json(MessageResponse {
        message: "Successfully followed user",
    }))
}

/// POST /api/unfollow: runs the unfollow saga for the caller.
#[tracing::instrument(skip(state))]
pub async fn unfollow(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(req): Json<FollowRequest>,
) -> Result<Json<UnfollowResponse>, ApiError> {
    let run = state
        .unfollow
        .unfollow(&principal.user_id, &UserId::new(req.following_id))
        .await?;

    Ok(Json(UnfollowResponse {
        message: "Successfully unfollowed user",
        saga_id: run.saga_id.to_string(),
        saga_state: run.state,
    }))
}

/// GET /api/users/{userId}/followers
#[tracing::instrument(skip(state))]
pub async fn followers(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserListResponse>, ApiError> {
    let user_id = UserId::new(user_id);
    let user_ids = state.follows.followers(&user_id).await?;
    Ok(Json(list_response(user_id, user_ids)))
}

/// GET /api/users/{userId}/following
#[tracing::instrument(skip(state))]
pub async fn following(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserListResponse>, ApiError> {
    let user_id = UserId::new(user_id);
    let user_ids = state.follows.following(&user_id).await?;
    Ok(Json(list_response(user_id, user_ids)))
}

/// GET /api/users/{userId}/is-following: does the caller follow `userId`?
#[tracing::instrument(skip(state))]
pub async fn is_following(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(user_id): Path<String>,
) -> Result<Json<IsFollowingResponse>, ApiError> {
    let is_following = state
        .follows
        .is_following(&principal.user_id, &UserId::new(user_id))
        .await?;
    Ok(Json(IsFollowingResponse { is_following }))
}

/// GET /api/users/{userId}/recommendations?limit=
///
/// An unparsable `limit` is treated as absent.
#[tracing::instrument(skip(state))]
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<RecommendationsQuery>,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let user_id = UserId::new(user_id);
    let limit = query.limit.and_then(|limit| limit.parse::<usize>().ok());

    let recommendations: Vec<RecommendationResponse> = state
        .follows
        .recommendations(&user_id, limit)
        .await?
        .into_iter()
        .map(|rec| RecommendationResponse {
            reason: rec.reason(),
            user_id: rec.user_id,
            mutual_followers: rec.mutual_followers,
        })
        .collect();

    Ok(Json(RecommendationsResponse {
        user_id,
        count: recommendations.len(),
        recommendations,
    }))
}

fn list_response(user_id: UserId, user_ids: Vec<UserId>) -> UserListResponse {
    UserListResponse {
        user_id,
        count: user_ids.len(),
        user_ids,
    }
}
