//! Like-removal service trait, in-memory implementation and HTTP client.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::UserId;
use serde::{Deserialize, Serialize};

use crate::error::SagaError;

/// Default client-level timeout for blog service calls.
pub const DEFAULT_BLOG_TIMEOUT: Duration = Duration::from_secs(30);

/// Removes a user's likes from every post of an author.
#[async_trait]
pub trait LikeRemovalService: Send + Sync {
    async fn remove_likes(&self, user_id: &UserId, author_id: &UserId) -> Result<(), SagaError>;
}

#[async_trait]
impl<T: LikeRemovalService + ?Sized> LikeRemovalService for Arc<T> {
    async fn remove_likes(&self, user_id: &UserId, author_id: &UserId) -> Result<(), SagaError> {
        (**self).remove_likes(user_id, author_id).await
    }
}

#[derive(Debug, Default)]
struct InMemoryLikeState {
    // (user, author) -> number of the author's posts the user likes
    likes: HashMap<(UserId, UserId), usize>,
    fail_on_remove: bool,
    remove_calls: usize,
}

/// In-memory like service for testing and running without a blog service.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLikeService {
    state: Arc<RwLock<InMemoryLikeState>>,
}

impl InMemoryLikeService {
    /// Creates a new in-memory like service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `user_id` liked one of `author_id`'s posts.
    pub fn add_like(&self, user_id: impl Into<UserId>, author_id: impl Into<UserId>) {
        if let Ok(mut state) = self.state.write() {
            *state
                .likes
                .entry((user_id.into(), author_id.into()))
                .or_default() += 1;
        }
    }

    /// Number of `author_id`'s posts liked by `user_id`.
    pub fn like_count(&self, user_id: &UserId, author_id: &UserId) -> usize {
        self.state
            .read()
            .ok()
            .and_then(|state| {
                state
                    .likes
                    .get(&(user_id.clone(), author_id.clone()))
                    .copied()
            })
            .unwrap_or(0)
    }

    /// Configures the service to fail every removal.
    pub fn set_fail_on_remove(&self, fail: bool) {
        if let Ok(mut state) = self.state.write() {
            state.fail_on_remove = fail;
        }
    }

    /// Number of removal requests received, failed ones included.
    pub fn remove_calls(&self) -> usize {
        self.state.read().map(|state| state.remove_calls).unwrap_or(0)
    }
}

#[async_trait]
impl LikeRemovalService for InMemoryLikeService {
    async fn remove_likes(&self, user_id: &UserId, author_id: &UserId) -> Result<(), SagaError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| SagaError::LikeService("like state poisoned".to_string()))?;
        state.remove_calls += 1;

        if state.fail_on_remove {
            return Err(SagaError::LikeService(
                "blog service unavailable".to_string(),
            ));
        }

        state.likes.remove(&(user_id.clone(), author_id.clone()));
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoveLikesRequest<'a> {
    user_id: &'a str,
    author_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct BlogServiceResponse {
    #[serde(default)]
    message: String,
    success: bool,
}

/// Like service backed by the blog service
/// (`DELETE {base}/api/blogs/remove-likes`).
#[derive(Debug, Clone)]
pub struct HttpLikeRemovalClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpLikeRemovalClient {
    /// Creates a blog client with the given per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SagaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SagaError::LikeService(format!("failed to build blog client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl LikeRemovalService for HttpLikeRemovalClient {
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn remove_likes(&self, user_id: &UserId, author_id: &UserId) -> Result<(), SagaError> {
        let url = format!("{}/api/blogs/remove-likes", self.base_url);
        let body = RemoveLikesRequest {
            user_id: user_id.as_str(),
            author_id: author_id.as_str(),
        };

        let response = self
            .client
            .delete(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SagaError::LikeService(format!("failed to send request: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SagaError::LikeService(format!(
                "blog service returned status {}",
                status.as_u16()
            )));
        }

        let envelope: BlogServiceResponse = response
            .json()
            .await
            .map_err(|e| SagaError::LikeService(format!("failed to decode response: {e}")))?;

        if !envelope.success {
            return Err(SagaError::LikeService(format!(
                "blog service operation failed: {}",
                envelope.message
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::delete;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_in_memory_remove_likes() {
        let service = InMemoryLikeService::new();
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");
        service.add_like("alice", "bob");
        service.add_like("alice", "bob");
        service.add_like("carol", "bob");

        assert_eq!(service.like_count(&alice, &bob), 2);
        service.remove_likes(&alice, &bob).await.unwrap();

        assert_eq!(service.like_count(&alice, &bob), 0);
        assert_eq!(service.like_count(&UserId::new("carol"), &bob), 1);
        assert_eq!(service.remove_calls(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_fail_on_remove() {
        let service = InMemoryLikeService::new();
        service.add_like("alice", "bob");
        service.set_fail_on_remove(true);

        let result = service
            .remove_likes(&UserId::new("alice"), &UserId::new("bob"))
            .await;

        assert!(matches!(result, Err(SagaError::LikeService(_))));
        assert_eq!(
            service.like_count(&UserId::new("alice"), &UserId::new("bob")),
            1
        );
    }

    async fn remove_likes_handler(Json(body): Json<Value>) -> axum::response::Response {
        match body["authorId"].as_str() {
            Some("author-ok") if body["userId"] == "user-1" => {
                Json(json!({"success": true, "message": "likes removed"})).into_response()
            }
            Some("author-refused") => {
                Json(json!({"success": false, "message": "author not found"})).into_response()
            }
            Some("author-created") => {
                (StatusCode::CREATED, Json(json!({"success": true, "message": ""}))).into_response()
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }

    async fn spawn_blog_server() -> String {
        let app = Router::new().route("/api/blogs/remove-likes", delete(remove_likes_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn remove(author: &str) -> Result<(), SagaError> {
        let client = HttpLikeRemovalClient::new(spawn_blog_server().await, DEFAULT_BLOG_TIMEOUT)
            .unwrap();
        client
            .remove_likes(&UserId::new("user-1"), &UserId::new(author))
            .await
    }

    #[tokio::test]
    async fn test_http_success_envelope() {
        remove("author-ok").await.unwrap();
    }

    #[tokio::test]
    async fn test_http_unsuccessful_envelope_carries_message() {
        match remove("author-refused").await {
            Err(SagaError::LikeService(msg)) => {
                assert_eq!(msg, "blog service operation failed: author not found")
            }
            other => panic!("expected like service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_error_status() {
        match remove("author-broken").await {
            Err(SagaError::LikeService(msg)) => {
                assert_eq!(msg, "blog service returned status 500")
            }
            other => panic!("expected like service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_only_200_is_success() {
        assert!(matches!(
            remove("author-created").await,
            Err(SagaError::LikeService(_))
        ));
    }

    #[tokio::test]
    async fn test_http_unreachable() {
        let client =
            HttpLikeRemovalClient::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        let result = client
            .remove_likes(&UserId::new("user-1"), &UserId::new("author-ok"))
            .await;
        assert!(matches!(result, Err(SagaError::LikeService(_))));
    }
}
