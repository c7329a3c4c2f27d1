use std::time::Duration;

use async_trait::async_trait;
use common::{KeyPoint, KeyPointId, TourId};
use serde::Deserialize;

use super::ToursCatalog;
use crate::error::DomainError;

/// Default client-level timeout for catalog calls.
pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TourResponse {
    #[serde(default)]
    key_points: Vec<KeyPointResponse>,
}

#[derive(Debug, Deserialize)]
struct KeyPointResponse {
    id: String,
    #[serde(default)]
    name: String,
    latitude: f64,
    longitude: f64,
}

/// Tours catalog backed by the tours service (`GET {base}/api/tours/{id}`).
#[derive(Debug, Clone)]
pub struct HttpToursCatalog {
    base_url: String,
    client: reqwest::Client,
}

impl HttpToursCatalog {
    /// Creates a catalog client with the given per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Upstream(format!("failed to build catalog client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl ToursCatalog for HttpToursCatalog {
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn ordered_key_points(&self, tour_id: &TourId) -> Result<Vec<KeyPoint>, DomainError> {
        let url = format!("{}/api/tours/{}", self.base_url, tour_id);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::warn!(error = %e, "tours catalog request failed");
            DomainError::Upstream(format!("could not get tour details: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::Upstream(format!(
                "tours catalog returned status {}",
                status.as_u16()
            )));
        }

        let tour: TourResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Upstream(format!("failed to decode tour: {e}")))?;

        Ok(tour
            .key_points
            .into_iter()
            .map(|kp| KeyPoint {
                id: KeyPointId::new(kp.id),
                name: kp.name,
                latitude: kp.latitude,
                longitude: kp.longitude,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;

    async fn tour_handler(Path(id): Path<String>) -> axum::response::Response {
        match id.as_str() {
            "tour-1" => axum::Json(serde_json::json!({
                "id": "tour-1",
                "name": "Old town",
                "keyPoints": [
                    {"id": "kp-1", "tourId": "tour-1", "name": "Fortress", "latitude": 44.7951, "longitude": 20.4568, "imageUrl": ""},
                    {"id": "kp-2", "tourId": "tour-1", "name": "Square", "latitude": 44.7828, "longitude": 20.4810, "imageUrl": ""}
                ]
            }))
            .into_response(),
            "broken" => (StatusCode::OK, "not json").into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn spawn_catalog_server() -> String {
        let app = Router::new().route("/api/tours/{id}", get(tour_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn fetches_key_points_in_order() {
        let base = spawn_catalog_server().await;
        let catalog = HttpToursCatalog::new(base, DEFAULT_CATALOG_TIMEOUT).unwrap();

        let key_points = catalog
            .ordered_key_points(&TourId::new("tour-1"))
            .await
            .unwrap();

        assert_eq!(key_points.len(), 2);
        assert_eq!(key_points[0].id, KeyPointId::new("kp-1"));
        assert_eq!(key_points[0].name, "Fortress");
        assert_eq!(key_points[1].id, KeyPointId::new("kp-2"));
    }

    #[tokio::test]
    async fn error_status_is_upstream_error() {
        let base = spawn_catalog_server().await;
        let catalog = HttpToursCatalog::new(base, DEFAULT_CATALOG_TIMEOUT).unwrap();

        let result = catalog.ordered_key_points(&TourId::new("missing")).await;
        match result {
            Err(DomainError::Upstream(msg)) => assert!(msg.contains("404")),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_upstream_error() {
        let base = spawn_catalog_server().await;
        let catalog = HttpToursCatalog::new(base, DEFAULT_CATALOG_TIMEOUT).unwrap();

        let result = catalog.ordered_key_points(&TourId::new("broken")).await;
        assert!(matches!(result, Err(DomainError::Upstream(_))));
    }

    #[tokio::test]
    async fn unreachable_catalog_is_upstream_error() {
        let catalog =
            HttpToursCatalog::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();

        let result = catalog.ordered_key_points(&TourId::new("tour-1")).await;
        assert!(matches!(result, Err(DomainError::Upstream(_))));
    }
}
