//! Tours catalog capability: the ordered key points of a tour.

mod http;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use common::{KeyPoint, TourId};

use crate::error::DomainError;

pub use http::{DEFAULT_CATALOG_TIMEOUT, HttpToursCatalog};
pub use memory::InMemoryToursCatalog;

/// Read-only view of the tours catalog.
#[async_trait]
pub trait ToursCatalog: Send + Sync {
    /// Returns the tour's key points in visiting order.
    ///
    /// Failures of the remote catalog are reported as `DomainError::Upstream`.
    async fn ordered_key_points(&self, tour_id: &TourId) -> Result<Vec<KeyPoint>, DomainError>;
}

#[async_trait]
impl<T: ToursCatalog + ?Sized> ToursCatalog for Arc<T> {
    async fn ordered_key_points(&self, tour_id: &TourId) -> Result<Vec<KeyPoint>, DomainError> {
        (**self).ordered_key_points(tour_id).await
    }
}
