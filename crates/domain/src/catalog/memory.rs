use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{KeyPoint, TourId};

use super::ToursCatalog;
use crate::error::DomainError;

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    tours: HashMap<TourId, Vec<KeyPoint>>,
    fail_on_fetch: bool,
}

/// In-memory tours catalog for testing and for running without the tours service.
///
/// Unknown tours have no key points.
#[derive(Debug, Clone, Default)]
pub struct InMemoryToursCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryToursCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ordered key points of a tour, replacing any previous ones.
    pub fn set_key_points(&self, tour_id: impl Into<TourId>, key_points: Vec<KeyPoint>) {
        if let Ok(mut state) = self.state.write() {
            state.tours.insert(tour_id.into(), key_points);
        }
    }

    /// Configures the catalog to fail every fetch.
    pub fn set_fail_on_fetch(&self, fail: bool) {
        if let Ok(mut state) = self.state.write() {
            state.fail_on_fetch = fail;
        }
    }
}

#[async_trait]
impl ToursCatalog for InMemoryToursCatalog {
    async fn ordered_key_points(&self, tour_id: &TourId) -> Result<Vec<KeyPoint>, DomainError> {
        let state = self
            .state
            .read()
            .map_err(|_| DomainError::Upstream("tours catalog state poisoned".to_string()))?;

        if state.fail_on_fetch {
            return Err(DomainError::Upstream(
                "tours catalog unavailable".to_string(),
            ));
        }

        Ok(state.tours.get(tour_id).cloned().unwrap_or_default())
    }
}
