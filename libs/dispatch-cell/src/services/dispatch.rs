use std::sync::Arc;

use tracing::{debug, info};

use crate::error::DispatchError;
use crate::models::{DispatchRequest, DispatchResult};
use crate::services::loader::CandidatePoolLoader;
use crate::services::ranker::AreaDistanceRanker;
use crate::services::resolver::ConflictResolver;
use crate::services::store::DispatchStore;

/// Selects a field technician for a home-visit request.
///
/// Runs load, rank and resolve in sequence against read-only store data and
/// returns a decision. It never writes: persisting the assignment, and
/// guarding against two concurrent dispatches picking the same technician,
/// belong to the caller.
pub struct DispatchEngine {
    loader: CandidatePoolLoader,
    ranker: AreaDistanceRanker,
    resolver: ConflictResolver,
}

impl DispatchEngine {
    pub fn new(store: Arc<dyn DispatchStore>) -> Self {
        Self {
            loader: CandidatePoolLoader::new(store.clone()),
            ranker: AreaDistanceRanker::new(store.clone()),
            resolver: ConflictResolver::new(store),
        }
    }

    pub async fn dispatch(&self, request: &DispatchRequest) -> Result<DispatchResult, DispatchError> {
        debug!("Dispatching technician for area {:?} at {}", request.area(), request.start_at);

        let candidates = self.loader.load_candidates().await?;
        if candidates.is_empty() {
            info!("Candidate pool is empty, no technician available");
            return Ok(DispatchResult::NoTechnicianAvailable);
        }

        let ranked = self.ranker.rank(candidates, request).await?;
        self.resolver.resolve(&ranked, request).await
    }
}
