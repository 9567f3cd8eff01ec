use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::DispatchError;
use crate::models::TechnicianCandidate;
use crate::services::store::DispatchStore;

pub struct CandidatePoolLoader {
    store: Arc<dyn DispatchStore>,
}

impl CandidatePoolLoader {
    pub fn new(store: Arc<dyn DispatchStore>) -> Self {
        Self { store }
    }

    /// Load every technician that is online with an assigned kit.
    ///
    /// An empty pool is a valid result. Store errors are returned as
    /// `LoadFailure` without retrying.
    pub async fn load_candidates(&self) -> Result<Vec<TechnicianCandidate>, DispatchError> {
        let fetched = self.store.fetch_online_assigned_technicians().await?;
        let fetched_count = fetched.len();

        let candidates: Vec<TechnicianCandidate> = fetched
            .into_iter()
            .filter(|technician| {
                if technician.is_dispatchable() {
                    true
                } else {
                    warn!(
                        "Dropping technician {} from pool: availability={:?}, kit_status={:?}",
                        technician.id, technician.availability, technician.kit_status
                    );
                    false
                }
            })
            .map(|mut technician| {
                technician.distance_km = None;
                technician
            })
            .collect();

        if candidates.len() != fetched_count {
            debug!("{} of {} fetched technicians are dispatchable", candidates.len(), fetched_count);
        }

        info!("Loaded candidate pool of {} technicians", candidates.len());
        Ok(candidates)
    }
}
