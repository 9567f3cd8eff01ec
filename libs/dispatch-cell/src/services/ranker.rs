use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::DispatchError;
use crate::models::{DispatchRequest, GeoPoint, TechnicianCandidate};
use crate::services::geo::haversine_km;
use crate::services::store::DispatchStore;

pub struct AreaDistanceRanker {
    store: Arc<dyn DispatchStore>,
}

impl AreaDistanceRanker {
    pub fn new(store: Arc<dyn DispatchStore>) -> Self {
        Self { store }
    }

    /// Order the pool for `request`: in-area technicians first (or the whole
    /// pool if nobody covers the area), nearest first when a target position
    /// can be resolved.
    pub async fn rank(
        &self,
        candidates: Vec<TechnicianCandidate>,
        request: &DispatchRequest,
    ) -> Result<Vec<TechnicianCandidate>, DispatchError> {
        let target = self.resolve_target(request).await?;
        Ok(rank_candidates(candidates, request.area(), target))
    }

    /// Explicit coordinates win; otherwise the referenced address's stored
    /// geo-coordinates; otherwise no target.
    pub async fn resolve_target(&self, request: &DispatchRequest) -> Result<Option<GeoPoint>, DispatchError> {
        if let Some(position) = request.explicit_position() {
            return Ok(Some(position));
        }

        let Some(address_id) = request.address() else {
            return Ok(None);
        };

        match self.store.fetch_address_geo(address_id).await? {
            Some(geo) if geo.is_valid() => Ok(Some(geo)),
            Some(geo) => {
                warn!("Address {} has invalid coordinates {:?}, skipping distance ranking", address_id, geo);
                Ok(None)
            }
            None => {
                debug!("Address {} did not resolve to coordinates, skipping distance ranking", address_id);
                Ok(None)
            }
        }
    }
}

/// Pure ranking step. Never drops the whole pool: the area filter only
/// applies when at least one candidate covers the area.
pub fn rank_candidates(
    candidates: Vec<TechnicianCandidate>,
    area_code: Option<&str>,
    target: Option<GeoPoint>,
) -> Vec<TechnicianCandidate> {
    let mut working_set = match area_code {
        Some(area) => {
            let (in_area, out_of_area): (Vec<_>, Vec<_>) = candidates
                .into_iter()
                .partition(|candidate| candidate.covers(area));

            if in_area.is_empty() {
                debug!("No technician covers area '{}', falling back to all {} candidates", area, out_of_area.len());
                out_of_area
            } else {
                debug!("{} technicians cover area '{}'", in_area.len(), area);
                in_area
            }
        }
        None => candidates,
    };

    let Some(target) = target else {
        debug!("No target position, keeping load order");
        return working_set;
    };

    for candidate in working_set.iter_mut() {
        candidate.distance_km = candidate
            .last_known_position
            .filter(GeoPoint::is_valid)
            .map(|position| haversine_km(position, target));
    }

    working_set.sort_by(|a, b| a.distance_sort_key().total_cmp(&b.distance_sort_key()));
    working_set
}
