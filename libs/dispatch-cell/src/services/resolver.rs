use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::error::DispatchError;
use crate::models::{AppointmentWindow, DispatchRequest, DispatchResult, TechnicianCandidate};
use crate::services::store::DispatchStore;

/// Nominal length of a home visit.
pub const VISIT_DURATION_MINUTES: i64 = 60;

/// Travel margin kept free on both sides of a visit.
pub const ADJACENCY_BUFFER_MINUTES: i64 = 60;

/// The top candidate plus one fallback.
pub const MAX_CANDIDATES_EVALUATED: usize = 2;

pub struct ConflictResolver {
    store: Arc<dyn DispatchStore>,
}

impl ConflictResolver {
    pub fn new(store: Arc<dyn DispatchStore>) -> Self {
        Self { store }
    }

    /// Pick the first conflict-free technician among the top two ranked
    /// candidates. Candidates further down the list are never considered.
    pub async fn resolve(
        &self,
        ranked: &[TechnicianCandidate],
        request: &DispatchRequest,
    ) -> Result<DispatchResult, DispatchError> {
        if ranked.is_empty() {
            info!("No candidates to evaluate for slot at {}", request.start_at);
            return Ok(DispatchResult::NoTechnicianAvailable);
        }

        for (rank, candidate) in ranked.iter().take(MAX_CANDIDATES_EVALUATED).enumerate() {
            let appointments = self.store.fetch_active_appointments(candidate.id).await?;

            if slot_conflicts(request.start_at, &appointments) {
                warn!("Technician {} (rank {}) has a conflicting booking at {}",
                      candidate.id, rank + 1, request.start_at);
                continue;
            }

            info!("Selected technician {} (rank {}) for slot at {}",
                  candidate.id, rank + 1, request.start_at);
            return Ok(DispatchResult::Assigned(candidate.clone()));
        }

        info!("No technician available for slot at {} after evaluating {} candidates",
              request.start_at, ranked.len().min(MAX_CANDIDATES_EVALUATED));
        Ok(DispatchResult::NoTechnicianAvailable)
    }
}

/// Whether a visit starting at `start_at` collides with any active
/// appointment, either by starting inside one or by its buffered window
/// [start - buffer, start + duration + buffer) overlapping one.
pub fn slot_conflicts(start_at: DateTime<Utc>, appointments: &[AppointmentWindow]) -> bool {
    let buffer = Duration::minutes(ADJACENCY_BUFFER_MINUTES);
    let window_start = start_at - buffer;
    let window_end = start_at + Duration::minutes(VISIT_DURATION_MINUTES) + buffer;

    appointments
        .iter()
        .filter(|apt| apt.status.is_active())
        .any(|apt| {
            let starts_inside = apt.start_at <= start_at && start_at < apt.end_at;
            let overlaps = window_start < apt.end_at && apt.start_at < window_end;

            if starts_inside || overlaps {
                debug!("Slot at {} collides with {} appointment [{}, {})",
                       start_at, apt.status, apt.start_at, apt.end_at);
            }
            starts_inside || overlaps
        })
}
