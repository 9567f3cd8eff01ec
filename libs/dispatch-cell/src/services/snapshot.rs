use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DispatchError;
use crate::models::{AppointmentWindow, GeoPoint, TechnicianCandidate};
use crate::services::store::DispatchStore;

/// In-memory `DispatchStore` over data the caller has already fetched.
///
/// Applies the same filters the database queries do, so it can stand in for
/// the Supabase store wherever a pre-loaded snapshot is available.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    technicians: Vec<TechnicianCandidate>,
    appointments: Vec<AppointmentWindow>,
    addresses: HashMap<String, GeoPoint>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_technician(mut self, technician: TechnicianCandidate) -> Self {
        self.technicians.push(technician);
        self
    }

    pub fn with_appointment(mut self, appointment: AppointmentWindow) -> Self {
        self.appointments.push(appointment);
        self
    }

    pub fn with_address(mut self, address_id: &str, geo: GeoPoint) -> Self {
        self.addresses.insert(address_id.to_string(), geo);
        self
    }
}

#[async_trait]
impl DispatchStore for SnapshotStore {
    async fn fetch_online_assigned_technicians(&self) -> Result<Vec<TechnicianCandidate>, DispatchError> {
        Ok(self.technicians
            .iter()
            .filter(|technician| technician.is_dispatchable())
            .cloned()
            .collect())
    }

    async fn fetch_active_appointments(&self, technician_id: Uuid) -> Result<Vec<AppointmentWindow>, DispatchError> {
        let mut appointments: Vec<AppointmentWindow> = self.appointments
            .iter()
            .filter(|apt| apt.technician_id == technician_id && apt.status.is_active())
            .cloned()
            .collect();
        appointments.sort_by_key(|apt| apt.start_at);
        Ok(appointments)
    }

    async fn fetch_address_geo(&self, address_id: &str) -> Result<Option<GeoPoint>, DispatchError> {
        Ok(self.addresses.get(address_id).copied())
    }
}
