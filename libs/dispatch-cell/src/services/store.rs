use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::DispatchError;
use crate::models::{
    AppointmentStatus, AppointmentWindow, GeoPoint, KitStatus, TechnicianAvailability,
    TechnicianCandidate,
};

/// Read-only view of technician, appointment and address data that the
/// dispatch engine works from.
#[async_trait]
pub trait DispatchStore: Send + Sync {
    async fn fetch_online_assigned_technicians(&self) -> Result<Vec<TechnicianCandidate>, DispatchError>;

    /// Appointments in an active status (booked, confirmed, in progress).
    async fn fetch_active_appointments(&self, technician_id: Uuid) -> Result<Vec<AppointmentWindow>, DispatchError>;

    async fn fetch_address_geo(&self, address_id: &str) -> Result<Option<GeoPoint>, DispatchError>;
}

#[derive(Debug, Deserialize)]
struct TechnicianRow {
    id: Uuid,
    availability: TechnicianAvailability,
    kit_status: KitStatus,
    #[serde(default)]
    coverage_areas: Option<Vec<String>>,
    #[serde(default)]
    last_lat: Option<f64>,
    #[serde(default)]
    last_lng: Option<f64>,
}

impl From<TechnicianRow> for TechnicianCandidate {
    fn from(row: TechnicianRow) -> Self {
        let last_known_position = match (row.last_lat, row.last_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        };

        Self {
            id: row.id,
            availability: row.availability,
            kit_status: row.kit_status,
            coverage_areas: row.coverage_areas.unwrap_or_default(),
            last_known_position,
            distance_km: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddressRow {
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
}

/// `DispatchStore` backed by the platform's Supabase PostgREST tables.
pub struct SupabaseDispatchStore {
    supabase: SupabaseClient,
    auth_token: Option<String>,
}

impl SupabaseDispatchStore {
    pub fn new(config: &AppConfig, auth_token: Option<String>) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            auth_token,
        }
    }

    fn load_failure(what: &str, err: impl std::fmt::Display) -> DispatchError {
        error!("Failed to load {}: {}", what, err);
        DispatchError::LoadFailure(format!("{}: {}", what, err))
    }
}

#[async_trait]
impl DispatchStore for SupabaseDispatchStore {
    async fn fetch_online_assigned_technicians(&self) -> Result<Vec<TechnicianCandidate>, DispatchError> {
        let path = "/rest/v1/technicians?availability=eq.online&kit_status=eq.assigned\
                    &select=id,availability,kit_status,coverage_areas,last_lat,last_lng";

        let rows: Vec<TechnicianRow> = self.supabase
            .select(path, self.auth_token.as_deref())
            .await
            .map_err(|e| Self::load_failure("technicians", e))?;

        debug!("Fetched {} online technicians with assigned kits", rows.len());
        Ok(rows.into_iter().map(TechnicianCandidate::from).collect())
    }

    async fn fetch_active_appointments(&self, technician_id: Uuid) -> Result<Vec<AppointmentWindow>, DispatchError> {
        let statuses = AppointmentStatus::ACTIVE
            .iter()
            .map(|status| status.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let path = format!(
            "/rest/v1/appointments?technician_id=eq.{}&status=in.({})\
             &select=technician_id,status,start_at,end_at&order=start_at.asc",
            technician_id, statuses
        );

        let appointments: Vec<AppointmentWindow> = self.supabase
            .select(&path, self.auth_token.as_deref())
            .await
            .map_err(|e| Self::load_failure("appointments", e))?;

        debug!("Fetched {} active appointments for technician {}", appointments.len(), technician_id);
        Ok(appointments)
    }

    async fn fetch_address_geo(&self, address_id: &str) -> Result<Option<GeoPoint>, DispatchError> {
        let path = format!(
            "/rest/v1/addresses?id=eq.{}&select=id,lat,lng",
            urlencoding::encode(address_id)
        );

        let rows: Vec<AddressRow> = self.supabase
            .select(&path, self.auth_token.as_deref())
            .await
            .map_err(|e| Self::load_failure("address", e))?;

        let geo = rows.into_iter().next().and_then(|row| match (row.lat, row.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        });

        if geo.is_none() {
            debug!("Address {} has no stored geo-coordinates", address_id);
        }

        Ok(geo)
    }
}
