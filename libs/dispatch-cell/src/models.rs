use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DispatchError;

// ==============================================================================
// GEOGRAPHY
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

// ==============================================================================
// TECHNICIANS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TechnicianAvailability {
    Online,
    Busy,
    Offline,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum KitStatus {
    Assigned,
    Unassigned,
    Maintenance,
    Retired,
    #[serde(other)]
    Unknown,
}

/// Read-only snapshot of a field technician eligible for dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechnicianCandidate {
    pub id: Uuid,
    pub availability: TechnicianAvailability,
    pub kit_status: KitStatus,
    pub coverage_areas: Vec<String>,
    pub last_known_position: Option<GeoPoint>,
    /// Kilometres to the dispatch target. Only set while ranking against a
    /// resolved target; `None` otherwise.
    #[serde(skip)]
    pub distance_km: Option<f64>,
}

impl TechnicianCandidate {
    pub fn is_dispatchable(&self) -> bool {
        self.availability == TechnicianAvailability::Online
            && self.kit_status == KitStatus::Assigned
    }

    pub fn covers(&self, area_code: &str) -> bool {
        self.coverage_areas.iter().any(|area| area == area_code)
    }

    /// Sort key used by distance ranking. Unknown distance sorts last.
    pub fn distance_sort_key(&self) -> f64 {
        self.distance_km.unwrap_or(f64::INFINITY)
    }
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Booked,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
    #[serde(other)]
    Unknown,
}

impl AppointmentStatus {
    pub const ACTIVE: [AppointmentStatus; 3] = [
        AppointmentStatus::Booked,
        AppointmentStatus::Confirmed,
        AppointmentStatus::InProgress,
    ];

    /// Whether the appointment occupies the technician's schedule.
    pub fn is_active(&self) -> bool {
        matches!(self,
            AppointmentStatus::Booked |
            AppointmentStatus::Confirmed |
            AppointmentStatus::InProgress
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Booked => write!(f, "booked"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
            AppointmentStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentWindow {
    pub technician_id: Uuid,
    pub status: AppointmentStatus,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

// ==============================================================================
// DISPATCH REQUEST / RESULT
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchRequest {
    #[serde(default)]
    pub area_code: Option<String>,
    #[serde(default)]
    pub address_id: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    pub start_at: DateTime<Utc>,
}

impl DispatchRequest {
    pub fn at(start_at: DateTime<Utc>) -> Self {
        Self {
            area_code: None,
            address_id: None,
            lat: None,
            lng: None,
            start_at,
        }
    }

    pub fn with_area(mut self, area_code: &str) -> Self {
        self.area_code = Some(area_code.to_string());
        self
    }

    pub fn with_position(mut self, lat: f64, lng: f64) -> Self {
        self.lat = Some(lat);
        self.lng = Some(lng);
        self
    }

    pub fn with_address(mut self, address_id: &str) -> Self {
        self.address_id = Some(address_id.to_string());
        self
    }

    /// Explicit coordinates, when both halves were supplied and in range.
    pub fn explicit_position(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)).filter(GeoPoint::is_valid),
            _ => None,
        }
    }

    /// Area code, with a blank tag read as no area code.
    pub fn area(&self) -> Option<&str> {
        self.area_code.as_deref().map(str::trim).filter(|code| !code.is_empty())
    }

    /// Address reference, with a blank id read as no address.
    pub fn address(&self) -> Option<&str> {
        self.address_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    /// Strict shape check for requests arriving over HTTP. The engine itself
    /// reads malformed geodata leniently through `area`, `address` and
    /// `explicit_position`.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if matches!(&self.area_code, Some(code) if code.trim().is_empty()) {
            return Err(DispatchError::ValidationError("area_code must not be empty".to_string()));
        }

        if matches!(&self.address_id, Some(id) if id.trim().is_empty()) {
            return Err(DispatchError::ValidationError("address_id must not be empty".to_string()));
        }

        match (self.lat, self.lng) {
            (Some(_), None) | (None, Some(_)) => Err(DispatchError::ValidationError(
                "lat and lng must be provided together".to_string(),
            )),
            (Some(lat), Some(lng)) if !GeoPoint::new(lat, lng).is_valid() => {
                Err(DispatchError::ValidationError(format!(
                    "coordinates out of range: ({}, {})", lat, lng
                )))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult {
    Assigned(TechnicianCandidate),
    NoTechnicianAvailable,
}

impl DispatchResult {
    pub fn is_assigned(&self) -> bool {
        matches!(self, DispatchResult::Assigned(_))
    }

    pub fn technician(&self) -> Option<&TechnicianCandidate> {
        match self {
            DispatchResult::Assigned(technician) => Some(technician),
            DispatchResult::NoTechnicianAvailable => None,
        }
    }

    pub fn into_technician(self) -> Option<TechnicianCandidate> {
        match self {
            DispatchResult::Assigned(technician) => Some(technician),
            DispatchResult::NoTechnicianAvailable => None,
        }
    }
}

/// Body returned by the dispatch endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub assigned: bool,
    pub technician: Option<TechnicianCandidate>,
    pub distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<DispatchResult> for DispatchResponse {
    fn from(result: DispatchResult) -> Self {
        match result {
            DispatchResult::Assigned(technician) => Self {
                assigned: true,
                distance_km: technician.distance_km,
                technician: Some(technician),
                reason: None,
            },
            DispatchResult::NoTechnicianAvailable => Self {
                assigned: false,
                technician: None,
                distance_km: None,
                reason: Some("no_technician_available".to_string()),
            },
        }
    }
}
