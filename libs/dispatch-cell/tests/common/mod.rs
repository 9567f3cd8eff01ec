#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use dispatch_cell::*;

pub const CAIRO: GeoPoint = GeoPoint { lat: 30.0444, lng: 31.2357 };

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
}

/// A point roughly `km` kilometres north of central Cairo.
pub fn north_of_cairo(km: f64) -> GeoPoint {
    GeoPoint::new(CAIRO.lat + km / 111.19, CAIRO.lng)
}

pub fn technician(areas: &[&str], position: Option<GeoPoint>) -> TechnicianCandidate {
    TechnicianCandidate {
        id: Uuid::new_v4(),
        availability: TechnicianAvailability::Online,
        kit_status: KitStatus::Assigned,
        coverage_areas: areas.iter().map(|a| a.to_string()).collect(),
        last_known_position: position,
        distance_km: None,
    }
}

pub fn booking(technician_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> AppointmentWindow {
    AppointmentWindow {
        technician_id,
        status: AppointmentStatus::Confirmed,
        start_at: start,
        end_at: end,
    }
}

/// Wraps a store and records which lookups the engine performed.
pub struct RecordingStore<S> {
    inner: S,
    pub technician_loads: AtomicUsize,
    pub address_lookups: AtomicUsize,
    pub appointment_lookups: Mutex<Vec<Uuid>>,
}

impl<S> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            technician_loads: AtomicUsize::new(0),
            address_lookups: AtomicUsize::new(0),
            appointment_lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn appointment_lookups(&self) -> Vec<Uuid> {
        self.appointment_lookups.lock().unwrap().clone()
    }

    pub fn address_lookup_count(&self) -> usize {
        self.address_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: DispatchStore> DispatchStore for RecordingStore<S> {
    async fn fetch_online_assigned_technicians(&self) -> Result<Vec<TechnicianCandidate>, DispatchError> {
        self.technician_loads.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_online_assigned_technicians().await
    }

    async fn fetch_active_appointments(&self, technician_id: Uuid) -> Result<Vec<AppointmentWindow>, DispatchError> {
        self.appointment_lookups.lock().unwrap().push(technician_id);
        self.inner.fetch_active_appointments(technician_id).await
    }

    async fn fetch_address_geo(&self, address_id: &str) -> Result<Option<GeoPoint>, DispatchError> {
        self.address_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_address_geo(address_id).await
    }
}

/// Which store call should fail.
#[derive(Clone, Copy, PartialEq)]
pub enum FailOn {
    Technicians,
    Appointments,
    Address,
}

pub struct FailingStore {
    pub inner: SnapshotStore,
    pub fail_on: FailOn,
}

impl FailingStore {
    fn check(&self, call: FailOn) -> Result<(), DispatchError> {
        if self.fail_on == call {
            Err(DispatchError::LoadFailure("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DispatchStore for FailingStore {
    async fn fetch_online_assigned_technicians(&self) -> Result<Vec<TechnicianCandidate>, DispatchError> {
        self.check(FailOn::Technicians)?;
        self.inner.fetch_online_assigned_technicians().await
    }

    async fn fetch_active_appointments(&self, technician_id: Uuid) -> Result<Vec<AppointmentWindow>, DispatchError> {
        self.check(FailOn::Appointments)?;
        self.inner.fetch_active_appointments(technician_id).await
    }

    async fn fetch_address_geo(&self, address_id: &str) -> Result<Option<GeoPoint>, DispatchError> {
        self.check(FailOn::Address)?;
        self.inner.fetch_address_geo(address_id).await
    }
}
