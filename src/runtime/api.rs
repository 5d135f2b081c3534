//! API-facing request/response models.

use serde::{Deserialize, Serialize};

use crate::core::{EngineHandle, Facility, FacilityError, FacilitySnapshot, PatientProfile};
use crate::util::serde::{Gender, PatientId, Specialty};

/// Arrival payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrivalRequest {
    /// Display name.
    pub name: String,
    /// Contact number.
    #[serde(default)]
    pub phone: String,
    /// Age in years.
    #[serde(default)]
    pub age: u8,
    /// Gender.
    pub gender: Gender,
    /// Required specialty.
    pub specialty: Specialty,
}

impl From<ArrivalRequest> for PatientProfile {
    fn from(req: ArrivalRequest) -> Self {
        Self {
            name: req.name,
            phone: req.phone,
            age: req.age,
            gender: req.gender,
            specialty: req.specialty,
        }
    }
}

/// Arrival acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrivalResponse {
    /// Assigned patient id.
    pub patient_id: PatientId,
    /// Queue depth observed at submission.
    pub waiting: usize,
}

/// Per-ward occupancy for listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardOccupancy {
    /// Ward specialty.
    pub specialty: Specialty,
    /// Total beds.
    pub capacity: usize,
    /// Occupied beds.
    pub occupied: usize,
    /// Free beds.
    pub free: usize,
    /// Patients leaving at the next tick.
    pub discharge_next_cycle: usize,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Current simulated day.
    pub day: u32,
    /// Patients waiting for admission.
    pub waiting: usize,
}

/// Submit an arrival to a running engine.
///
/// # Errors
///
/// [`FacilityError::EngineShutdown`] once the engine has stopped.
pub fn submit_arrival(engine: &EngineHandle, req: ArrivalRequest) -> Result<ArrivalResponse, FacilityError> {
    let patient_id = engine.admit(req.into())?;
    let waiting = engine.with_facility(Facility::waiting_len);
    Ok(ArrivalResponse { patient_id, waiting })
}

/// Occupancy of every ward.
#[must_use]
pub fn ward_occupancy(snapshot: &FacilitySnapshot) -> Vec<WardOccupancy> {
    snapshot
        .wards
        .iter()
        .map(|w| WardOccupancy {
            specialty: w.specialty,
            capacity: w.rooms * w.beds_per_room,
            occupied: w.occupied_beds,
            free: w.free_beds,
            discharge_next_cycle: w.discharge_next_cycle,
        })
        .collect()
}

/// Engine liveness and queue depth.
#[must_use]
pub fn health(engine: &EngineHandle) -> Health {
    let snapshot = engine.snapshot();
    Health {
        ok: engine.is_running(),
        day: snapshot.day,
        waiting: snapshot.waiting.len(),
    }
}
