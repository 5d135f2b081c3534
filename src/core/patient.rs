//! Patient records as held by the facility.

use serde::{Deserialize, Serialize};

use crate::util::serde::{Gender, PatientId, Specialty};

/// Attributes supplied with an arrival. Only `gender` and `specialty` drive
/// admission; the rest is carried for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    /// Display name.
    pub name: String,
    /// Contact number.
    pub phone: String,
    /// Age in years.
    pub age: u8,
    /// Gender used for room segregation.
    pub gender: Gender,
    /// Specialty the patient must be routed to.
    pub specialty: Specialty,
}

impl PatientProfile {
    /// Profile with placeholder cosmetic fields.
    pub fn new(name: impl Into<String>, gender: Gender, specialty: Specialty) -> Self {
        Self {
            name: name.into(),
            phone: String::new(),
            age: 0,
            gender,
            specialty,
        }
    }
}

/// Where a patient sleeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BedLocation {
    /// Ward specialty.
    pub ward: Specialty,
    /// Room index within the ward.
    pub room: usize,
    /// Bed index within the room.
    pub bed: usize,
}

/// A patient known to the facility, waiting or admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    /// Stable identifier.
    pub id: PatientId,
    /// Arrival attributes.
    pub profile: PatientProfile,
    /// Treatment days left; `<= 0` means due for discharge at the next tick.
    pub remaining_days: i32,
    /// Assigned bed, `None` until admitted.
    pub bed: Option<BedLocation>,
}

impl Patient {
    /// Fresh arrival with no treatment plan and no bed.
    #[must_use]
    pub const fn new(id: PatientId, profile: PatientProfile) -> Self {
        Self {
            id,
            profile,
            remaining_days: 0,
            bed: None,
        }
    }

    /// Reporting view of this patient.
    #[must_use]
    pub fn summary(&self) -> PatientSummary {
        PatientSummary {
            id: self.id,
            name: self.profile.name.clone(),
            gender: self.profile.gender,
            specialty: self.profile.specialty,
        }
    }
}

/// Lightweight copy of a patient's identity, used in events and job snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    /// Stable identifier.
    pub id: PatientId,
    /// Display name.
    pub name: String,
    /// Gender.
    pub gender: Gender,
    /// Required specialty.
    pub specialty: Specialty,
}
