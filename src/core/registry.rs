//! Lookup structures: the patient arena, specialist pools, and the roster.
//!
//! None of these own behaviour beyond keeping their relations consistent.
//! The arena owns every [`Patient`]; wards and the roster refer to patients
//! by [`PatientId`] only.

use std::collections::{BTreeSet, HashMap};

use crate::core::patient::{Patient, PatientProfile};
use crate::core::staff::Doctor;
use crate::core::FacilityError;
use crate::util::serde::{DoctorId, PatientId, Specialty};

/// Stable-id storage for every patient currently known to the facility.
#[derive(Debug, Default)]
pub struct PatientArena {
    patients: HashMap<PatientId, Patient>,
    next_id: u64,
}

impl PatientArena {
    /// Empty arena; ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            patients: HashMap::new(),
            next_id: 1,
        }
    }

    /// Register a new patient and return its id.
    pub fn insert(&mut self, profile: PatientProfile) -> PatientId {
        let id = PatientId(self.next_id);
        self.next_id += 1;
        self.patients.insert(id, Patient::new(id, profile));
        id
    }

    /// Shared access to a patient.
    #[must_use]
    pub fn get(&self, id: PatientId) -> Option<&Patient> {
        self.patients.get(&id)
    }

    /// Exclusive access to a patient.
    pub fn get_mut(&mut self, id: PatientId) -> Option<&mut Patient> {
        self.patients.get_mut(&id)
    }

    /// Drop a patient from the facility.
    pub fn remove(&mut self, id: PatientId) -> Option<Patient> {
        self.patients.remove(&id)
    }

    /// Number of patients held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patients.len()
    }

    /// True when no patient is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// Iterate over every held patient in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Patient> {
        self.patients.values()
    }
}

/// Numeric staff id for the `index`-th registered member.
///
/// # Errors
///
/// [`FacilityError::Configuration`] if `index` does not fit a staff id.
pub fn staff_index(index: usize, role: &str) -> Result<u32, FacilityError> {
    u32::try_from(index)
        .map_err(|_| FacilityError::Configuration(format!("too many {role}s: no id left for #{index}")))
}

/// Doctors in registration order, grouped into per-specialty pools.
#[derive(Debug, Default)]
pub struct DoctorRegistry {
    doctors: Vec<Doctor>,
    pools: HashMap<Specialty, Vec<DoctorId>>,
}

impl DoctorRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a doctor; its id is its registration index.
    ///
    /// # Errors
    ///
    /// [`FacilityError::Configuration`] once the id space is exhausted.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        phone: impl Into<String>,
        specialty: Specialty,
    ) -> Result<DoctorId, FacilityError> {
        let id = DoctorId(staff_index(self.doctors.len(), "doctor")?);
        self.doctors.push(Doctor::new(id, name, phone, specialty));
        self.pools.entry(specialty).or_default().push(id);
        Ok(id)
    }

    /// The specialist pool for `specialty`, in registration order.
    #[must_use]
    pub fn pool(&self, specialty: Specialty) -> Option<&[DoctorId]> {
        self.pools.get(&specialty).map(Vec::as_slice)
    }

    /// First free doctor of the pool, scanning in registration order.
    #[must_use]
    pub fn first_free(&self, specialty: Specialty) -> Option<DoctorId> {
        self.pool(specialty)?
            .iter()
            .copied()
            .find(|id| self.doctors.get(id.0 as usize).is_some_and(Doctor::is_free))
    }

    /// Shared access to a doctor.
    #[must_use]
    pub fn get(&self, id: DoctorId) -> Option<&Doctor> {
        self.doctors.get(id.0 as usize)
    }

    /// Exclusive access to a doctor, or [`FacilityError::UnknownDoctor`].
    pub fn get_mut(&mut self, id: DoctorId) -> Result<&mut Doctor, FacilityError> {
        self.doctors
            .get_mut(id.0 as usize)
            .ok_or(FacilityError::UnknownDoctor(id))
    }

    /// All doctors in registration order.
    #[must_use]
    pub fn all(&self) -> &[Doctor] {
        &self.doctors
    }

    /// Number of registered doctors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.doctors.len()
    }

    /// True when no doctor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doctors.is_empty()
    }
}

/// Weak relation from a doctor to the patients under their care.
///
/// Holds membership only. A reverse index keeps removal by patient cheap, and
/// doctors whose set becomes empty are pruned.
#[derive(Debug, Default)]
pub struct Roster {
    by_doctor: HashMap<DoctorId, BTreeSet<PatientId>>,
    by_patient: HashMap<PatientId, DoctorId>,
}

impl Roster {
    /// Empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `patient` under `doctor`'s care.
    ///
    /// A patient already assigned elsewhere is a hazard: it would mean two
    /// admissions for one person.
    pub fn assign(&mut self, doctor: DoctorId, patient: PatientId) -> Result<(), FacilityError> {
        if let Some(existing) = self.by_patient.get(&patient) {
            return Err(FacilityError::ConcurrencyHazard(format!(
                "patient {patient} already on roster of {existing}"
            )));
        }
        self.by_doctor.entry(doctor).or_default().insert(patient);
        self.by_patient.insert(patient, doctor);
        Ok(())
    }

    /// Remove `patient` from whichever doctor holds it. Returns that doctor.
    pub fn remove(&mut self, patient: PatientId) -> Option<DoctorId> {
        let doctor = self.by_patient.remove(&patient)?;
        if let Some(set) = self.by_doctor.get_mut(&doctor) {
            set.remove(&patient);
            if set.is_empty() {
                self.by_doctor.remove(&doctor);
            }
        }
        Some(doctor)
    }

    /// Doctor caring for `patient`.
    #[must_use]
    pub fn doctor_of(&self, patient: PatientId) -> Option<DoctorId> {
        self.by_patient.get(&patient).copied()
    }

    /// True if `doctor` has at least one patient.
    #[must_use]
    pub fn contains_doctor(&self, doctor: DoctorId) -> bool {
        self.by_doctor.contains_key(&doctor)
    }

    /// Copy of `doctor`'s patients, ordered by id.
    #[must_use]
    pub fn patients_of(&self, doctor: DoctorId) -> Vec<PatientId> {
        self.by_doctor
            .get(&doctor)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Total assignments held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_patient.len()
    }

    /// True when nobody is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_patient.is_empty()
    }

    /// Every (patient, doctor) pair.
    pub fn assignments(&self) -> impl Iterator<Item = (PatientId, DoctorId)> + '_ {
        self.by_patient.iter().map(|(p, d)| (*p, *d))
    }
}
