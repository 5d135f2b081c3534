//! The facility: wards, staff, patients and the waiting queue.
//!
//! A [`Facility`] is plain single-threaded state. The engine keeps it behind
//! one mutex and calls into it from its command loop, so every method here
//! runs inside the admission critical section. Methods never block and never
//! run service work themselves; they return [`ServiceJob`]s for the caller to
//! dispatch.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::core::executor::{ServiceJob, VisitTarget};
use crate::core::patient::{BedLocation, Patient, PatientProfile, PatientSummary};
use crate::core::registry::{DoctorRegistry, PatientArena, Roster};
use crate::core::staff::{DoctorEvent, DoctorState, DoctorSummary};
use crate::core::ward::{MedicationDose, Ward};
use crate::core::FacilityError;
use crate::util::serde::{DoctorId, PatientId, Specialty};

/// Abstraction for waiting-queue backends.
pub trait WaitingQueue: Send {
    /// Append a patient at the back.
    fn enqueue(&mut self, patient: PatientId);
    /// Take every queued patient, front first, leaving the queue empty.
    fn drain(&mut self) -> Vec<PatientId>;
    /// Current depth.
    fn len(&self) -> usize;
    /// True when nobody waits.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Copy of the queue, front first.
    fn snapshot(&self) -> Vec<PatientId>;
}

/// Draws treatment lengths uniformly from `min_days..=max_days`.
#[derive(Debug, Clone)]
pub struct TreatmentPolicy {
    min_days: i32,
    max_days: i32,
    rng: StdRng,
}

impl TreatmentPolicy {
    /// Policy over `min_days..=max_days`. A seed makes draws reproducible.
    ///
    /// # Errors
    ///
    /// [`FacilityError::Configuration`] if `min_days < 1` or the range is empty.
    pub fn new(min_days: i32, max_days: i32, seed: Option<u64>) -> Result<Self, FacilityError> {
        if min_days < 1 || min_days > max_days {
            return Err(FacilityError::Configuration(format!(
                "treatment range {min_days}..={max_days} is invalid"
            )));
        }
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Ok(Self {
            min_days,
            max_days,
            rng,
        })
    }

    /// Next treatment length in days.
    pub fn draw(&mut self) -> i32 {
        self.rng.random_range(self.min_days..=self.max_days)
    }
}

/// Terminal or carry-over result of routing one waiting patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdmissionOutcome {
    /// Doctor reserved, bed taken, examination queued.
    Admitted {
        /// Admitted patient.
        patient: PatientSummary,
        /// Doctor in charge.
        doctor: DoctorSummary,
        /// Assigned bed.
        location: BedLocation,
    },
    /// Every matching specialist was busy; the patient waits for the next pass.
    Requeued {
        /// Patient put back in the queue.
        patient: PatientId,
    },
    /// No doctor of the required specialty exists.
    RejectedNoSpecialist {
        /// Turned-away patient.
        patient: PatientSummary,
    },
    /// The ward had no compatible bed; the doctor slot is still spent.
    RejectedNoBed {
        /// Turned-away patient.
        patient: PatientSummary,
        /// Doctor reserved for the examination.
        doctor: DoctorSummary,
    },
}

/// Everything one admission pass decided.
#[derive(Debug, Default)]
pub struct AdmissionPass {
    /// One outcome per drained patient, in queue order.
    pub outcomes: Vec<AdmissionOutcome>,
    /// Examination jobs to dispatch.
    pub jobs: Vec<ServiceJob>,
    /// Invariant violations met while routing.
    pub hazards: Vec<FacilityError>,
}

/// A patient who left at the end of treatment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discharge {
    /// Leaving patient.
    pub patient: PatientSummary,
    /// Ward the patient left.
    pub ward: Specialty,
}

/// Everything one day tick did.
#[derive(Debug, Default)]
pub struct DayReport {
    /// Day number after the tick.
    pub day: u32,
    /// Patients discharged.
    pub discharged: Vec<Discharge>,
    /// Medication handed out.
    pub doses: Vec<MedicationDose>,
    /// Visitation jobs to dispatch.
    pub visitations: Vec<ServiceJob>,
    /// Doctors whose visitation waits for their examination to end.
    pub deferred: Vec<DoctorSummary>,
    /// Invariant violations met during the tick.
    pub hazards: Vec<FacilityError>,
}

/// Result of aborting an examination.
#[derive(Debug, Default)]
pub struct ExaminationAbort {
    /// Admitted patient whose bed and roster entry were released.
    pub released: Option<PatientSummary>,
    /// Visitation owed by the doctor, now due.
    pub visitation: Option<ServiceJob>,
}

/// Serializable view of one ward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardSnapshot {
    /// Ward specialty.
    pub specialty: Specialty,
    /// Number of rooms.
    pub rooms: usize,
    /// Beds in each room.
    pub beds_per_room: usize,
    /// Free beds.
    pub free_beds: usize,
    /// Occupied beds.
    pub occupied_beds: usize,
    /// Patients due to leave at the next tick.
    pub discharge_next_cycle: usize,
    /// Nurse names on duty.
    pub nurses: Vec<String>,
    /// Occupied beds and who holds them.
    pub occupants: Vec<(BedLocation, PatientId)>,
}

/// Serializable view of one doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorSnapshot {
    /// Identity.
    pub doctor: DoctorSummary,
    /// Availability.
    pub state: DoctorState,
    /// Patients under care.
    pub roster: Vec<PatientId>,
}

/// Serializable view of the whole facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilitySnapshot {
    /// Current day.
    pub day: u32,
    /// Every ward in construction order.
    pub wards: Vec<WardSnapshot>,
    /// Every doctor in registration order.
    pub doctors: Vec<DoctorSnapshot>,
    /// Waiting queue, front first.
    pub waiting: Vec<PatientId>,
    /// Patients known to the facility.
    pub patients: usize,
}

enum Routing {
    Requeued,
    Settled(AdmissionOutcome, Option<ServiceJob>),
}

/// All mutable facility state.
pub struct Facility {
    wards: Vec<Ward>,
    doctors: DoctorRegistry,
    roster: Roster,
    patients: PatientArena,
    waiting: Box<dyn WaitingQueue>,
    treatment: TreatmentPolicy,
    day: u32,
}

impl Facility {
    /// Assemble a facility.
    ///
    /// # Errors
    ///
    /// [`FacilityError::Configuration`] if there are no wards, two wards share
    /// a specialty, or no doctor is registered.
    pub fn new(
        wards: Vec<Ward>,
        doctors: DoctorRegistry,
        waiting: Box<dyn WaitingQueue>,
        treatment: TreatmentPolicy,
    ) -> Result<Self, FacilityError> {
        if wards.is_empty() {
            return Err(FacilityError::Configuration("at least one ward is required".into()));
        }
        if doctors.is_empty() {
            return Err(FacilityError::Configuration("at least one doctor is required".into()));
        }
        let mut seen = HashSet::new();
        for ward in &wards {
            if !seen.insert(ward.specialty()) {
                return Err(FacilityError::Configuration(format!(
                    "duplicate ward for {}",
                    ward.specialty()
                )));
            }
        }
        Ok(Self {
            wards,
            doctors,
            roster: Roster::new(),
            patients: PatientArena::new(),
            waiting,
            treatment,
            day: 0,
        })
    }

    /// Register an arrival and put it at the back of the queue.
    pub fn arrive(&mut self, profile: PatientProfile) -> PatientId {
        let id = self.register(profile);
        self.waiting.enqueue(id);
        debug!(patient = %id, waiting = self.waiting.len(), "patient queued");
        id
    }

    /// Give an arrival an id without queueing it yet.
    pub fn register(&mut self, profile: PatientProfile) -> PatientId {
        self.patients.insert(profile)
    }

    /// Queue a registered patient.
    ///
    /// # Errors
    ///
    /// [`FacilityError::UnknownPatient`] if `id` was never registered or has left.
    pub fn enqueue(&mut self, id: PatientId) -> Result<PatientSummary, FacilityError> {
        let summary = self
            .patients
            .get(id)
            .ok_or(FacilityError::UnknownPatient(id))?
            .summary();
        self.waiting.enqueue(id);
        info!(
            patient = %id,
            name = %summary.name,
            gender = %summary.gender,
            specialty = %summary.specialty,
            waiting = self.waiting.len(),
            "patient arrived"
        );
        Ok(summary)
    }

    /// Route every currently waiting patient once.
    ///
    /// Patients whose specialists are all busy are put back in their original
    /// order after the pass. A hazard while routing a patient is reported and
    /// the patient is carried over rather than lost.
    pub fn process_admissions(&mut self) -> AdmissionPass {
        let mut pass = AdmissionPass::default();
        let mut carry = Vec::new();

        for id in self.waiting.drain() {
            match self.route(id) {
                Ok(Routing::Requeued) => {
                    carry.push(id);
                    pass.outcomes.push(AdmissionOutcome::Requeued { patient: id });
                }
                Ok(Routing::Settled(outcome, job)) => {
                    pass.outcomes.push(outcome);
                    pass.jobs.extend(job);
                }
                Err(e) => {
                    error!(patient = %id, error = %e, "admission hazard");
                    if self.patients.get(id).is_some() {
                        carry.push(id);
                    }
                    pass.hazards.push(e);
                }
            }
        }

        for id in carry {
            self.waiting.enqueue(id);
        }
        pass
    }

    fn route(&mut self, id: PatientId) -> Result<Routing, FacilityError> {
        let patient = self.patients.get(id).ok_or(FacilityError::UnknownPatient(id))?;
        let specialty = patient.profile.specialty;
        let summary = patient.summary();

        if self.doctors.pool(specialty).is_none() {
            self.patients.remove(id);
            warn!(patient = %id, name = %summary.name, %specialty, "no specialist, patient turned away");
            return Ok(Routing::Settled(
                AdmissionOutcome::RejectedNoSpecialist { patient: summary },
                None,
            ));
        }

        let Some(doctor_id) = self.doctors.first_free(specialty) else {
            debug!(patient = %id, %specialty, "all specialists busy, requeued");
            return Ok(Routing::Requeued);
        };
        let doctor = self.doctors.get_mut(doctor_id)?;
        doctor.apply(DoctorEvent::ReserveExamination)?;
        let doctor = doctor.summary();

        match self.place(id, specialty, doctor_id) {
            Ok(Some(location)) => {
                let treatment_days = self.treatment.draw();
                if let Some(patient) = self.patients.get_mut(id) {
                    patient.remaining_days = treatment_days;
                }
                info!(
                    patient = %id,
                    name = %summary.name,
                    doctor = %doctor.name,
                    ward = %location.ward,
                    room = location.room,
                    bed = location.bed,
                    treatment_days,
                    "patient admitted"
                );
                let job = ServiceJob::Examination {
                    doctor: doctor.clone(),
                    patient: summary.clone(),
                    admitted: true,
                    treatment_days,
                };
                Ok(Routing::Settled(
                    AdmissionOutcome::Admitted {
                        patient: summary,
                        doctor,
                        location,
                    },
                    Some(job),
                ))
            }
            Ok(None) => {
                self.patients.remove(id);
                warn!(patient = %id, name = %summary.name, %specialty, doctor = %doctor.name, "no free bed, patient turned away");
                let job = ServiceJob::Examination {
                    doctor: doctor.clone(),
                    patient: summary.clone(),
                    admitted: false,
                    treatment_days: 0,
                };
                Ok(Routing::Settled(
                    AdmissionOutcome::RejectedNoBed {
                        patient: summary,
                        doctor,
                    },
                    Some(job),
                ))
            }
            Err(e) => {
                // undo the reservation so the doctor does not stay busy with no task
                if let Err(rollback) = self
                    .doctors
                    .get_mut(doctor_id)
                    .and_then(|d| d.apply(DoctorEvent::FinishExamination))
                {
                    error!(doctor = %doctor_id, error = %rollback, "reservation rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Take a bed and a roster entry together, or neither.
    fn place(
        &mut self,
        id: PatientId,
        specialty: Specialty,
        doctor: DoctorId,
    ) -> Result<Option<BedLocation>, FacilityError> {
        let Some(ward) = self.wards.iter_mut().find(|w| w.specialty() == specialty) else {
            return Ok(None);
        };
        let patient = self.patients.get_mut(id).ok_or(FacilityError::UnknownPatient(id))?;
        let Some(location) = ward.try_admit(patient)? else {
            return Ok(None);
        };
        if let Err(e) = self.roster.assign(doctor, id) {
            ward.release(id);
            patient.bed = None;
            return Err(e);
        }
        Ok(Some(location))
    }

    /// Advance the facility by one day.
    ///
    /// Runs discharge on every ward, the medication round, then dispatches or
    /// defers a visitation for each doctor that still has patients, in
    /// registration order.
    pub fn day_tick(&mut self) -> DayReport {
        self.day += 1;
        let mut report = DayReport {
            day: self.day,
            ..DayReport::default()
        };

        for ward in &mut self.wards {
            let (ids, hazards) = ward.advance_day(&mut self.patients);
            for id in ids {
                self.roster.remove(id);
                if let Some(patient) = self.patients.remove(id) {
                    report.discharged.push(Discharge {
                        patient: patient.summary(),
                        ward: ward.specialty(),
                    });
                }
            }
            report.hazards.extend(hazards);
        }

        // cleared orphan beds may leave roster entries with no patient behind
        let stale: Vec<PatientId> = self
            .roster
            .assignments()
            .map(|(patient, _)| patient)
            .filter(|id| self.patients.get(*id).is_none())
            .collect();
        for id in stale {
            warn!(patient = %id, "dropping roster entry for unknown patient");
            self.roster.remove(id);
        }

        for ward in &self.wards {
            report.doses.extend(ward.medication_round());
        }

        let on_roster: Vec<DoctorId> = self
            .doctors
            .all()
            .iter()
            .map(|d| d.id)
            .filter(|id| self.roster.contains_doctor(*id))
            .collect();

        for id in on_roster {
            let doctor = match self.doctors.get_mut(id) {
                Ok(doctor) => doctor,
                Err(e) => {
                    report.hazards.push(e);
                    continue;
                }
            };
            let was_free = doctor.is_free();
            let summary = doctor.summary();
            let event = if was_free {
                DoctorEvent::DispatchVisitation
            } else {
                DoctorEvent::DeferVisitation
            };
            match doctor.apply(event) {
                Ok(DoctorState::Visiting) if was_free => {
                    report.visitations.push(self.visitation_job(summary));
                }
                Ok(DoctorState::ExaminingVisitPending) => {
                    info!(doctor = %summary.name, "doctor busy, visitation deferred");
                    report.deferred.push(summary);
                }
                Ok(_) => debug!(doctor = %summary.name, "visitation already under way"),
                Err(e) => {
                    error!(doctor = %summary.name, error = %e, "visitation dispatch failed");
                    report.hazards.push(e);
                }
            }
        }

        info!(
            day = self.day,
            discharged = report.discharged.len(),
            visitations = report.visitations.len(),
            deferred = report.deferred.len(),
            "day advanced"
        );
        report
    }

    fn visitation_job(&self, doctor: DoctorSummary) -> ServiceJob {
        let rounds = self
            .roster
            .patients_of(doctor.id)
            .into_iter()
            .filter_map(|id| self.patients.get(id))
            .map(|p| VisitTarget {
                patient: p.summary(),
                room: p.bed.map(|b| b.room),
            })
            .collect();
        ServiceJob::Visitation { doctor, rounds }
    }

    /// Examination returned: free the doctor, or start the deferred visitation.
    ///
    /// # Errors
    ///
    /// [`FacilityError::UnknownDoctor`] or a hazard if the doctor was not examining.
    pub fn finish_examination(&mut self, doctor: DoctorId) -> Result<Option<ServiceJob>, FacilityError> {
        let entry = self.doctors.get_mut(doctor)?;
        let next = entry.apply(DoctorEvent::FinishExamination)?;
        let summary = entry.summary();
        if next == DoctorState::Visiting {
            info!(doctor = %summary.name, "deferred visitation starting");
            return Ok(Some(self.visitation_job(summary)));
        }
        Ok(None)
    }

    /// Visitation returned: the doctor is free.
    ///
    /// # Errors
    ///
    /// [`FacilityError::UnknownDoctor`] or a hazard if the doctor was not visiting.
    pub fn finish_visitation(&mut self, doctor: DoctorId) -> Result<(), FacilityError> {
        self.doctors.get_mut(doctor)?.apply(DoctorEvent::FinishVisitation)?;
        Ok(())
    }

    /// Examination did not complete. The doctor is released; an admitted
    /// patient also loses its bed and roster entry and leaves the facility.
    ///
    /// # Errors
    ///
    /// As [`Facility::finish_examination`].
    pub fn abort_examination(
        &mut self,
        doctor: DoctorId,
        patient: PatientId,
        admitted: bool,
    ) -> Result<ExaminationAbort, FacilityError> {
        let released = if admitted {
            self.release_patient(patient).map(|p| p.summary())
        } else {
            None
        };
        let visitation = self.finish_examination(doctor)?;
        Ok(ExaminationAbort { released, visitation })
    }

    /// Remove a patient from the roster, its bed and the arena.
    pub fn release_patient(&mut self, id: PatientId) -> Option<Patient> {
        self.roster.remove(id);
        let patient = self.patients.remove(id)?;
        if let Some(bed) = patient.bed {
            if let Some(ward) = self.wards.iter_mut().find(|w| w.specialty() == bed.ward) {
                ward.release(id);
            }
        }
        Some(patient)
    }

    /// Check bed uniqueness, room gender homogeneity, bed accounting and the
    /// roster/bed correspondence.
    ///
    /// # Errors
    ///
    /// [`FacilityError::ConcurrencyHazard`] naming the first violation found.
    pub fn verify_invariants(&self) -> Result<(), FacilityError> {
        let hazard = |msg: String| Err(FacilityError::ConcurrencyHazard(msg));
        let mut placed: HashMap<PatientId, BedLocation> = HashMap::new();

        for ward in &self.wards {
            if ward.free_beds() + ward.occupied_beds() != ward.capacity() {
                return hazard(format!("ward {} bed accounting is off", ward.specialty()));
            }
            for room in 0..ward.rooms() {
                let occupants = ward.room_occupants(room);
                if let Some(first) = occupants.first() {
                    if occupants.len() > 1 && occupants.iter().any(|o| o.gender != first.gender) {
                        return hazard(format!("ward {} room {room} mixes genders", ward.specialty()));
                    }
                }
            }
            for (location, occupant) in ward.occupants() {
                if let Some(previous) = placed.insert(occupant.patient, location) {
                    return hazard(format!(
                        "patient {} holds {previous:?} and {location:?}",
                        occupant.patient
                    ));
                }
                let Some(patient) = self.patients.get(occupant.patient) else {
                    return hazard(format!("bed {location:?} holds unknown {}", occupant.patient));
                };
                if patient.bed != Some(location) {
                    return hazard(format!("patient {} location record disagrees with bed", patient.id));
                }
                if self.roster.doctor_of(patient.id).is_none() {
                    return hazard(format!("patient {} has a bed but no doctor", patient.id));
                }
            }
        }

        for patient in self.patients.iter() {
            if patient.bed.is_some() && !placed.contains_key(&patient.id) {
                return hazard(format!("patient {} records a bed it does not hold", patient.id));
            }
        }
        for (patient, doctor) in self.roster.assignments() {
            if !placed.contains_key(&patient) {
                return hazard(format!("{doctor} lists {patient} who holds no bed"));
            }
        }
        Ok(())
    }

    /// Check that exactly the doctors in `owned` are busy.
    ///
    /// # Errors
    ///
    /// [`FacilityError::ConcurrencyHazard`] naming the first mismatch.
    pub fn verify_task_ownership(&self, owned: &HashSet<DoctorId>) -> Result<(), FacilityError> {
        for doctor in self.doctors.all() {
            let busy = !doctor.is_free();
            if busy != owned.contains(&doctor.id) {
                return Err(FacilityError::ConcurrencyHazard(format!(
                    "doctor {} is {:?} but task ownership says {}",
                    doctor.id,
                    doctor.state(),
                    if busy { "idle" } else { "busy" }
                )));
            }
        }
        Ok(())
    }

    /// Current day; 0 before the first tick.
    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// Every ward in construction order.
    #[must_use]
    pub fn wards(&self) -> &[Ward] {
        &self.wards
    }

    /// Ward serving `specialty`.
    #[must_use]
    pub fn ward(&self, specialty: Specialty) -> Option<&Ward> {
        self.wards.iter().find(|w| w.specialty() == specialty)
    }

    /// Registered doctors.
    #[must_use]
    pub const fn doctors(&self) -> &DoctorRegistry {
        &self.doctors
    }

    /// Doctor to patient relation.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Patients currently known.
    #[must_use]
    pub const fn patients(&self) -> &PatientArena {
        &self.patients
    }

    /// Waiting queue depth.
    #[must_use]
    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    /// Serializable view of the whole facility.
    #[must_use]
    pub fn snapshot(&self) -> FacilitySnapshot {
        let wards = self
            .wards
            .iter()
            .map(|w| WardSnapshot {
                specialty: w.specialty(),
                rooms: w.rooms(),
                beds_per_room: w.beds_per_room(),
                free_beds: w.free_beds(),
                occupied_beds: w.occupied_beds(),
                discharge_next_cycle: w.discharge_next_cycle(),
                nurses: w.nurses().iter().map(|n| n.name.clone()).collect(),
                occupants: w.occupants().map(|(loc, o)| (loc, o.patient)).collect(),
            })
            .collect();
        let doctors = self
            .doctors
            .all()
            .iter()
            .map(|d| DoctorSnapshot {
                doctor: d.summary(),
                state: d.state(),
                roster: self.roster.patients_of(d.id),
            })
            .collect();
        FacilitySnapshot {
            day: self.day,
            wards,
            doctors,
            waiting: self.waiting.snapshot(),
            patients: self.patients.len(),
        }
    }
}
