//! Builders to construct a facility and engine from configuration.

use std::time::Duration;

use crate::config::FacilityConfig;
use crate::core::{
    staff_index, AdmissionEngine, CareExecutor, DoctorRegistry, Facility, FacilityError, Nurse,
    SharedEventSink, SimulatedCare, Spawn, TreatmentPolicy, Ward,
};
use crate::infra::InMemoryWaitingQueue;
use crate::util::serde::NurseId;

/// Build a facility from configuration.
///
/// Wards are created in config order, doctors registered in config order, and
/// nurse `i` is assigned to ward `i mod ward_count`.
///
/// # Errors
///
/// [`FacilityError::Configuration`] if the config does not validate or holds
/// more staff than ids can number.
pub fn build_facility(cfg: &FacilityConfig) -> Result<Facility, FacilityError> {
    cfg.validate()
        .map_err(|e| FacilityError::Configuration(format!("config invalid: {e}")))?;

    let mut wards = cfg
        .wards
        .iter()
        .map(|w| Ward::new(w.specialty, w.rooms, w.beds_per_room))
        .collect::<Result<Vec<_>, _>>()?;

    let ward_count = wards.len();
    for (index, nurse) in cfg.nurses.iter().enumerate() {
        let id = NurseId(staff_index(index, "nurse")?);
        wards[index % ward_count].assign_nurse(Nurse {
            id,
            name: nurse.name.clone(),
            years_of_experience: nurse.years_of_experience,
            phone: nurse.phone.clone(),
        });
    }

    let mut doctors = DoctorRegistry::new();
    for doctor in &cfg.doctors {
        doctors.register(doctor.name.clone(), doctor.phone.clone(), doctor.specialty)?;
    }

    let treatment = TreatmentPolicy::new(cfg.treatment.min_days, cfg.treatment.max_days, cfg.seed)?;
    Facility::new(wards, doctors, Box::new(InMemoryWaitingQueue::new()), treatment)
}

/// Build a facility and start an engine around it.
///
/// # Errors
///
/// [`FacilityError::Configuration`] if the config does not validate or the
/// care pool cannot start.
pub fn build_engine<E, S>(
    cfg: &FacilityConfig,
    executor: E,
    spawner: &S,
    sink: Option<SharedEventSink>,
) -> Result<AdmissionEngine<E>, FacilityError>
where
    E: CareExecutor,
    S: Spawn,
{
    let facility = build_facility(cfg)?;
    AdmissionEngine::start(facility, executor, spawner, sink, &cfg.workers)
}

/// Executor with the configured examination and visit latencies.
#[must_use]
pub const fn simulated_care(cfg: &FacilityConfig) -> SimulatedCare {
    SimulatedCare::new(
        Duration::from_millis(cfg.timing.examination_ms),
        Duration::from_millis(cfg.timing.visit_ms),
    )
}
