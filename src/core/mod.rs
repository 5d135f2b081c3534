//! Facility model, admission engine and care workers.

pub mod care_pool;
pub mod engine;
pub mod error;
pub mod events;
pub mod executor;
pub mod facility;
pub mod patient;
pub mod registry;
pub mod staff;
pub mod ward;

pub use care_pool::{CarePool, CareStats, PoolError};
pub use engine::{AdmissionEngine, Command, EngineHandle, SharedEventSink, Spawn, EVENT_CHANNEL_CAPACITY};
pub use error::{AppResult, FacilityError};
pub use events::{build_event_record, EventRecord, EventSink, FacilityEvent, InMemoryEventLog};
pub use executor::{CareExecutor, ServiceJob, SimulatedCare, TaskStatus, VisitTarget};
pub use facility::{
    AdmissionOutcome, AdmissionPass, DayReport, Discharge, DoctorSnapshot, ExaminationAbort,
    Facility, FacilitySnapshot, TreatmentPolicy, WaitingQueue, WardSnapshot,
};
pub use patient::{BedLocation, Patient, PatientProfile, PatientSummary};
pub use registry::{staff_index, DoctorRegistry, PatientArena, Roster};
pub use staff::{Doctor, DoctorEvent, DoctorState, DoctorSummary, Nurse};
pub use ward::{MedicationDose, Occupant, Ward};
