//! Configuration models for the facility, its timing and the care pool.

pub mod facility;

pub use facility::{
    DoctorConfig, FacilityConfig, NurseConfig, TimingConfig, TreatmentConfig, WardConfig,
    WorkerConfig,
};
