//! Shared utilities: clock, identifiers and telemetry.

pub mod clock;
pub mod serde;
pub mod telemetry;

pub use self::clock::now_ms;
pub use self::serde::{DoctorId, Gender, NurseId, PatientId, Specialty};
pub use self::telemetry::{init_tracing, DEFAULT_FILTER};
