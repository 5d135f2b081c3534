//! Error types for facility operations.

use thiserror::Error;

use crate::util::serde::{DoctorId, PatientId};

/// Errors produced by the admission engine and its components.
///
/// Expected per-patient rejections (no specialist, no bed) are not errors;
/// they are reported as [`AdmissionOutcome`](crate::core::AdmissionOutcome)s.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FacilityError {
    /// Invalid construction parameters; the engine never starts.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Internal invariant violated (double-booked bed, illegal doctor transition).
    #[error("concurrency hazard: {0}")]
    ConcurrencyHazard(String),
    /// Patient id not present in the arena.
    #[error("unknown patient {0}")]
    UnknownPatient(PatientId),
    /// Doctor id not registered.
    #[error("unknown doctor {0}")]
    UnknownDoctor(DoctorId),
    /// A service task did not run to completion.
    #[error("task aborted: {0}")]
    TaskAborted(String),
    /// The engine no longer accepts commands.
    #[error("engine has been shut down")]
    EngineShutdown,
}

impl FacilityError {
    /// True for programming-error signals, as opposed to operational failures.
    #[must_use]
    pub const fn is_hazard(&self) -> bool {
        matches!(self, Self::ConcurrencyHazard(_))
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
