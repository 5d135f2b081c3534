//! Service jobs and the executor trait that runs them.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::patient::PatientSummary;
use crate::core::staff::DoctorSummary;

/// One patient on a visitation round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitTarget {
    /// Patient visited.
    pub patient: PatientSummary,
    /// Room the patient was in when the round was dispatched.
    pub room: Option<usize>,
}

/// Work that holds a doctor busy for a simulated duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceJob {
    /// Intake examination for one patient.
    Examination {
        /// Examining doctor.
        doctor: DoctorSummary,
        /// Examined patient.
        patient: PatientSummary,
        /// False when no bed was found; the slot is spent but the patient left.
        admitted: bool,
        /// Treatment length assigned when the examination started.
        treatment_days: i32,
    },
    /// Round over a snapshot of the doctor's roster.
    Visitation {
        /// Visiting doctor.
        doctor: DoctorSummary,
        /// Patients in visiting order, copied at dispatch.
        rounds: Vec<VisitTarget>,
    },
}

impl ServiceJob {
    /// Doctor owned by this job.
    #[must_use]
    pub const fn doctor(&self) -> &DoctorSummary {
        match self {
            Self::Examination { doctor, .. } | Self::Visitation { doctor, .. } => doctor,
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Examination { .. } => "examination",
            Self::Visitation { .. } => "visitation",
        }
    }
}

/// How a service job ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Ran to completion.
    Completed,
    /// Stopped early; the doctor (and bed, for an examination) is released.
    Aborted(String),
}

/// Executes service jobs on a care-pool worker.
///
/// Implementations only simulate the time spent with the patient. They never
/// touch facility state; the engine applies the outcome once the job returns.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use ward_admission::core::{CareExecutor, ServiceJob, TaskStatus};
///
/// #[derive(Clone)]
/// struct Instant;
///
/// #[async_trait]
/// impl CareExecutor for Instant {
///     async fn execute(&self, _job: &ServiceJob) -> TaskStatus {
///         TaskStatus::Completed
///     }
/// }
/// ```
#[async_trait]
pub trait CareExecutor: Send + Sync + Clone + 'static {
    /// Run `job` to completion.
    ///
    /// # Threading
    ///
    /// Called from a dedicated worker thread with its own single-threaded
    /// tokio runtime, so sleeping here never stalls the admission loop.
    async fn execute(&self, job: &ServiceJob) -> TaskStatus;
}

/// Default executor: fixed latency per examination and per visited patient.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedCare {
    examination: Duration,
    visit: Duration,
}

impl SimulatedCare {
    /// Executor with the given latencies.
    #[must_use]
    pub const fn new(examination: Duration, visit: Duration) -> Self {
        Self { examination, visit }
    }
}

#[async_trait]
impl CareExecutor for SimulatedCare {
    async fn execute(&self, job: &ServiceJob) -> TaskStatus {
        match job {
            ServiceJob::Examination { doctor, patient, .. } => {
                info!(doctor = %doctor.name, patient = %patient.id, name = %patient.name, "examining");
                tokio::time::sleep(self.examination).await;
            }
            ServiceJob::Visitation { doctor, rounds } => {
                for target in rounds {
                    info!(
                        doctor = %doctor.name,
                        patient = %target.patient.id,
                        room = ?target.room,
                        "visiting"
                    );
                    tokio::time::sleep(self.visit).await;
                }
            }
        }
        TaskStatus::Completed
    }
}
