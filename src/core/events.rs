//! Facility events and the sinks that store them.
//!
//! Every state change the reporting layer may care about is emitted once as a
//! [`FacilityEvent`], wrapped in an [`EventRecord`] with an id and timestamp.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::patient::{BedLocation, PatientSummary};
use crate::core::staff::DoctorSummary;
use crate::core::ward::MedicationDose;
use crate::util::clock::now_ms;
use crate::util::serde::{PatientId, Specialty};

/// Observable outcome of engine activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FacilityEvent {
    /// Patient joined the waiting queue.
    PatientArrived {
        /// New patient.
        patient: PatientSummary,
    },
    /// Patient got a doctor and a bed.
    Admitted {
        /// Admitted patient.
        patient: PatientSummary,
        /// Doctor in charge.
        doctor: DoctorSummary,
        /// Assigned bed.
        location: BedLocation,
    },
    /// No doctor is registered for the patient's specialty.
    RejectedNoSpecialist {
        /// Turned-away patient.
        patient: PatientSummary,
    },
    /// A doctor was free but the ward had no compatible bed.
    RejectedNoBed {
        /// Turned-away patient.
        patient: PatientSummary,
        /// Doctor whose slot was spent.
        doctor: DoctorSummary,
    },
    /// Treatment finished and the bed was freed.
    Discharged {
        /// Leaving patient.
        patient: PatientSummary,
        /// Ward the patient left.
        ward: Specialty,
    },
    /// Examination job handed to the care pool.
    ExaminationStarted {
        /// Examining doctor.
        doctor: DoctorSummary,
        /// Examined patient.
        patient: PatientSummary,
        /// Days of treatment assigned.
        treatment_days: i32,
    },
    /// Examination job returned.
    ExaminationFinished {
        /// Examining doctor.
        doctor: DoctorSummary,
        /// Examined patient.
        patient: PatientSummary,
    },
    /// Visitation job handed to the care pool.
    VisitationStarted {
        /// Visiting doctor.
        doctor: DoctorSummary,
        /// Patients on the round.
        patients: Vec<PatientId>,
    },
    /// Visitation job returned.
    VisitationFinished {
        /// Visiting doctor.
        doctor: DoctorSummary,
        /// Patients on the round.
        patients: Vec<PatientId>,
    },
    /// Doctor was busy at tick time; the round runs after the examination.
    VisitationDeferred {
        /// Busy doctor.
        doctor: DoctorSummary,
    },
    /// Medication handed out on the daily round.
    MedicationAdministered {
        /// The dose given.
        dose: MedicationDose,
    },
    /// A service job did not complete; its resources were released.
    TaskAborted {
        /// Doctor released.
        doctor: DoctorSummary,
        /// Patient released, for an admitted examination.
        patient: Option<PatientSummary>,
        /// Failure description.
        reason: String,
    },
    /// A new simulated day began.
    DayStarted {
        /// Day number, starting at 1.
        day: u32,
    },
}

impl FacilityEvent {
    /// Short label for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PatientArrived { .. } => "patient_arrived",
            Self::Admitted { .. } => "admitted",
            Self::RejectedNoSpecialist { .. } => "rejected_no_specialist",
            Self::RejectedNoBed { .. } => "rejected_no_bed",
            Self::Discharged { .. } => "discharged",
            Self::ExaminationStarted { .. } => "examination_started",
            Self::ExaminationFinished { .. } => "examination_finished",
            Self::VisitationStarted { .. } => "visitation_started",
            Self::VisitationFinished { .. } => "visitation_finished",
            Self::VisitationDeferred { .. } => "visitation_deferred",
            Self::MedicationAdministered { .. } => "medication_administered",
            Self::TaskAborted { .. } => "task_aborted",
            Self::DayStarted { .. } => "day_started",
        }
    }
}

/// Event envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique record id.
    pub id: Uuid,
    /// Timestamp milliseconds.
    pub at_ms: u128,
    /// Simulated day the event happened on.
    pub day: u32,
    /// Payload.
    pub event: FacilityEvent,
}

/// Event sink abstraction.
pub trait EventSink: Send {
    /// Record an event.
    fn record(&mut self, record: EventRecord);
}

/// In-memory bounded event log for testing and reporting.
pub struct InMemoryEventLog {
    events: VecDeque<EventRecord>,
    max_events: usize,
}

impl InMemoryEventLog {
    /// Create a log that keeps at most `max_events` records, dropping the oldest.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(4096)),
            max_events,
        }
    }

    /// Snapshot of stored records, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<EventRecord> {
        self.events.iter().cloned().collect()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for InMemoryEventLog {
    fn record(&mut self, record: EventRecord) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(record);
    }
}

/// Wrap an event in a fresh record.
#[must_use]
pub fn build_event_record(day: u32, event: FacilityEvent) -> EventRecord {
    EventRecord {
        id: Uuid::new_v4(),
        at_ms: now_ms(),
        day,
        event,
    }
}
