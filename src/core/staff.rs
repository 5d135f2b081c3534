//! Doctors, nurses, and the doctor availability state machine.
//!
//! A doctor carries a single [`DoctorState`] instead of independent "busy"
//! and "visitation pending" flags. Every change goes through
//! [`DoctorState::apply`], which rejects transitions outside the table below
//! with [`FacilityError::ConcurrencyHazard`].
//!
//! | from                    | event                | to                      |
//! |-------------------------|----------------------|-------------------------|
//! | `Free`                  | `ReserveExamination` | `Examining`             |
//! | `Free`                  | `DispatchVisitation` | `Visiting`              |
//! | `Examining`             | `DeferVisitation`    | `ExaminingVisitPending` |
//! | `ExaminingVisitPending` | `DeferVisitation`    | `ExaminingVisitPending` |
//! | `Visiting`              | `DeferVisitation`    | `Visiting`              |
//! | `Examining`             | `FinishExamination`  | `Free`                  |
//! | `ExaminingVisitPending` | `FinishExamination`  | `Visiting`              |
//! | `Visiting`              | `FinishVisitation`   | `Free`                  |

use serde::{Deserialize, Serialize};

use crate::core::FacilityError;
use crate::util::serde::{DoctorId, NurseId, Specialty};

/// Availability of a doctor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoctorState {
    /// Available for an examination or a visitation.
    Free,
    /// Owned by an examination task.
    Examining,
    /// Owned by an examination task; a visitation is due when it ends.
    ExaminingVisitPending,
    /// Owned by a visitation task.
    Visiting,
}

/// Input to the doctor state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoctorEvent {
    /// Admission pass picked this doctor for a patient.
    ReserveExamination,
    /// Day tick starts a visitation round.
    DispatchVisitation,
    /// Day tick found the doctor busy.
    DeferVisitation,
    /// Examination task returned.
    FinishExamination,
    /// Visitation task returned.
    FinishVisitation,
}

impl DoctorState {
    /// True while a service task owns the doctor.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        !matches!(self, Self::Free)
    }

    /// Next state for `event`, or a hazard if the pair is not in the table.
    pub fn apply(self, event: DoctorEvent) -> Result<Self, FacilityError> {
        use DoctorEvent as E;
        use DoctorState as S;

        match (self, event) {
            (S::Free, E::ReserveExamination) => Ok(S::Examining),
            (S::Free, E::DispatchVisitation) => Ok(S::Visiting),
            (S::Examining | S::ExaminingVisitPending, E::DeferVisitation) => {
                Ok(S::ExaminingVisitPending)
            }
            (S::Visiting, E::DeferVisitation) => Ok(S::Visiting),
            (S::Examining, E::FinishExamination) | (S::Visiting, E::FinishVisitation) => Ok(S::Free),
            (S::ExaminingVisitPending, E::FinishExamination) => Ok(S::Visiting),
            (from, event) => Err(FacilityError::ConcurrencyHazard(format!(
                "illegal doctor transition {from:?} --{event:?}-->"
            ))),
        }
    }
}

/// A specialist registered with the facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    /// Registration index.
    pub id: DoctorId,
    /// Surname used in reports.
    pub name: String,
    /// Contact number.
    pub phone: String,
    /// Specialty served.
    pub specialty: Specialty,
    state: DoctorState,
}

impl Doctor {
    /// New doctor, initially free.
    pub fn new(id: DoctorId, name: impl Into<String>, phone: impl Into<String>, specialty: Specialty) -> Self {
        Self {
            id,
            name: name.into(),
            phone: phone.into(),
            specialty,
            state: DoctorState::Free,
        }
    }

    /// Current availability.
    #[must_use]
    pub const fn state(&self) -> DoctorState {
        self.state
    }

    /// True when no task owns this doctor.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        !self.state.is_busy()
    }

    /// Drive the state machine; on error the state is left untouched.
    pub fn apply(&mut self, event: DoctorEvent) -> Result<DoctorState, FacilityError> {
        let next = self.state.apply(event).map_err(|e| match e {
            FacilityError::ConcurrencyHazard(msg) => {
                FacilityError::ConcurrencyHazard(format!("doctor {}: {msg}", self.id))
            }
            other => other,
        })?;
        self.state = next;
        Ok(next)
    }

    /// Reporting view of this doctor.
    #[must_use]
    pub fn summary(&self) -> DoctorSummary {
        DoctorSummary {
            id: self.id,
            name: self.name.clone(),
            specialty: self.specialty,
        }
    }
}

/// Lightweight copy of a doctor's identity, used in events and jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorSummary {
    /// Registration index.
    pub id: DoctorId,
    /// Surname.
    pub name: String,
    /// Specialty served.
    pub specialty: Specialty,
}

/// A nurse assigned to one ward for medication rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nurse {
    /// Registration index.
    pub id: NurseId,
    /// Surname.
    pub name: String,
    /// Years on the job.
    pub years_of_experience: u32,
    /// Contact number.
    pub phone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_examination_cycle() {
        let mut doc = Doctor::new(DoctorId(0), "Hale", "", Specialty::Cardiology);
        assert!(doc.is_free());
        assert_eq!(doc.apply(DoctorEvent::ReserveExamination).unwrap(), DoctorState::Examining);
        assert!(!doc.is_free());
        assert_eq!(doc.apply(DoctorEvent::FinishExamination).unwrap(), DoctorState::Free);
    }

    #[test]
    fn test_deferred_visitation_runs_after_examination() {
        let mut state = DoctorState::Examining;
        state = state.apply(DoctorEvent::DeferVisitation).unwrap();
        assert_eq!(state, DoctorState::ExaminingVisitPending);
        // a second tick while still examining is coalesced
        state = state.apply(DoctorEvent::DeferVisitation).unwrap();
        assert_eq!(state, DoctorState::ExaminingVisitPending);
        state = state.apply(DoctorEvent::FinishExamination).unwrap();
        assert_eq!(state, DoctorState::Visiting);
        assert!(state.is_busy());
        assert_eq!(state.apply(DoctorEvent::FinishVisitation).unwrap(), DoctorState::Free);
    }

    #[test]
    fn test_defer_while_visiting_is_coalesced() {
        let state = DoctorState::Visiting;
        assert_eq!(state.apply(DoctorEvent::DeferVisitation).unwrap(), DoctorState::Visiting);
    }

    #[test]
    fn test_double_reservation_is_a_hazard() {
        let mut doc = Doctor::new(DoctorId(3), "Hale", "", Specialty::Virology);
        doc.apply(DoctorEvent::ReserveExamination).unwrap();
        let err = doc.apply(DoctorEvent::ReserveExamination).unwrap_err();
        assert!(err.is_hazard());
        assert!(err.to_string().contains("D3"));
        assert_eq!(doc.state(), DoctorState::Examining);
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(DoctorState::Free.apply(DoctorEvent::FinishExamination).is_err());
        assert!(DoctorState::Free.apply(DoctorEvent::FinishVisitation).is_err());
        assert!(DoctorState::Free.apply(DoctorEvent::DeferVisitation).is_err());
        assert!(DoctorState::Visiting.apply(DoctorEvent::ReserveExamination).is_err());
        assert!(DoctorState::Visiting.apply(DoctorEvent::FinishExamination).is_err());
        assert!(DoctorState::Examining.apply(DoctorEvent::DispatchVisitation).is_err());
        assert!(DoctorState::Examining.apply(DoctorEvent::FinishVisitation).is_err());
    }
}
