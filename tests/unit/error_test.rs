//! Tests for error types

use ward_admission::core::FacilityError;
use ward_admission::util::{DoctorId, PatientId};

#[test]
fn test_configuration_error() {
    let err = FacilityError::Configuration("no wards".to_string());
    assert_eq!(format!("{err}"), "configuration error: no wards");
    assert!(!err.is_hazard());
}

#[test]
fn test_concurrency_hazard_error() {
    let err = FacilityError::ConcurrencyHazard("bed double-booked".to_string());
    assert_eq!(format!("{err}"), "concurrency hazard: bed double-booked");
    assert!(err.is_hazard());
}

#[test]
fn test_lookup_errors() {
    assert_eq!(FacilityError::UnknownPatient(PatientId(9)).to_string(), "unknown patient P9");
    assert_eq!(FacilityError::UnknownDoctor(DoctorId(2)).to_string(), "unknown doctor D2");
}

#[test]
fn test_shutdown_and_abort_errors() {
    assert_eq!(FacilityError::EngineShutdown.to_string(), "engine has been shut down");
    assert_eq!(
        FacilityError::TaskAborted("panic".into()).to_string(),
        "task aborted: panic"
    );
}

#[test]
fn test_app_result_wraps_facility_error() {
    fn fails() -> ward_admission::core::AppResult<()> {
        let inner: Result<(), FacilityError> = Err(FacilityError::EngineShutdown);
        inner?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert_eq!(err.downcast_ref::<FacilityError>(), Some(&FacilityError::EngineShutdown));
}
