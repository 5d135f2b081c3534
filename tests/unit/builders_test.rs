//! Tests for builder modules

use ward_admission::builders::{build_facility, simulated_care};
use ward_admission::config::{FacilityConfig, NurseConfig};
use ward_admission::core::{DoctorState, FacilityError};
use ward_admission::util::{DoctorId, Specialty};

#[test]
fn test_build_default_facility() {
    let facility = build_facility(&FacilityConfig::default()).unwrap();
    assert_eq!(facility.wards().len(), 3);
    assert_eq!(facility.doctors().len(), 5);
    assert_eq!(facility.ward(Specialty::Cardiology).unwrap().capacity(), 30);
    assert!(facility.doctors().all().iter().all(|d| d.state() == DoctorState::Free));
    assert_eq!(facility.day(), 0);
}

#[test]
fn test_doctors_registered_in_config_order() {
    let cfg = FacilityConfig::default();
    let facility = build_facility(&cfg).unwrap();
    for (i, doctor) in cfg.doctors.iter().enumerate() {
        let registered = facility.doctors().get(DoctorId(u32::try_from(i).unwrap())).unwrap();
        assert_eq!(registered.name, doctor.name);
        assert_eq!(registered.specialty, doctor.specialty);
    }
}

#[test]
fn test_nurses_assigned_round_robin() {
    let mut cfg = FacilityConfig::default();
    cfg.nurses = (0..4)
        .map(|i| NurseConfig {
            name: format!("Nurse{i}"),
            years_of_experience: 1,
            phone: String::new(),
        })
        .collect();
    let facility = build_facility(&cfg).unwrap();

    let names = |s| -> Vec<String> {
        facility.ward(s).unwrap().nurses().iter().map(|n| n.name.clone()).collect()
    };
    assert_eq!(names(Specialty::Orthopedics), ["Nurse0", "Nurse3"]);
    assert_eq!(names(Specialty::Cardiology), ["Nurse1"]);
    assert_eq!(names(Specialty::Virology), ["Nurse2"]);
}

#[test]
fn test_invalid_config_is_configuration_error() {
    let mut cfg = FacilityConfig::default();
    cfg.wards.clear();
    assert!(matches!(build_facility(&cfg), Err(FacilityError::Configuration(_))));
}

#[test]
fn test_simulated_care_uses_timing() {
    let cfg = FacilityConfig::default();
    let care = simulated_care(&cfg);
    let same = ward_admission::core::SimulatedCare::new(
        cfg.timing.examination(),
        cfg.timing.visit(),
    );
    assert_eq!(format!("{care:?}"), format!("{same:?}"));
}
