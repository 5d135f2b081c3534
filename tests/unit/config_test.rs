//! Tests for configuration validation

use ward_admission::config::{DoctorConfig, FacilityConfig, WardConfig, WorkerConfig};
use ward_admission::util::Specialty;

fn minimal() -> FacilityConfig {
    FacilityConfig {
        wards: vec![WardConfig {
            specialty: Specialty::Cardiology,
            rooms: 1,
            beds_per_room: 1,
        }],
        doctors: vec![DoctorConfig {
            name: "Okafor".into(),
            specialty: Specialty::Cardiology,
            phone: String::new(),
        }],
        ..FacilityConfig::default()
    }
}

#[test]
fn test_default_config_is_valid() {
    let cfg = FacilityConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.wards.len(), 3);
    assert!(cfg.wards.iter().all(|w| w.rooms == 10 && w.beds_per_room == 3));
    assert_eq!(cfg.doctors.len(), 5);
    assert_eq!(cfg.nurses.len(), 8);
    assert_eq!(cfg.timing.examination_ms, 1000);
    assert_eq!(cfg.timing.day_interval_ms, 5000);
    assert_eq!((cfg.treatment.min_days, cfg.treatment.max_days), (3, 5));
}

#[test]
fn test_rejects_missing_wards_and_doctors() {
    let mut cfg = minimal();
    cfg.wards.clear();
    assert!(cfg.validate().is_err());

    let mut cfg = minimal();
    cfg.doctors.clear();
    assert!(cfg.validate().is_err());
}

#[test]
fn test_rejects_empty_ward() {
    let mut cfg = minimal();
    cfg.wards[0].rooms = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = minimal();
    cfg.wards[0].beds_per_room = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_rejects_duplicate_ward() {
    let mut cfg = minimal();
    cfg.wards.push(cfg.wards[0].clone());
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("twice"));
}

#[test]
fn test_rejects_blank_doctor_name() {
    let mut cfg = minimal();
    cfg.doctors[0].name = "  ".into();
    assert!(cfg.validate().is_err());
}

#[test]
fn test_rejects_bad_treatment_and_timing() {
    let mut cfg = minimal();
    cfg.treatment.min_days = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = minimal();
    cfg.treatment.min_days = 6;
    assert!(cfg.validate().is_err());

    let mut cfg = minimal();
    cfg.timing.day_interval_ms = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = minimal();
    cfg.workers = WorkerConfig::new().with_thread_stack_size(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_json_str_fills_defaults() {
    let json = r#"{
        "wards": [{ "specialty": "virology", "rooms": 2, "beds_per_room": 2 }],
        "doctors": [{ "name": "Brandt", "specialty": "virology" }],
        "seed": 5
    }"#;
    let cfg = FacilityConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.wards[0].specialty, Specialty::Virology);
    assert!(cfg.nurses.is_empty());
    assert_eq!(cfg.timing.visit_ms, 1000);
    assert_eq!(cfg.seed, Some(5));
}

#[test]
fn test_from_json_str_errors() {
    assert!(FacilityConfig::from_json_str("not json").unwrap_err().starts_with("parse error"));
    let no_doctors = r#"{ "wards": [{ "specialty": "virology", "rooms": 1, "beds_per_room": 1 }], "doctors": [] }"#;
    assert!(FacilityConfig::from_json_str(no_doctors).is_err());
}

#[test]
fn test_worker_count_resolution() {
    let fixed = WorkerConfig::new().with_worker_count(2);
    assert_eq!(fixed.resolved_worker_count(1), 2);
    assert_eq!(fixed.resolved_worker_count(5), 5);
    assert!(WorkerConfig::new().resolved_worker_count(0) >= 1);
}
