//! Tests for utility functions

use ward_admission::util::{now_ms, DoctorId, Gender, NurseId, PatientId, Specialty};

#[test]
fn test_identifier_display() {
    assert_eq!(PatientId(42).to_string(), "P42");
    assert_eq!(DoctorId(3).to_string(), "D3");
    assert_eq!(NurseId(0).to_string(), "N0");
}

#[test]
fn test_specialty_names() {
    let names: Vec<String> = Specialty::ALL.iter().map(ToString::to_string).collect();
    assert_eq!(names, ["orthopedics", "cardiology", "virology"]);
    assert_eq!(Gender::Female.to_string(), "female");
}

#[test]
fn test_vocabulary_serializes_snake_case() {
    assert_eq!(serde_json::to_string(&Specialty::Orthopedics).unwrap(), "\"orthopedics\"");
    assert_eq!(serde_json::from_str::<Gender>("\"male\"").unwrap(), Gender::Male);
    assert_eq!(serde_json::to_string(&PatientId(7)).unwrap(), "7");
}

#[test]
fn test_now_ms_advances() {
    let before = now_ms();
    std::thread::sleep(std::time::Duration::from_millis(2));
    assert!(now_ms() > before);
}
