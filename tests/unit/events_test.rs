//! Tests for the event log and event records

use ward_admission::core::{build_event_record, EventSink, FacilityEvent, InMemoryEventLog};

#[test]
fn test_event_log_keeps_newest() {
    let mut log = InMemoryEventLog::new(2);
    for day in 1..=3 {
        log.record(build_event_record(day, FacilityEvent::DayStarted { day }));
    }
    let days: Vec<u32> = log.events().iter().map(|r| r.day).collect();
    assert_eq!(days, vec![2, 3]);
    assert_eq!(log.len(), 2);
}

#[test]
fn test_zero_capacity_log_stores_nothing() {
    let mut log = InMemoryEventLog::new(0);
    log.record(build_event_record(1, FacilityEvent::DayStarted { day: 1 }));
    assert!(log.is_empty());
}

#[test]
fn test_records_have_unique_ids() {
    let a = build_event_record(0, FacilityEvent::DayStarted { day: 0 });
    let b = build_event_record(0, FacilityEvent::DayStarted { day: 0 });
    assert_ne!(a.id, b.id);
    assert!(a.at_ms > 0);
}

#[test]
fn test_event_json_is_tagged() {
    let record = build_event_record(4, FacilityEvent::DayStarted { day: 4 });
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["event"]["type"], "day_started");
    assert_eq!(json["event"]["day"], 4);
    assert_eq!(record.event.name(), "day_started");
}
