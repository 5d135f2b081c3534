//! Tests for runtime adapters

use std::time::Duration;

use ward_admission::builders::{build_engine, simulated_care};
use ward_admission::config::FacilityConfig;
use ward_admission::core::FacilityEvent;
use ward_admission::runtime::tokio_spawner::TokioSpawner;
use ward_admission::runtime::{health, submit_arrival, ward_occupancy, ArrivalRequest, DayClock};
use ward_admission::util::{Gender, Specialty};

fn fast_config() -> FacilityConfig {
    let mut cfg = FacilityConfig::default();
    cfg.timing.examination_ms = 5;
    cfg.timing.visit_ms = 1;
    cfg.workers = cfg.workers.with_worker_count(2);
    cfg.seed = Some(1);
    cfg
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    ward_admission::core::Spawn::spawn(&spawner, async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[test]
fn test_try_current_outside_runtime() {
    assert!(TokioSpawner::try_current().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_day_clock_ticks_until_stopped() {
    let cfg = fast_config();
    let engine = build_engine(&cfg, simulated_care(&cfg), &TokioSpawner::current(), None).unwrap();
    let handle = engine.handle();
    let mut rx = handle.subscribe();

    let clock = DayClock::start(handle.clone(), Duration::from_millis(20));
    let mut days = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while days.len() < 2 {
            if let FacilityEvent::DayStarted { day } = rx.recv().await.unwrap().event {
                days.push(day);
            }
        }
    })
    .await
    .expect("day clock did not tick");
    assert_eq!(days, vec![1, 2]);

    clock.stop();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(clock.is_finished());
    engine.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_api_surface() {
    let cfg = fast_config();
    let engine = build_engine(&cfg, simulated_care(&cfg), &TokioSpawner::current(), None).unwrap();
    let handle = engine.handle();
    let mut rx = handle.subscribe();

    let request: ArrivalRequest = serde_json::from_str(
        r#"{ "name": "Freya Holm", "gender": "female", "specialty": "orthopedics" }"#,
    )
    .unwrap();
    let response = submit_arrival(&handle, request).unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let FacilityEvent::Admitted { patient, .. } = rx.recv().await.unwrap().event {
                assert_eq!(patient.id, response.patient_id);
                assert_eq!(patient.gender, Gender::Female);
                break;
            }
        }
    })
    .await
    .expect("arrival was not admitted");

    let occupancy = ward_occupancy(&handle.snapshot());
    let ortho = occupancy.iter().find(|w| w.specialty == Specialty::Orthopedics).unwrap();
    assert_eq!(ortho.occupied, 1);
    assert_eq!(ortho.free + ortho.occupied, ortho.capacity);

    let status = health(&handle);
    assert!(status.ok);
    assert_eq!(status.waiting, 0);
    engine.shutdown();
}
