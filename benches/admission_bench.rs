//! Benchmarks for the admission core.
//!
//! Benchmarks cover:
//! - A single admission pass over a filled waiting queue
//! - Admitting until the wards are full
//! - Day ticks over a fully occupied facility

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;

use ward_admission::builders::build_facility;
use ward_admission::config::{FacilityConfig, WardConfig};
use ward_admission::core::{Facility, ServiceJob};
use ward_admission::infra::{random_doctors, PatientGenerator, RandomPatientGenerator};
use ward_admission::util::Specialty;

// ============================================================================
// Helper Functions
// ============================================================================

fn bench_config(rooms: usize, doctors: usize) -> FacilityConfig {
    let mut rng = StdRng::seed_from_u64(7);
    FacilityConfig {
        wards: [Specialty::Orthopedics, Specialty::Cardiology, Specialty::Virology]
            .into_iter()
            .map(|specialty| WardConfig {
                specialty,
                rooms,
                beds_per_room: 3,
            })
            .collect(),
        doctors: random_doctors(doctors, &mut rng),
        seed: Some(7),
        ..FacilityConfig::default()
    }
}

fn with_arrivals(cfg: &FacilityConfig, arrivals: usize) -> Facility {
    let mut facility = build_facility(cfg).unwrap();
    let mut generator = RandomPatientGenerator::new(Some(42));
    for _ in 0..arrivals {
        facility.arrive(generator.next_profile());
    }
    facility
}

/// Complete every examination and any visitation it releases.
fn finish_all(facility: &mut Facility, jobs: Vec<ServiceJob>) {
    for job in jobs {
        let doctor = job.doctor().id;
        if let Some(visit) = facility.finish_examination(doctor).unwrap() {
            facility.finish_visitation(visit.doctor().id).unwrap();
        }
    }
}

fn admit_until_full(facility: &mut Facility) {
    while facility.waiting_len() > 0 {
        let pass = facility.process_admissions();
        if pass.jobs.is_empty() {
            break;
        }
        finish_all(facility, pass.jobs);
    }
}

// ============================================================================
// Admission Benchmarks
// ============================================================================

fn bench_admission_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("admission_pass");
    let cfg = bench_config(50, 30);

    for arrivals in [100_u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(arrivals));
        group.bench_with_input(BenchmarkId::from_parameter(arrivals), &arrivals, |b, &n| {
            b.iter_batched(
                || with_arrivals(&cfg, n as usize),
                |mut facility| black_box(facility.process_admissions()),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_admit_until_full(c: &mut Criterion) {
    let mut group = c.benchmark_group("admit_until_full");
    let cfg = bench_config(20, 6);
    let arrivals = 200;

    group.throughput(Throughput::Elements(arrivals as u64));
    group.bench_function("200_arrivals", |b| {
        b.iter_batched(
            || with_arrivals(&cfg, arrivals),
            |mut facility| {
                admit_until_full(&mut facility);
                black_box(facility.waiting_len())
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

// ============================================================================
// Day Tick Benchmarks
// ============================================================================

fn bench_day_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("day_tick");

    for rooms in [10_usize, 100] {
        let cfg = bench_config(rooms, 12);
        let beds = rooms * 3 * 3;
        group.throughput(Throughput::Elements(beds as u64));
        group.bench_with_input(BenchmarkId::from_parameter(beds), &cfg, |b, cfg| {
            b.iter_batched(
                || {
                    let mut facility = with_arrivals(cfg, beds * 2);
                    admit_until_full(&mut facility);
                    facility
                },
                |mut facility| {
                    let report = facility.day_tick();
                    for job in &report.visitations {
                        facility.finish_visitation(job.doctor().id).unwrap();
                    }
                    black_box(report)
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark Groups
// ============================================================================

criterion_group!(admission_benches, bench_admission_pass, bench_admit_until_full);

criterion_group!(tick_benches, bench_day_tick);

criterion_main!(admission_benches, tick_benches);
