//! # Ward Admission
//!
//! Admission-control and bed-allocation engine for a simulated specialty
//! hospital.
//!
//! A fixed set of doctors and a fixed number of beds, grouped into
//! gender-segregated rooms inside specialty wards, must absorb a continuous
//! stream of arriving patients. The engine matches each waiting patient to a
//! free specialist and a compatible bed, runs examinations and visitation
//! rounds on a dedicated worker pool, and reclaims beds on every day tick.
//!
//! ## Key Features
//!
//! - **Serialized admission**: arrivals, ticks and finished jobs are funnelled
//!   through one command loop; each batch runs exactly one admission pass
//! - **Explicit doctor state machine**: illegal transitions surface as
//!   [`core::FacilityError::ConcurrencyHazard`] instead of silent corruption
//! - **Care pool**: dedicated OS threads with their own tokio runtimes run
//!   service jobs; a panicking job releases its doctor and bed
//! - **Observable**: every state change is published as a
//!   [`core::FacilityEvent`] to a broadcast channel and an optional sink
//!
//! ```rust,ignore
//! use ward_admission::builders::{build_engine, simulated_care};
//! use ward_admission::config::FacilityConfig;
//! use ward_admission::core::PatientProfile;
//! use ward_admission::runtime::{DayClock, TokioSpawner};
//! use ward_admission::util::serde::{Gender, Specialty};
//!
//! let cfg = FacilityConfig::default().with_env_overrides()?;
//! let engine = build_engine(&cfg, simulated_care(&cfg), &TokioSpawner::current(), None)?;
//! let handle = engine.handle();
//! let clock = DayClock::start(handle.clone(), cfg.timing.day_interval());
//!
//! let mut events = handle.subscribe();
//! handle.admit(PatientProfile::new("Astrid Holm", Gender::Female, Specialty::Cardiology))?;
//! while let Ok(record) = events.recv().await {
//!     println!("{}: {:?}", record.day, record.event);
//! }
//! clock.stop();
//! engine.shutdown();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Facility model, admission engine and care workers.
pub mod core;
/// Configuration models for the facility, its timing and the care pool.
pub mod config;
/// Builders to construct facility components from configuration.
pub mod builders;
/// Infrastructure adapters: waiting-queue backends and arrival generators.
pub mod infra;
/// Runtime adapters: tokio spawner, day clock and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
