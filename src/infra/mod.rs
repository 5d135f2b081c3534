//! Infrastructure adapters: waiting-queue backends and arrival generators.

pub mod generator;
pub mod queue;

pub use generator::{random_doctors, PatientGenerator, RandomPatientGenerator};
pub use queue::InMemoryWaitingQueue;
