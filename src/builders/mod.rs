//! Builders to construct facility components from configuration.

pub mod facility_builder;

pub use facility_builder::{build_engine, build_facility, simulated_care};
