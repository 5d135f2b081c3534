//! Runtime adapters: tokio spawner, day clock and API surface.

pub mod api;
pub mod day_clock;
pub mod tokio_spawner;

pub use api::{health, submit_arrival, ward_occupancy, ArrivalRequest, ArrivalResponse, Health, WardOccupancy};
pub use day_clock::DayClock;
pub use tokio_spawner::TokioSpawner;
