//! Periodic day ticks.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::core::EngineHandle;

/// Drives [`EngineHandle::tick`] on a fixed period.
///
/// The first tick fires one full period after [`DayClock::start`]. The clock
/// stops by itself once the engine shuts down.
pub struct DayClock {
    task: JoinHandle<()>,
}

impl DayClock {
    /// Start ticking `engine` every `period` on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Outside a tokio runtime, or if `period` is zero.
    #[must_use]
    pub fn start(engine: EngineHandle, period: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if engine.tick().is_err() {
                    debug!("engine stopped, day clock exiting");
                    break;
                }
            }
        });
        info!(period_ms = period.as_millis(), "day clock started");
        Self { task }
    }

    /// Stop ticking.
    pub fn stop(&self) {
        self.task.abort();
    }

    /// True once the clock task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for DayClock {
    fn drop(&mut self) {
        self.task.abort();
    }
}
