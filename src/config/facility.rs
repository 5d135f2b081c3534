//! Facility, timing and worker configuration structures.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::serde::Specialty;

/// One specialty ward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardConfig {
    /// Specialty served; at most one ward per specialty.
    pub specialty: Specialty,
    /// Number of rooms.
    pub rooms: usize,
    /// Beds in each room.
    pub beds_per_room: usize,
}

/// One doctor, registered in list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorConfig {
    /// Surname.
    pub name: String,
    /// Specialty served.
    pub specialty: Specialty,
    /// Contact number.
    #[serde(default)]
    pub phone: String,
}

/// One nurse; nurses are spread over wards round-robin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NurseConfig {
    /// Surname.
    pub name: String,
    /// Years on the job.
    #[serde(default)]
    pub years_of_experience: u32,
    /// Contact number.
    #[serde(default)]
    pub phone: String,
}

/// Simulated latencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Length of one examination.
    pub examination_ms: u64,
    /// Time spent with each patient on a visitation round.
    pub visit_ms: u64,
    /// Period of the day clock.
    pub day_interval_ms: u64,
}

impl TimingConfig {
    /// Examination latency.
    #[must_use]
    pub const fn examination(&self) -> Duration {
        Duration::from_millis(self.examination_ms)
    }

    /// Per-patient visitation latency.
    #[must_use]
    pub const fn visit(&self) -> Duration {
        Duration::from_millis(self.visit_ms)
    }

    /// Day clock period.
    #[must_use]
    pub const fn day_interval(&self) -> Duration {
        Duration::from_millis(self.day_interval_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            examination_ms: 1000,
            visit_ms: 1000,
            day_interval_ms: 5000,
        }
    }
}

/// Range of treatment lengths drawn at examination start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentConfig {
    /// Shortest treatment in days.
    pub min_days: i32,
    /// Longest treatment in days.
    pub max_days: i32,
}

impl Default for TreatmentConfig {
    fn default() -> Self {
        Self {
            min_days: 3,
            max_days: 5,
        }
    }
}

/// Configuration for the care worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Worker threads; 0 means one per CPU.
    pub worker_count: usize,
    /// Stack size of each worker thread in bytes.
    pub thread_stack_size: usize,
}

impl WorkerConfig {
    /// Defaults: one worker per CPU, 2 MiB stacks.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            worker_count: 0,
            thread_stack_size: 2 * 1024 * 1024,
        }
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, size: usize) -> Self {
        self.thread_stack_size = size;
        self
    }

    /// Effective thread count: the configured or CPU count, raised to
    /// `min_workers` so every doctor can be served at once.
    #[must_use]
    pub fn resolved_worker_count(&self, min_workers: usize) -> usize {
        let base = if self.worker_count == 0 {
            num_cpus::get()
        } else {
            self.worker_count
        };
        base.max(min_workers).max(1)
    }

    /// Validate worker settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.thread_stack_size == 0 {
            return Err("thread_stack_size must be greater than 0".into());
        }
        Ok(())
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Root facility configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityConfig {
    /// Wards in display order.
    pub wards: Vec<WardConfig>,
    /// Doctors in registration order.
    pub doctors: Vec<DoctorConfig>,
    /// Nurses in assignment order.
    #[serde(default)]
    pub nurses: Vec<NurseConfig>,
    /// Simulated latencies.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Treatment length range.
    #[serde(default)]
    pub treatment: TreatmentConfig,
    /// Care pool settings.
    #[serde(default)]
    pub workers: WorkerConfig,
    /// Seed for treatment draws; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl FacilityConfig {
    /// Validate ward, staff, timing and worker values.
    pub fn validate(&self) -> Result<(), String> {
        if self.wards.is_empty() {
            return Err("at least one ward must be defined".into());
        }
        let mut specialties = HashSet::new();
        for ward in &self.wards {
            if ward.rooms == 0 || ward.beds_per_room == 0 {
                return Err(format!(
                    "ward `{}` needs at least one room and one bed per room",
                    ward.specialty
                ));
            }
            if !specialties.insert(ward.specialty) {
                return Err(format!("ward `{}` defined twice", ward.specialty));
            }
        }
        if self.doctors.is_empty() {
            return Err("at least one doctor must be defined".into());
        }
        if let Some(index) = self.doctors.iter().position(|d| d.name.trim().is_empty()) {
            return Err(format!("doctor #{index} has no name"));
        }
        if self.treatment.min_days < 1 {
            return Err("treatment.min_days must be at least 1".into());
        }
        if self.treatment.min_days > self.treatment.max_days {
            return Err("treatment.min_days must not exceed treatment.max_days".into());
        }
        if self.timing.day_interval_ms == 0 {
            return Err("timing.day_interval_ms must be greater than 0".into());
        }
        self.workers.validate().map_err(|e| format!("workers invalid: {e}"))
    }

    /// Parse facility configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `WARD_*` overrides from the process environment or a `.env` file.
    ///
    /// Recognised: `WARD_EXAMINATION_MS`, `WARD_VISIT_MS`,
    /// `WARD_DAY_INTERVAL_MS`, `WARD_WORKERS`, `WARD_SEED`. Unparseable values
    /// are an error; unset ones are ignored.
    pub fn with_env_overrides(mut self) -> Result<Self, String> {
        if let Some(ms) = env_number("WARD_EXAMINATION_MS")? {
            self.timing.examination_ms = ms;
        }
        if let Some(ms) = env_number("WARD_VISIT_MS")? {
            self.timing.visit_ms = ms;
        }
        if let Some(ms) = env_number("WARD_DAY_INTERVAL_MS")? {
            self.timing.day_interval_ms = ms;
        }
        if let Some(count) = env_number("WARD_WORKERS")? {
            self.workers.worker_count = count;
        }
        if let Some(seed) = env_number("WARD_SEED")? {
            self.seed = Some(seed);
        }
        self.validate()?;
        Ok(self)
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Result<Option<T>, String> {
    match dotenvy::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| format!("{key} is not a valid number: `{raw}`")),
        Err(_) => Ok(None),
    }
}

impl Default for FacilityConfig {
    fn default() -> Self {
        let ward = |specialty| WardConfig {
            specialty,
            rooms: 10,
            beds_per_room: 3,
        };
        let doctor = |name: &str, specialty| DoctorConfig {
            name: name.into(),
            specialty,
            phone: String::new(),
        };
        let nurse = |name: &str, years_of_experience| NurseConfig {
            name: name.into(),
            years_of_experience,
            phone: String::new(),
        };
        Self {
            wards: vec![
                ward(Specialty::Orthopedics),
                ward(Specialty::Cardiology),
                ward(Specialty::Virology),
            ],
            doctors: vec![
                doctor("Lindqvist", Specialty::Orthopedics),
                doctor("Okafor", Specialty::Cardiology),
                doctor("Brandt", Specialty::Virology),
                doctor("Moreau", Specialty::Cardiology),
                doctor("Tanaka", Specialty::Orthopedics),
            ],
            nurses: vec![
                nurse("Albescu", 12),
                nurse("Kowal", 4),
                nurse("Ferreira", 7),
                nurse("Haddad", 2),
                nurse("Nyberg", 19),
                nurse("Castell", 9),
                nurse("Dube", 5),
                nurse("Reyes", 15),
            ],
            timing: TimingConfig::default(),
            treatment: TreatmentConfig::default(),
            workers: WorkerConfig::default(),
            seed: None,
        }
    }
}
