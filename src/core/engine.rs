//! Admission engine: one command loop serializing every state change.
//!
//! Arrivals, day ticks and finished service jobs all become [`Command`]s on
//! one unbounded channel. A single loop task drains whatever is pending,
//! applies it under the facility lock, runs exactly one admission pass, and
//! only then releases the lock to publish events and dispatch jobs to the
//! [`CarePool`]. No lock is held across an `.await`.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::config::WorkerConfig;
use crate::core::care_pool::{CarePool, CareStats};
use crate::core::events::{build_event_record, EventRecord, EventSink, FacilityEvent};
use crate::core::executor::{CareExecutor, ServiceJob, TaskStatus};
use crate::core::facility::{AdmissionOutcome, Facility, FacilitySnapshot};
use crate::core::patient::PatientProfile;
use crate::core::FacilityError;
use crate::util::serde::{DoctorId, PatientId};

/// Capacity of the event broadcast channel; slow subscribers see `Lagged`.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Shared, lockable event sink.
pub type SharedEventSink = Arc<Mutex<dyn EventSink>>;

/// Abstraction for spawning the engine loop on a runtime.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Input to the engine loop.
#[derive(Debug)]
pub enum Command {
    /// A registered patient should join the waiting queue.
    Arrived(PatientId),
    /// Advance the facility by one day.
    DayTick,
    /// A service job returned from the care pool.
    ServiceFinished {
        /// The job that ran.
        job: ServiceJob,
        /// How it ended.
        status: TaskStatus,
    },
    /// Stop the loop.
    Shutdown,
}

/// Cloneable handle for feeding and observing a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    commands: UnboundedSender<Command>,
    state: Arc<Mutex<Facility>>,
    events: broadcast::Sender<EventRecord>,
}

impl EngineHandle {
    /// Register an arriving patient and queue it for admission.
    ///
    /// # Errors
    ///
    /// [`FacilityError::EngineShutdown`] once the engine has stopped.
    pub fn admit(&self, profile: PatientProfile) -> Result<PatientId, FacilityError> {
        if self.commands.is_closed() {
            return Err(FacilityError::EngineShutdown);
        }
        let id = self.state.lock().register(profile);
        if self.commands.send(Command::Arrived(id)).is_err() {
            self.state.lock().release_patient(id);
            return Err(FacilityError::EngineShutdown);
        }
        Ok(id)
    }

    /// Request a day tick.
    ///
    /// # Errors
    ///
    /// [`FacilityError::EngineShutdown`] once the engine has stopped.
    pub fn tick(&self) -> Result<(), FacilityError> {
        self.commands
            .send(Command::DayTick)
            .map_err(|_| FacilityError::EngineShutdown)
    }

    /// Receive every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.events.subscribe()
    }

    /// Serializable view of the facility.
    #[must_use]
    pub fn snapshot(&self) -> FacilitySnapshot {
        self.state.lock().snapshot()
    }

    /// Run `f` against the facility under its lock. Keep `f` short.
    pub fn with_facility<R>(&self, f: impl FnOnce(&Facility) -> R) -> R {
        f(&self.state.lock())
    }

    /// True while the loop accepts commands.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

/// A running admission engine and its care pool.
pub struct AdmissionEngine<E: CareExecutor> {
    handle: EngineHandle,
    pool: Arc<CarePool<E>>,
}

impl<E: CareExecutor> AdmissionEngine<E> {
    /// Start the care pool and spawn the command loop.
    ///
    /// The pool gets at least one worker per doctor and a hand-off queue as
    /// deep as the doctor count, so dispatch never waits.
    ///
    /// # Errors
    ///
    /// [`FacilityError::Configuration`] if the care pool cannot start.
    pub fn start<S: Spawn>(
        facility: Facility,
        executor: E,
        spawner: &S,
        sink: Option<SharedEventSink>,
        workers: &WorkerConfig,
    ) -> Result<Self, FacilityError> {
        let doctors = facility.doctors().len();
        let (commands, rx) = unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let pool = Arc::new(CarePool::new(workers, doctors, doctors, executor, commands.clone())?);
        let state = Arc::new(Mutex::new(facility));

        let engine_loop = EngineLoop {
            state: Arc::clone(&state),
            pool: Arc::clone(&pool),
            events: events.clone(),
            sink,
            commands: commands.clone(),
            in_flight: HashSet::new(),
        };
        spawner.spawn(engine_loop.run(rx));
        info!(doctors, "admission engine started");

        Ok(Self {
            handle: EngineHandle {
                commands,
                state,
                events,
            },
            pool,
        })
    }

    /// A handle for feeding the engine.
    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Care pool statistics.
    #[must_use]
    pub fn stats(&self) -> CareStats {
        self.pool.stats()
    }

    /// Stop the loop and join the care workers. Running jobs finish first.
    pub fn shutdown(&self) {
        self.handle.commands.send(Command::Shutdown).ok();
        self.pool.shutdown();
        info!("admission engine shut down");
    }
}

struct EngineLoop<E: CareExecutor> {
    state: Arc<Mutex<Facility>>,
    pool: Arc<CarePool<E>>,
    events: broadcast::Sender<EventRecord>,
    sink: Option<SharedEventSink>,
    commands: UnboundedSender<Command>,
    in_flight: HashSet<DoctorId>,
}

/// What one batch produced, collected under the lock and acted on after it.
#[derive(Default)]
struct Batch {
    day: u32,
    events: Vec<FacilityEvent>,
    jobs: Vec<ServiceJob>,
    stop: bool,
}

impl<E: CareExecutor> EngineLoop<E> {
    async fn run(mut self, mut rx: UnboundedReceiver<Command>) {
        let mut pending = Vec::new();
        while let Some(command) = rx.recv().await {
            pending.push(command);
            while let Ok(command) = rx.try_recv() {
                pending.push(command);
            }
            debug!(commands = pending.len(), "processing batch");

            let batch = self.apply(pending.drain(..));
            self.publish(batch.day, batch.events);
            if batch.stop {
                break;
            }
            self.dispatch(batch.jobs);
        }
        rx.close();
        debug!("engine loop stopped");
    }

    fn apply(&mut self, commands: impl Iterator<Item = Command>) -> Batch {
        let mut facility = self.state.lock();
        let mut batch = Batch::default();

        for command in commands {
            match command {
                Command::Arrived(id) => match facility.enqueue(id) {
                    Ok(patient) => batch.events.push(FacilityEvent::PatientArrived { patient }),
                    Err(e) => error!(patient = %id, error = %e, "arrival lost"),
                },
                Command::DayTick => {
                    let report = facility.day_tick();
                    batch.events.push(FacilityEvent::DayStarted { day: report.day });
                    batch.events.extend(
                        report
                            .discharged
                            .into_iter()
                            .map(|d| FacilityEvent::Discharged {
                                patient: d.patient,
                                ward: d.ward,
                            }),
                    );
                    batch.events.extend(
                        report
                            .doses
                            .into_iter()
                            .map(|dose| FacilityEvent::MedicationAdministered { dose }),
                    );
                    batch.events.extend(
                        report
                            .deferred
                            .into_iter()
                            .map(|doctor| FacilityEvent::VisitationDeferred { doctor }),
                    );
                    batch.jobs.extend(report.visitations);
                    for hazard in report.hazards {
                        error!(error = %hazard, "day tick hazard");
                    }
                }
                Command::ServiceFinished { job, status } => {
                    self.in_flight.remove(&job.doctor().id);
                    self.finish(&mut facility, job, status, &mut batch);
                }
                Command::Shutdown => batch.stop = true,
            }
        }

        if batch.stop {
            batch.day = facility.day();
            return batch;
        }

        let pass = facility.process_admissions();
        for outcome in pass.outcomes {
            match outcome {
                AdmissionOutcome::Admitted {
                    patient,
                    doctor,
                    location,
                } => batch.events.push(FacilityEvent::Admitted {
                    patient,
                    doctor,
                    location,
                }),
                AdmissionOutcome::RejectedNoSpecialist { patient } => {
                    batch.events.push(FacilityEvent::RejectedNoSpecialist { patient });
                }
                AdmissionOutcome::RejectedNoBed { patient, doctor } => {
                    batch.events.push(FacilityEvent::RejectedNoBed { patient, doctor });
                }
                AdmissionOutcome::Requeued { .. } => {}
            }
        }
        batch.jobs.extend(pass.jobs);
        for hazard in pass.hazards {
            error!(error = %hazard, "admission hazard");
        }

        for job in &batch.jobs {
            if !self.in_flight.insert(job.doctor().id) {
                error!(doctor = %job.doctor().name, "doctor dispatched twice");
            }
            batch.events.push(match job {
                ServiceJob::Examination {
                    doctor,
                    patient,
                    treatment_days,
                    ..
                } => FacilityEvent::ExaminationStarted {
                    doctor: doctor.clone(),
                    patient: patient.clone(),
                    treatment_days: *treatment_days,
                },
                ServiceJob::Visitation { doctor, rounds } => FacilityEvent::VisitationStarted {
                    doctor: doctor.clone(),
                    patients: rounds.iter().map(|t| t.patient.id).collect(),
                },
            });
        }

        if let Err(e) = facility
            .verify_invariants()
            .and_then(|()| facility.verify_task_ownership(&self.in_flight))
        {
            error!(error = %e, "facility invariant violated");
        }
        batch.day = facility.day();
        batch
    }

    fn finish(&self, facility: &mut Facility, job: ServiceJob, status: TaskStatus, batch: &mut Batch) {
        match (job, status) {
            (ServiceJob::Examination { doctor, patient, .. }, TaskStatus::Completed) => {
                match facility.finish_examination(doctor.id) {
                    Ok(visitation) => batch.jobs.extend(visitation),
                    Err(e) => error!(doctor = %doctor.name, error = %e, "examination finish failed"),
                }
                batch
                    .events
                    .push(FacilityEvent::ExaminationFinished { doctor, patient });
            }
            (
                ServiceJob::Examination {
                    doctor,
                    patient,
                    admitted,
                    ..
                },
                TaskStatus::Aborted(reason),
            ) => {
                warn!(doctor = %doctor.name, patient = %patient.id, %reason, "examination aborted");
                match facility.abort_examination(doctor.id, patient.id, admitted) {
                    Ok(abort) => {
                        batch.jobs.extend(abort.visitation);
                        batch.events.push(FacilityEvent::TaskAborted {
                            doctor,
                            patient: abort.released,
                            reason,
                        });
                    }
                    Err(e) => error!(doctor = %doctor.name, error = %e, "examination abort failed"),
                }
            }
            (ServiceJob::Visitation { doctor, rounds }, status) => {
                if let Err(e) = facility.finish_visitation(doctor.id) {
                    error!(doctor = %doctor.name, error = %e, "visitation finish failed");
                }
                batch.events.push(match status {
                    TaskStatus::Completed => FacilityEvent::VisitationFinished {
                        doctor,
                        patients: rounds.into_iter().map(|t| t.patient.id).collect(),
                    },
                    TaskStatus::Aborted(reason) => {
                        warn!(doctor = %doctor.name, %reason, "visitation aborted");
                        FacilityEvent::TaskAborted {
                            doctor,
                            patient: None,
                            reason,
                        }
                    }
                });
            }
        }
    }

    fn publish(&self, day: u32, events: Vec<FacilityEvent>) {
        for event in events {
            let record = build_event_record(day, event);
            debug!(event = record.event.name(), day, "event");
            if let Some(sink) = &self.sink {
                sink.lock().record(record.clone());
            }
            // no subscribers is not an error
            self.events.send(record).ok();
        }
    }

    fn dispatch(&self, jobs: Vec<ServiceJob>) {
        for job in jobs {
            if let Err(rejected) = self.pool.submit(job) {
                let reason = rejected.to_string();
                let job = rejected.into_job();
                warn!(kind = job.kind(), doctor = %job.doctor().name, %reason, "job not accepted");
                // comes back through the loop as an abort so the doctor is released
                self.commands
                    .send(Command::ServiceFinished {
                        job,
                        status: TaskStatus::Aborted(reason),
                    })
                    .ok();
            }
        }
    }
}
