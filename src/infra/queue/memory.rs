//! In-memory FIFO waiting queue.

use std::collections::VecDeque;

use crate::core::WaitingQueue;
use crate::util::serde::PatientId;

/// Arrival-ordered queue of patient ids, unbounded.
#[derive(Debug, Default)]
pub struct InMemoryWaitingQueue {
    waiting: VecDeque<PatientId>,
}

impl InMemoryWaitingQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl WaitingQueue for InMemoryWaitingQueue {
    fn enqueue(&mut self, patient: PatientId) {
        self.waiting.push_back(patient);
    }

    fn drain(&mut self) -> Vec<PatientId> {
        self.waiting.drain(..).collect()
    }

    fn len(&self) -> usize {
        self.waiting.len()
    }

    fn snapshot(&self) -> Vec<PatientId> {
        self.waiting.iter().copied().collect()
    }
}
